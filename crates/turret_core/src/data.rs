//! Data-driven tier definitions.
//!
//! Per-tier base parameters are loaded from RON files so balance
//! changes don't require recompilation. A built-in table provides the
//! defaults when no data file is supplied.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TurretError};
use crate::math::{fixed_serde, Fixed};

/// Highest supported turret tier.
pub const MAX_TIER: u8 = 5;

/// Base parameters for one turret tier.
///
/// # Example RON
///
/// ```ron
/// TierData(
///     tier: 1,
///     energy_capacity: 500,
///     power_per_shot: 50,
///     ammo_per_shot: 1,
///     accuracy: 3006477107,  // Fixed-point for 0.7
///     cooldown_ticks: 40,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierData {
    /// Tier rank, 1-based.
    pub tier: u8,

    /// Energy capacity of a unit built at this tier.
    pub energy_capacity: u32,

    /// Energy consumed per shot.
    pub power_per_shot: u32,

    /// Ammo rounds consumed per shot.
    pub ammo_per_shot: u32,

    /// Hit probability fraction in `[0, 1]` (fixed-point).
    #[serde(with = "fixed_serde")]
    pub accuracy: Fixed,

    /// Mandatory delay between shots, in ticks.
    pub cooldown_ticks: u32,
}

/// Ordered collection of tier definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    /// Tier definitions, ascending by tier.
    pub tiers: Vec<TierData>,
}

impl TierTable {
    /// Parse a tier table from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::DataParseError`] when the text is not a
    /// valid table or fails validation.
    pub fn load_from_str(source: &str, path: &str) -> Result<Self> {
        let table: Self = ron::from_str(source).map_err(|e| TurretError::DataParseError {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        table.validate(path)?;
        Ok(table)
    }

    /// Validate tier ordering and per-tier invariants.
    ///
    /// Tiers must be 1-based, strictly ascending, and within
    /// [`MAX_TIER`]. Cooldown must be monotonic non-increasing in tier
    /// (higher tier never fires slower) and accuracy must be a valid
    /// probability.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::DataParseError`] naming the first
    /// violated rule.
    pub fn validate(&self, path: &str) -> Result<()> {
        let fail = |message: String| {
            Err(TurretError::DataParseError {
                path: path.to_string(),
                message,
            })
        };

        if self.tiers.is_empty() {
            return fail("tier table is empty".to_string());
        }

        let mut previous: Option<&TierData> = None;
        for data in &self.tiers {
            if data.tier == 0 || data.tier > MAX_TIER {
                return fail(format!("tier {} outside 1..={MAX_TIER}", data.tier));
            }
            if let Some(prev) = previous {
                if data.tier <= prev.tier {
                    return fail(format!(
                        "tiers must be strictly ascending: {} after {}",
                        data.tier, prev.tier
                    ));
                }
                if data.cooldown_ticks > prev.cooldown_ticks {
                    return fail(format!(
                        "cooldown must not increase with tier: tier {} has {} ticks after {}",
                        data.tier, data.cooldown_ticks, prev.cooldown_ticks
                    ));
                }
            }
            if data.cooldown_ticks == 0 {
                return fail(format!("tier {} has zero cooldown", data.tier));
            }
            if data.accuracy < Fixed::ZERO || data.accuracy > Fixed::ONE {
                return fail(format!("tier {} accuracy outside [0, 1]", data.tier));
            }
            previous = Some(data);
        }

        Ok(())
    }

    /// Look up a tier definition.
    #[must_use]
    pub fn get(&self, tier: u8) -> Option<&TierData> {
        self.tiers.iter().find(|d| d.tier == tier)
    }
}

/// The built-in tier table used when no data file overrides it.
///
/// Higher tiers store more energy, draw more power per shot, shoot
/// more accurately, and cool down faster.
#[must_use]
pub fn builtin_tiers() -> TierTable {
    let accuracy = |percent: i32| Fixed::from_num(percent) / Fixed::from_num(100);

    TierTable {
        tiers: vec![
            TierData {
                tier: 1,
                energy_capacity: 500,
                power_per_shot: 50,
                ammo_per_shot: 1,
                accuracy: accuracy(70),
                cooldown_ticks: 40,
            },
            TierData {
                tier: 2,
                energy_capacity: 1_000,
                power_per_shot: 100,
                ammo_per_shot: 1,
                accuracy: accuracy(75),
                cooldown_ticks: 32,
            },
            TierData {
                tier: 3,
                energy_capacity: 2_500,
                power_per_shot: 200,
                ammo_per_shot: 1,
                accuracy: accuracy(80),
                cooldown_ticks: 24,
            },
            TierData {
                tier: 4,
                energy_capacity: 5_000,
                power_per_shot: 400,
                ammo_per_shot: 1,
                accuracy: accuracy(85),
                cooldown_ticks: 16,
            },
            TierData {
                tier: 5,
                energy_capacity: 10_000,
                power_per_shot: 800,
                ammo_per_shot: 1,
                accuracy: accuracy(90),
                cooldown_ticks: 8,
            },
        ],
    }
}
