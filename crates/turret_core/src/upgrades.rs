//! Upgrade slots and derived-parameter recomputation.
//!
//! Each upgrade kind is a pure function over the derived parameter
//! set. Derived parameters are always recomputed from the base set
//! whenever a slot changes, never mutated incrementally, so repeated
//! install/remove cycles cannot drift.

use serde::{Deserialize, Serialize};

use crate::data::TierData;
use crate::math::Fixed;

/// Absolute cap on the policy max-range, regardless of upgrades.
pub const RANGE_HARD_CAP: u32 = 64;

/// Default max-range for a freshly built unit.
pub const BASE_MAX_RANGE: u32 = 32;

/// Kinds of upgrade items that can occupy a turret's upgrade slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Improves hit probability.
    Accuracy,
    /// Reduces energy drawn per shot.
    Efficiency,
    /// Shortens the firing cooldown.
    FireRate,
    /// Raises the targeting range upper bound.
    Range,
}

/// A stack of identical upgrade items in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeStack {
    /// Which upgrade occupies the slot.
    pub kind: UpgradeKind,
    /// How many items are stacked.
    pub count: u32,
}

impl UpgradeStack {
    /// Create a stack of `count` upgrades.
    #[must_use]
    pub const fn new(kind: UpgradeKind, count: u32) -> Self {
        Self { kind, count }
    }
}

/// Pre-upgrade parameter set of a turret unit.
///
/// Fixed at construction (normally from the tier table); the source
/// of truth every derived recomputation starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseParams {
    /// Energy consumed per shot.
    pub power_per_shot: u32,
    /// Ammo rounds consumed per shot.
    pub ammo_per_shot: u32,
    /// Hit probability fraction in `[0, 1]`.
    #[serde(with = "crate::math::fixed_serde")]
    pub accuracy: Fixed,
    /// Ticks between shots.
    pub cooldown_ticks: u32,
    /// Targeting range upper bound.
    pub max_range: u32,
}

impl BaseParams {
    /// Base parameters for a tier definition.
    #[must_use]
    pub fn from_tier(data: &TierData) -> Self {
        Self {
            power_per_shot: data.power_per_shot,
            ammo_per_shot: data.ammo_per_shot,
            accuracy: data.accuracy,
            cooldown_ticks: data.cooldown_ticks,
            max_range: BASE_MAX_RANGE,
        }
    }
}

/// Parameter set after applying all installed upgrades.
pub type DerivedParams = BaseParams;

impl UpgradeKind {
    /// Apply a stack of `count` upgrades of this kind to `params`.
    ///
    /// Pure: the input is consumed and the adjusted set returned.
    #[must_use]
    pub fn apply(self, count: u32, mut params: DerivedParams) -> DerivedParams {
        match self {
            UpgradeKind::Accuracy => {
                // Each point closes 1/8 of the remaining gap to a
                // perfect hit chance, so accuracy approaches but never
                // reaches 1.
                for _ in 0..count {
                    let gap = Fixed::ONE - params.accuracy;
                    params.accuracy += gap / Fixed::from_num(8);
                }
            }
            UpgradeKind::Efficiency => {
                // -5% power per point, floor at 25% of the input
                let percent = 100u32.saturating_sub(5 * count).max(25);
                params.power_per_shot = params.power_per_shot * percent / 100;
            }
            UpgradeKind::FireRate => {
                // -10% cooldown per point, floor at 20%, never below
                // one tick
                let percent = 100u32.saturating_sub(10 * count).max(20);
                params.cooldown_ticks = (params.cooldown_ticks * percent / 100).max(1);
            }
            UpgradeKind::Range => {
                params.max_range = (params.max_range + 4 * count).min(RANGE_HARD_CAP);
            }
        }
        params
    }
}

/// Recompute the derived parameter set from base plus installed slots.
///
/// Folds every occupied slot over the base parameters in slot order.
/// All four upgrade kinds commute with each other (each touches a
/// different field), so slot order does not change the result.
#[must_use]
pub fn recompute_derived(base: &BaseParams, slots: &[Option<UpgradeStack>]) -> DerivedParams {
    slots
        .iter()
        .flatten()
        .fold(*base, |params, stack| stack.kind.apply(stack.count, params))
}
