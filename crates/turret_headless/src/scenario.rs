//! RON scenario definitions.
//!
//! Scenarios are human-edited data files: positions are plain block
//! coordinates, not raw fixed-point bits.

use std::path::Path;

use serde::{Deserialize, Serialize};

use turret_core::error::{Result, TurretError};
use turret_core::math::Vec3Fixed;
use turret_core::targeting::{Candidate, EntityId, OwnerId, TargetCategory, TargetingPolicy};
use turret_core::unit::TurretUnitParams;

/// One turret emplacement in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurretSetup {
    /// Block position `(x, y, z)`.
    pub position: (i32, i32, i32),
    /// Turret tier.
    pub tier: u8,
    /// Owner identity.
    #[serde(default)]
    pub owner: Option<OwnerId>,
    /// Rounds pre-loaded into the ammo slot.
    #[serde(default)]
    pub ammo: u32,
    /// Energy pre-loaded into the store.
    #[serde(default)]
    pub energy: u32,
    /// Energy delivered by the host each tick.
    #[serde(default)]
    pub income_per_tick: u32,
    /// Enable targeting players.
    #[serde(default)]
    pub target_players: bool,
    /// Disable the auto-fire gate.
    #[serde(default)]
    pub manual_fire: bool,
}

impl TurretSetup {
    /// Convert into unit construction parameters.
    #[must_use]
    pub fn to_params(&self) -> TurretUnitParams {
        let (x, y, z) = self.position;
        let mut params = TurretUnitParams::at(Vec3Fixed::from_blocks(x, y, z), self.tier);
        params.owner = self.owner;
        params.initial_ammo = self.ammo;
        params.initial_energy = self.energy;
        params.manual_fire = self.manual_fire;
        if self.target_players {
            let mut policy = TargetingPolicy::new();
            policy.set_target_players(true);
            params.policy = Some(policy);
        }
        params
    }
}

/// One static raider in the candidate field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaiderSetup {
    /// World entity id.
    pub id: EntityId,
    /// Block position `(x, y, z)`.
    pub position: (i32, i32, i32),
    /// Target category.
    pub category: TargetCategory,
    /// Owner identity, if any.
    #[serde(default)]
    pub owner: Option<OwnerId>,
    /// Current health.
    #[serde(default = "default_health")]
    pub health: u32,
}

const fn default_health() -> u32 {
    20
}

impl RaiderSetup {
    /// Convert into a candidate.
    #[must_use]
    pub fn to_candidate(&self) -> Candidate {
        let (x, y, z) = self.position;
        let candidate = Candidate::new(
            self.id,
            Vec3Fixed::from_blocks(x, y, z),
            self.category,
        )
        .with_health(self.health);
        match self.owner {
            Some(owner) => candidate.with_owner(owner),
            None => candidate,
        }
    }
}

/// A complete headless scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name, echoed in metrics.
    pub name: String,
    /// Number of ticks to run.
    pub ticks: u64,
    /// Turret emplacements.
    pub turrets: Vec<TurretSetup>,
    /// Static raider field.
    pub raiders: Vec<RaiderSetup>,
}

impl Scenario {
    /// Parse a scenario from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::DataParseError`] on malformed input.
    pub fn load_from_str(source: &str, path: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| TurretError::DataParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Read and parse a scenario file.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::DataParseError`] on IO or parse failure.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| TurretError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::load_from_str(&source, &path.display().to_string())
    }

    /// The built-in smoke scenario used when no file is supplied:
    /// a small defense line holding off a mixed raid.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "skirmish".to_string(),
            ticks: 400,
            turrets: vec![
                TurretSetup {
                    position: (0, 64, 0),
                    tier: 1,
                    owner: Some(1),
                    ammo: 64,
                    energy: 500,
                    income_per_tick: 10,
                    target_players: false,
                    manual_fire: false,
                },
                TurretSetup {
                    position: (24, 64, 0),
                    tier: 3,
                    owner: Some(1),
                    ammo: 64,
                    energy: 2_500,
                    income_per_tick: 25,
                    target_players: false,
                    manual_fire: false,
                },
            ],
            raiders: vec![
                RaiderSetup {
                    id: 100,
                    position: (6, 64, 2),
                    category: TargetCategory::Hostile,
                    owner: None,
                    health: 20,
                },
                RaiderSetup {
                    id: 101,
                    position: (14, 64, -5),
                    category: TargetCategory::Hostile,
                    owner: None,
                    health: 30,
                },
                RaiderSetup {
                    id: 102,
                    position: (20, 64, 3),
                    category: TargetCategory::Passive,
                    owner: None,
                    health: 10,
                },
            ],
        }
    }
}
