//! # Turret Core
//!
//! Deterministic decision core for autonomous defensive turrets.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! Each turret unit stores and transfers power through a bounded,
//! rate-limited [`energy::EnergyStore`], picks targets with a pure
//! [`selector`] over a declarative [`targeting::TargetingPolicy`],
//! and decides once per tick whether to fire via the
//! [`controller::FireController`] state machine. The core produces
//! *decisions* (fire events) as plain return values; turning them
//! into world effects, querying candidates, and persisting snapshots
//! are the host's jobs.
//!
//! ## Crate Structure
//!
//! - [`energy`] - Bounded, rate-limited energy storage
//! - [`targeting`] - Candidates and the targeting policy
//! - [`selector`] - Pure target selection
//! - [`controller`] - Per-tick firing state machine
//! - [`unit`] - The turret unit aggregate
//! - [`registry`] - Unit arena and tick driver
//! - [`upgrades`] - Upgrade slots and derived-parameter recompute
//! - [`persistence`] - Plain-value save/load records
//! - [`data`] - Data-driven tier tables
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod controller;
pub mod data;
pub mod energy;
pub mod error;
pub mod math;
pub mod persistence;
pub mod registry;
pub mod selector;
pub mod targeting;
pub mod unit;
pub mod upgrades;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::controller::{
        FireControlState, FireController, ShotDecision, TargetChange,
    };
    pub use crate::data::{builtin_tiers, TierData, TierTable, MAX_TIER};
    pub use crate::energy::EnergyStore;
    pub use crate::error::{Result, TurretError};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::persistence::{load_unit, save_unit, UnitRecord};
    pub use crate::registry::{TickEvents, TurretRegistry};
    pub use crate::selector::select_target;
    pub use crate::targeting::{
        Candidate, EntityId, OwnerId, TargetCategory, TargetingPolicy,
    };
    pub use crate::unit::{FireEvent, TurretUnit, TurretUnitParams, UnitId};
    pub use crate::upgrades::{UpgradeKind, UpgradeStack};
}
