//! Plain-value snapshot records for save/load.
//!
//! The core exposes pure record types and conversion functions; the
//! storage format around them (NBT, database rows, files) belongs to
//! the persistence collaborator. Loading never hard-fails: every
//! field violating an invariant is clamped into validity, mirroring
//! the energy store's own never-fail stance, so one corrupt field
//! cannot lose a whole turret.

use serde::{Deserialize, Serialize};

use crate::controller::FireController;
use crate::data::MAX_TIER;
use crate::energy::EnergyStore;
use crate::math::{Fixed, Vec3Fixed};
use crate::targeting::{EntityId, OwnerId, TargetCategory, TargetingPolicy};
use crate::unit::{AmmoSlot, TurretUnit};
use crate::upgrades::{BaseParams, UpgradeStack};

/// Snapshot of an [`EnergyStore`].
///
/// Wide signed fields so that malformed external data (negative
/// counts, oversized values) survives decoding and is clamped here
/// instead of failing there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyRecord {
    /// Stored energy.
    pub stored: i64,
    /// Capacity.
    pub capacity: i64,
    /// Per-transfer receive cap.
    pub max_receive: i64,
    /// Per-transfer extract cap.
    pub max_extract: i64,
}

/// Snapshot of a [`TargetingPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Whether players are targeted.
    pub target_players: bool,
    /// Whether hostile mobs are targeted.
    pub target_mobs: bool,
    /// Whether passive creatures are targeted.
    pub target_passive: bool,
    /// Live working radius.
    pub range: i64,
    /// Radius upper bound.
    pub max_range: i64,
}

/// Snapshot of a [`FireController`]'s parameters and runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerRecord {
    /// Auto-fire gate.
    pub auto_fire: bool,
    /// Energy per shot.
    pub power_per_shot: i64,
    /// Ammo per shot.
    pub ammo_per_shot: i64,
    /// Hit probability fraction (raw fixed-point bits).
    #[serde(with = "crate::math::fixed_serde")]
    pub accuracy: Fixed,
    /// Turret tier.
    pub tier: i64,
    /// Working cooldown length.
    pub cooldown_ticks: i64,
    /// Cooldown ticks remaining.
    pub cooldown_remaining: i64,
    /// Tracked target, if any.
    pub current_target: Option<EntityId>,
    /// Category priority ordering.
    pub priorities: Vec<TargetCategory>,
}

/// Snapshot of a [`BaseParams`] set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseParamsRecord {
    /// Energy per shot before upgrades.
    pub power_per_shot: i64,
    /// Ammo per shot before upgrades.
    pub ammo_per_shot: i64,
    /// Accuracy before upgrades (raw fixed-point bits).
    #[serde(with = "crate::math::fixed_serde")]
    pub accuracy: Fixed,
    /// Cooldown before upgrades.
    pub cooldown_ticks: i64,
    /// Range bound before upgrades.
    pub max_range: i64,
}

/// Snapshot of a whole [`TurretUnit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Owner identity.
    pub owner: Option<OwnerId>,
    /// Concealment flag.
    pub concealed: bool,
    /// Position in world space.
    pub position: Vec3Fixed,
    /// Energy store snapshot.
    pub energy: EnergyRecord,
    /// Targeting policy snapshot.
    pub policy: PolicyRecord,
    /// Controller snapshot.
    pub controller: ControllerRecord,
    /// Pre-upgrade parameters.
    pub base: BaseParamsRecord,
    /// Upgrade slots (length fixes the restored unit's slot count).
    pub upgrade_slots: Vec<Option<UpgradeStack>>,
    /// Rounds in the ammo slot.
    pub ammo: i64,
}

/// Clamp a wide signed value into `u32` range.
fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Snapshot a unit into a plain record.
#[must_use]
pub fn save_unit(unit: &TurretUnit) -> UnitRecord {
    let energy = unit.energy();
    let controller = unit.controller();
    let policy = controller.policy();
    let base = unit.base_params();

    UnitRecord {
        owner: unit.owner(),
        concealed: unit.concealed(),
        position: unit.position(),
        energy: EnergyRecord {
            stored: i64::from(energy.stored()),
            capacity: i64::from(energy.capacity()),
            max_receive: i64::from(energy.max_receive()),
            max_extract: i64::from(energy.max_extract()),
        },
        policy: PolicyRecord {
            target_players: policy.target_players(),
            target_mobs: policy.target_mobs(),
            target_passive: policy.target_passive(),
            range: i64::from(policy.range()),
            max_range: i64::from(policy.max_range()),
        },
        controller: ControllerRecord {
            auto_fire: controller.auto_fire(),
            power_per_shot: i64::from(controller.power_per_shot()),
            ammo_per_shot: i64::from(controller.ammo_per_shot()),
            accuracy: controller.accuracy(),
            tier: i64::from(controller.tier()),
            cooldown_ticks: i64::from(controller.cooldown_ticks()),
            cooldown_remaining: i64::from(controller.cooldown_remaining()),
            current_target: controller.current_target(),
            priorities: controller.priorities().to_vec(),
        },
        base: BaseParamsRecord {
            power_per_shot: i64::from(base.power_per_shot),
            ammo_per_shot: i64::from(base.ammo_per_shot),
            accuracy: base.accuracy,
            cooldown_ticks: i64::from(base.cooldown_ticks),
            max_range: i64::from(base.max_range),
        },
        upgrade_slots: unit.upgrade_slots().to_vec(),
        ammo: i64::from(unit.ammo().rounds()),
    }
}

/// Restore a unit from a record, clamping every invalid field.
///
/// Never fails: a negative capacity becomes zero, stored energy is
/// truncated to capacity, a range above its bound is pulled down, a
/// bad tier snaps into `1..=MAX_TIER`, accuracy is clamped into
/// `[0, 1]`. The restored unit has no id until re-registered.
#[must_use]
pub fn load_unit(record: &UnitRecord) -> TurretUnit {
    let mut energy = EnergyStore::with_limits(
        clamp_u32(record.energy.capacity),
        clamp_u32(record.energy.max_receive),
        clamp_u32(record.energy.max_extract),
    );
    energy.set_stored(clamp_u32(record.energy.stored));

    let max_range = clamp_u32(record.policy.max_range);
    let policy = TargetingPolicy::from_clamped_parts(
        record.policy.target_players,
        record.policy.target_mobs,
        record.policy.target_passive,
        clamp_u32(record.policy.range),
        max_range,
    );

    let tier = clamp_u32(record.controller.tier).clamp(1, u32::from(MAX_TIER)) as u8;
    let accuracy = record.controller.accuracy.clamp(Fixed::ZERO, Fixed::ONE);
    let cooldown_ticks = clamp_u32(record.controller.cooldown_ticks).max(1);

    let mut controller = FireController::from_clamped_parts(
        tier,
        clamp_u32(record.controller.power_per_shot),
        clamp_u32(record.controller.ammo_per_shot),
        accuracy,
        cooldown_ticks,
    )
    .with_auto_fire(record.controller.auto_fire)
    .with_policy(policy)
    .with_priorities(record.controller.priorities.clone());
    controller.restore_runtime(
        clamp_u32(record.controller.cooldown_remaining),
        record.controller.current_target,
    );

    let base = BaseParams {
        power_per_shot: clamp_u32(record.base.power_per_shot),
        ammo_per_shot: clamp_u32(record.base.ammo_per_shot),
        accuracy: record.base.accuracy.clamp(Fixed::ZERO, Fixed::ONE),
        cooldown_ticks: clamp_u32(record.base.cooldown_ticks).max(1),
        max_range: clamp_u32(record.base.max_range),
    };

    let mut ammo = AmmoSlot::new();
    ammo.set_rounds(clamp_u32(record.ammo));

    TurretUnit::from_restored_parts(
        record.position,
        record.owner,
        record.concealed,
        base,
        energy,
        controller,
        record.upgrade_slots.clone(),
        ammo,
    )
}
