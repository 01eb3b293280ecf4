//! The turret unit aggregate.
//!
//! A unit bundles identity, energy, the fire controller, upgrade
//! slots, and the ammo slot. It is the thing collaborators persist
//! and network; one `tick` call per simulation tick threads the
//! candidate list into the controller and returns what happened as a
//! plain value, not a callback.

use serde::{Deserialize, Serialize};

use crate::controller::{FireControlState, FireController, ShotDecision, TargetChange};
use crate::data::builtin_tiers;
use crate::energy::EnergyStore;
use crate::error::{Result, TurretError};
use crate::math::{Fixed, Vec3Fixed};
use crate::targeting::{Candidate, EntityId, OwnerId, TargetCategory, TargetingPolicy};
use crate::upgrades::{recompute_derived, BaseParams, UpgradeStack};

/// Unique identifier for turret units, assigned by the registry.
pub type UnitId = u64;

/// Default number of upgrade slots on a unit.
pub const DEFAULT_UPGRADE_SLOTS: usize = 4;

/// The ammo slot of a turret unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmmoSlot {
    rounds: u32,
}

impl AmmoSlot {
    /// Create an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { rounds: 0 }
    }

    /// Rounds currently loaded.
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Whether the slot is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rounds == 0
    }

    /// Load rounds into the slot.
    pub fn insert(&mut self, rounds: u32) {
        self.rounds = self.rounds.saturating_add(rounds);
    }

    /// Remove up to `rounds` rounds, returning the amount removed.
    pub fn take(&mut self, rounds: u32) -> u32 {
        let taken = self.rounds.min(rounds);
        self.rounds -= taken;
        taken
    }

    /// Overwrite the round count (load path).
    pub fn set_rounds(&mut self, rounds: u32) {
        self.rounds = rounds;
    }
}

/// A shot emitted to the world-effect collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireEvent {
    /// The unit that fired.
    pub shooter: UnitId,
    /// The entity fired at.
    pub target: EntityId,
    /// Hit probability fraction in `[0, 1]`.
    #[serde(with = "crate::math::fixed_serde")]
    pub accuracy: Fixed,
    /// Tier of the firing turret.
    pub tier: u8,
    /// Energy consumed by the shot.
    pub power_used: u32,
    /// Ammo rounds consumed by the shot.
    pub ammo_used: u32,
}

/// Result of one unit tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitTick {
    /// Controller state after the tick.
    pub state: FireControlState,
    /// The shot fired this tick, if any.
    pub fired: Option<FireEvent>,
    /// Target change observed this tick, if any.
    pub target_change: Option<TargetChange>,
}

/// Parameters for building a new turret unit.
///
/// All fields beyond position and tier are optional overrides of the
/// tier-table defaults.
#[derive(Debug, Clone, Default)]
pub struct TurretUnitParams {
    /// Position in world space.
    pub position: Vec3Fixed,
    /// Turret tier (1-based). Zero is rejected.
    pub tier: u8,
    /// Owner identity, for friendly-fire exclusion.
    pub owner: Option<OwnerId>,
    /// Whether the unit starts concealed.
    pub concealed: bool,
    /// Targeting policy override.
    pub policy: Option<TargetingPolicy>,
    /// Category priority override.
    pub priorities: Option<Vec<TargetCategory>>,
    /// Disable the auto-fire gate.
    pub manual_fire: bool,
    /// Number of upgrade slots; `None` uses [`DEFAULT_UPGRADE_SLOTS`].
    pub upgrade_slots: Option<usize>,
    /// Rounds pre-loaded into the ammo slot.
    pub initial_ammo: u32,
    /// Energy pre-loaded into the store.
    pub initial_energy: u32,
}

impl TurretUnitParams {
    /// Parameters for a tier-`tier` unit at `position`.
    #[must_use]
    pub fn at(position: Vec3Fixed, tier: u8) -> Self {
        Self {
            position,
            tier,
            ..Self::default()
        }
    }
}

/// An autonomous defensive turret.
///
/// The upgrade slot count is fixed at construction and never resized;
/// derived firing parameters are recomputed from [`BaseParams`] on
/// every slot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurretUnit {
    id: UnitId,
    position: Vec3Fixed,
    owner: Option<OwnerId>,
    concealed: bool,
    base: BaseParams,
    energy: EnergyStore,
    controller: FireController,
    upgrade_slots: Vec<Option<UpgradeStack>>,
    ammo: AmmoSlot,
}

impl TurretUnit {
    /// Build a unit from construction parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::InvalidTier`] when the tier is zero or
    /// not in the tier table.
    pub fn new(params: TurretUnitParams) -> Result<Self> {
        let tiers = builtin_tiers();
        let data = tiers
            .get(params.tier)
            .ok_or(TurretError::InvalidTier(u32::from(params.tier)))?;

        let mut base = BaseParams::from_tier(data);
        if let Some(policy) = &params.policy {
            // An explicit policy carries its own range bound
            base.max_range = policy.max_range();
        }

        let mut controller = FireController::new(
            params.tier,
            base.power_per_shot,
            base.ammo_per_shot,
            base.accuracy,
            base.cooldown_ticks,
        )?
        .with_auto_fire(!params.manual_fire);
        if let Some(policy) = params.policy {
            controller = controller.with_policy(policy);
        }
        if let Some(priorities) = params.priorities {
            controller = controller.with_priorities(priorities);
        }

        let mut energy = EnergyStore::new(data.energy_capacity);
        energy.set_stored(params.initial_energy);

        let mut ammo = AmmoSlot::new();
        ammo.insert(params.initial_ammo);

        Ok(Self {
            id: 0,
            position: params.position,
            owner: params.owner,
            concealed: params.concealed,
            base,
            energy,
            controller,
            upgrade_slots: vec![None; params.upgrade_slots.unwrap_or(DEFAULT_UPGRADE_SLOTS)],
            ammo,
        })
    }

    /// Registry-assigned unit id (zero before registration).
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Position in world space.
    #[must_use]
    pub const fn position(&self) -> Vec3Fixed {
        self.position
    }

    /// Owner identity.
    #[must_use]
    pub const fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    /// Transfer ownership.
    pub fn set_owner(&mut self, owner: Option<OwnerId>) {
        self.owner = owner;
    }

    /// Whether the unit is concealed.
    #[must_use]
    pub const fn concealed(&self) -> bool {
        self.concealed
    }

    /// Set the concealment flag.
    pub fn set_concealed(&mut self, concealed: bool) {
        self.concealed = concealed;
    }

    /// The unit's energy store.
    #[must_use]
    pub const fn energy(&self) -> &EnergyStore {
        &self.energy
    }

    /// Mutable access to the energy store (host power delivery).
    pub fn energy_mut(&mut self) -> &mut EnergyStore {
        &mut self.energy
    }

    /// The unit's fire controller.
    #[must_use]
    pub const fn controller(&self) -> &FireController {
        &self.controller
    }

    /// Mutable access to the fire controller.
    pub fn controller_mut(&mut self) -> &mut FireController {
        &mut self.controller
    }

    /// The targeting policy (owned by the controller).
    #[must_use]
    pub const fn policy(&self) -> &TargetingPolicy {
        self.controller.policy()
    }

    /// Mutable access to the targeting policy.
    pub fn policy_mut(&mut self) -> &mut TargetingPolicy {
        self.controller.policy_mut()
    }

    /// The unit's ammo slot.
    #[must_use]
    pub const fn ammo(&self) -> &AmmoSlot {
        &self.ammo
    }

    /// Mutable access to the ammo slot (host reloading).
    pub fn ammo_mut(&mut self) -> &mut AmmoSlot {
        &mut self.ammo
    }

    /// Pre-upgrade parameter set.
    #[must_use]
    pub const fn base_params(&self) -> &BaseParams {
        &self.base
    }

    /// Installed upgrade slots.
    #[must_use]
    pub fn upgrade_slots(&self) -> &[Option<UpgradeStack>] {
        &self.upgrade_slots
    }

    /// The upgrade in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::InvalidSlot`] for an out-of-bounds slot.
    pub fn upgrade(&self, slot: usize) -> Result<Option<UpgradeStack>> {
        self.upgrade_slots
            .get(slot)
            .copied()
            .ok_or(TurretError::InvalidSlot {
                slot,
                slots: self.upgrade_slots.len(),
            })
    }

    /// Install or clear an upgrade slot and recompute all derived
    /// parameters from base.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::InvalidSlot`] for an out-of-bounds slot;
    /// the slot count is fixed at construction.
    pub fn set_upgrade(&mut self, slot: usize, stack: Option<UpgradeStack>) -> Result<()> {
        let slots = self.upgrade_slots.len();
        let entry = self
            .upgrade_slots
            .get_mut(slot)
            .ok_or(TurretError::InvalidSlot { slot, slots })?;
        *entry = stack;

        let derived = recompute_derived(&self.base, &self.upgrade_slots);
        self.controller.apply_derived(&derived);
        Ok(())
    }

    /// Advance the unit by one tick.
    ///
    /// Threads the candidate list into the controller; when a shot
    /// happens the unit deducts the ammo itself and stamps the event
    /// with its id.
    pub fn tick(&mut self, candidates: &[Candidate]) -> UnitTick {
        let ammo_available = self.ammo.rounds();
        let result = self.controller.advance(
            self.position,
            candidates,
            self.owner,
            &mut self.energy,
            ammo_available,
        );

        UnitTick {
            state: result.state,
            fired: result.shot.map(|shot| self.consume_shot(shot)),
            target_change: result.target_change,
        }
    }

    /// Fire at the current target regardless of the auto-fire gate.
    ///
    /// No-op (returns `None`) without a tracked target, during
    /// cooldown, or when energy/ammo are insufficient.
    pub fn force_fire(&mut self) -> Option<FireEvent> {
        let ammo_available = self.ammo.rounds();
        let shot = self.controller.force_fire(&mut self.energy, ammo_available)?;
        Some(self.consume_shot(shot))
    }

    /// Deduct ammo for a shot and stamp it with the unit id.
    fn consume_shot(&mut self, shot: ShotDecision) -> FireEvent {
        self.ammo.take(shot.ammo_used);
        FireEvent {
            shooter: self.id,
            target: shot.target,
            accuracy: shot.accuracy,
            tier: shot.tier,
            power_used: shot.power_used,
            ammo_used: shot.ammo_used,
        }
    }

    /// Radius the candidate provider must cover for this unit.
    #[must_use]
    pub fn search_radius(&self) -> u32 {
        self.controller.policy().range()
    }

    pub(crate) fn set_id(&mut self, id: UnitId) {
        self.id = id;
    }

    pub(crate) fn from_restored_parts(
        position: Vec3Fixed,
        owner: Option<OwnerId>,
        concealed: bool,
        base: BaseParams,
        energy: EnergyStore,
        controller: FireController,
        upgrade_slots: Vec<Option<UpgradeStack>>,
        ammo: AmmoSlot,
    ) -> Self {
        Self {
            id: 0,
            position,
            owner,
            concealed,
            base,
            energy,
            controller,
            upgrade_slots,
            ammo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targeting::TargetCategory::Hostile;
    use crate::upgrades::UpgradeKind;

    fn unit() -> TurretUnit {
        let mut params = TurretUnitParams::at(Vec3Fixed::ZERO, 1);
        params.initial_energy = 500;
        params.initial_ammo = 8;
        TurretUnit::new(params).unwrap()
    }

    fn hostile(id: EntityId, x: i32) -> Candidate {
        Candidate::new(id, Vec3Fixed::from_blocks(x, 0, 0), Hostile)
    }

    #[test]
    fn test_new_uses_tier_table() {
        let u = unit();
        assert_eq!(u.energy().capacity(), 500);
        assert_eq!(u.controller().power_per_shot(), 50);
        assert_eq!(u.controller().cooldown_ticks(), 40);
        assert_eq!(u.upgrade_slots().len(), DEFAULT_UPGRADE_SLOTS);
    }

    #[test]
    fn test_new_rejects_unknown_tier() {
        let zero = TurretUnit::new(TurretUnitParams::at(Vec3Fixed::ZERO, 0));
        assert!(matches!(zero, Err(TurretError::InvalidTier(0))));

        let high = TurretUnit::new(TurretUnitParams::at(Vec3Fixed::ZERO, 99));
        assert!(matches!(high, Err(TurretError::InvalidTier(99))));
    }

    #[test]
    fn test_tick_deducts_ammo() {
        let mut u = unit();
        let tick = u.tick(&[hostile(3, 5)]);

        let fired = tick.fired.expect("should fire");
        assert_eq!(fired.target, 3);
        assert_eq!(fired.ammo_used, 1);
        assert_eq!(u.ammo().rounds(), 7);
        assert_eq!(u.energy().stored(), 450);
    }

    #[test]
    fn test_tick_without_ammo_produces_no_event() {
        let mut u = unit();
        u.ammo_mut().set_rounds(0);

        let tick = u.tick(&[hostile(3, 5)]);
        assert!(tick.fired.is_none());
        assert_eq!(tick.state, FireControlState::Tracking);
        assert_eq!(u.energy().stored(), 500);
    }

    #[test]
    fn test_set_upgrade_recomputes_derived() {
        let mut u = unit();
        let base_power = u.controller().power_per_shot();

        u.set_upgrade(0, Some(UpgradeStack::new(UpgradeKind::Efficiency, 4)))
            .unwrap();
        assert_eq!(u.controller().power_per_shot(), base_power * 80 / 100);

        u.set_upgrade(1, Some(UpgradeStack::new(UpgradeKind::Range, 3)))
            .unwrap();
        assert_eq!(u.policy().max_range(), 44);

        // Clearing both restores the tier-table values exactly
        u.set_upgrade(0, None).unwrap();
        u.set_upgrade(1, None).unwrap();
        assert_eq!(u.controller().power_per_shot(), base_power);
        assert_eq!(u.policy().max_range(), 32);
    }

    #[test]
    fn test_set_upgrade_out_of_bounds() {
        let mut u = unit();
        let result = u.set_upgrade(99, Some(UpgradeStack::new(UpgradeKind::Accuracy, 1)));
        assert!(matches!(
            result,
            Err(TurretError::InvalidSlot { slot: 99, slots: 4 })
        ));
        assert!(matches!(u.upgrade(99), Err(TurretError::InvalidSlot { .. })));
        assert_eq!(u.upgrade(0).unwrap(), None);
    }

    #[test]
    fn test_range_upgrade_removal_pulls_range_down() {
        let mut u = unit();
        u.set_upgrade(0, Some(UpgradeStack::new(UpgradeKind::Range, 4)))
            .unwrap();
        assert!(u.policy_mut().set_range(48));

        // Removing the upgrade shrinks the bound; the live range
        // follows it down instead of erroring
        u.set_upgrade(0, None).unwrap();
        assert_eq!(u.policy().max_range(), 32);
        assert_eq!(u.policy().range(), 32);
    }

    #[test]
    fn test_force_fire_scenario() {
        let mut params = TurretUnitParams::at(Vec3Fixed::ZERO, 1);
        params.initial_energy = 15;
        params.initial_ammo = 4;
        params.manual_fire = true;
        let mut u = TurretUnit::new(params).unwrap();

        u.tick(&[hostile(3, 5)]);
        // 15 stored < 50 per shot: silent no-op
        assert!(u.force_fire().is_none());
        assert_eq!(u.energy().stored(), 15);
        assert_eq!(u.controller().cooldown_remaining(), 0);

        u.energy_mut().set_stored(500);
        let event = u.force_fire().expect("should fire now");
        assert_eq!(event.target, 3);
        assert_eq!(u.ammo().rounds(), 3);
    }

    #[test]
    fn test_custom_policy_keeps_its_bound() {
        let mut policy = TargetingPolicy::new();
        assert!(policy.set_max_range(20));
        assert!(policy.set_range(20));

        let mut params = TurretUnitParams::at(Vec3Fixed::ZERO, 1);
        params.policy = Some(policy);
        let mut u = TurretUnit::new(params).unwrap();
        assert_eq!(u.policy().max_range(), 20);

        // Slot changes recompute from the explicit bound
        u.set_upgrade(0, Some(UpgradeStack::new(UpgradeKind::Range, 1)))
            .unwrap();
        assert_eq!(u.policy().max_range(), 24);
    }

    #[test]
    fn test_concealed_flag_round_trip() {
        let mut u = unit();
        assert!(!u.concealed());
        u.set_concealed(true);
        assert!(u.concealed());
    }

    #[test]
    fn test_ownership_transfer() {
        let mut u = unit();
        assert_eq!(u.owner(), None);
        u.set_owner(Some(42));
        assert_eq!(u.owner(), Some(42));
        u.set_owner(None);
        assert_eq!(u.owner(), None);
    }
}
