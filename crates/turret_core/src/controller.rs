//! Per-tick firing decision state machine.
//!
//! The controller owns the turret's targeting policy and firing
//! parameters, runs the target selector each active tick, and decides
//! whether a shot happens. Insufficient energy or ammo is a routine
//! outcome, not an error: the tick simply produces no shot.

use serde::{Deserialize, Serialize};

use crate::energy::EnergyStore;
use crate::error::{Result, TurretError};
use crate::math::{Fixed, Vec3Fixed};
use crate::selector::select_target;
use crate::targeting::{Candidate, EntityId, OwnerId, TargetCategory, TargetingPolicy};

/// Observable state of a fire controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireControlState {
    /// No target and no cooldown.
    Idle,
    /// Target held, cooldown elapsed, evaluating whether to fire.
    Tracking,
    /// Cooling down after a shot; cannot fire regardless of target.
    Cooldown,
}

/// A resolved decision to fire, for the world-effect collaborator.
///
/// The core does not simulate the projectile; the collaborator
/// resolves hit/miss and damage from these parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotDecision {
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

/// Change of the tracked target between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetChange {
    /// A target was acquired from idle.
    Acquired {
        /// The newly tracked entity.
        target: EntityId,
    },
    /// The tracked target was replaced.
    Switched {
        /// The previously tracked entity.
        from: EntityId,
        /// The newly tracked entity.
        to: EntityId,
    },
    /// The tracked target was lost.
    Lost {
        /// The previously tracked entity.
        from: EntityId,
    },
}

/// Result of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerTick {
    /// State after the tick.
    pub state: FireControlState,
    /// The shot taken this tick, if any.
    pub shot: Option<ShotDecision>,
    /// Target change observed this tick, if any.
    pub target_change: Option<TargetChange>,
}

/// Default category priority ordering: hostiles first, then players,
/// then passive creatures.
#[must_use]
pub fn default_priorities() -> Vec<TargetCategory> {
    vec![
        TargetCategory::Hostile,
        TargetCategory::Player,
        TargetCategory::Passive,
    ]
}

/// Per-tick firing decision state machine for one turret unit.
///
/// Exclusively owned by its unit; the unit's energy store and ammo
/// count are passed in each tick rather than held here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireController {
    policy: TargetingPolicy,
    priorities: Vec<TargetCategory>,
    auto_fire: bool,
    power_per_shot: u32,
    ammo_per_shot: u32,
    #[serde(with = "crate::math::fixed_serde")]
    accuracy: Fixed,
    tier: u8,
    cooldown_ticks: u32,
    cooldown_remaining: u32,
    current_target: Option<EntityId>,
}

impl FireController {
    /// Create a controller with validated construction parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::InvalidTier`] for tier 0 and
    /// [`TurretError::InvalidAccuracy`] for an accuracy outside
    /// `[0, 1]`. These are the only hard-error paths in the firing
    /// core; everything at runtime clamps or no-ops instead.
    pub fn new(
        tier: u8,
        power_per_shot: u32,
        ammo_per_shot: u32,
        accuracy: Fixed,
        cooldown_ticks: u32,
    ) -> Result<Self> {
        if tier == 0 {
            return Err(TurretError::InvalidTier(u32::from(tier)));
        }
        if accuracy < Fixed::ZERO || accuracy > Fixed::ONE {
            return Err(TurretError::InvalidAccuracy(accuracy.to_string()));
        }

        Ok(Self {
            policy: TargetingPolicy::new(),
            priorities: default_priorities(),
            auto_fire: true,
            power_per_shot,
            ammo_per_shot,
            accuracy,
            tier,
            cooldown_ticks: cooldown_ticks.max(1),
            cooldown_remaining: 0,
            current_target: None,
        })
    }

    /// Builder method to replace the targeting policy.
    #[must_use]
    pub fn with_policy(mut self, policy: TargetingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder method to set the auto-fire gate.
    #[must_use]
    pub fn with_auto_fire(mut self, auto_fire: bool) -> Self {
        self.auto_fire = auto_fire;
        self
    }

    /// Builder method to replace the category priority ordering.
    #[must_use]
    pub fn with_priorities(mut self, priorities: Vec<TargetCategory>) -> Self {
        self.priorities = priorities;
        self
    }

    /// The targeting policy.
    #[must_use]
    pub const fn policy(&self) -> &TargetingPolicy {
        &self.policy
    }

    /// Mutable access to the targeting policy.
    pub fn policy_mut(&mut self) -> &mut TargetingPolicy {
        &mut self.policy
    }

    /// Category priority ordering (first = highest).
    #[must_use]
    pub fn priorities(&self) -> &[TargetCategory] {
        &self.priorities
    }

    /// Whether the controller fires without an external trigger.
    #[must_use]
    pub const fn auto_fire(&self) -> bool {
        self.auto_fire
    }

    /// Enable or disable automatic firing.
    pub fn set_auto_fire(&mut self, auto_fire: bool) {
        self.auto_fire = auto_fire;
    }

    /// Energy drawn per shot.
    #[must_use]
    pub const fn power_per_shot(&self) -> u32 {
        self.power_per_shot
    }

    /// Ammo rounds drawn per shot.
    #[must_use]
    pub const fn ammo_per_shot(&self) -> u32 {
        self.ammo_per_shot
    }

    /// Hit probability fraction.
    #[must_use]
    pub const fn accuracy(&self) -> Fixed {
        self.accuracy
    }

    /// Turret tier.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        self.tier
    }

    /// Working cooldown length in ticks.
    #[must_use]
    pub const fn cooldown_ticks(&self) -> u32 {
        self.cooldown_ticks
    }

    /// Ticks left before the next shot is possible.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    /// Whether the controller is cooling down.
    #[must_use]
    pub const fn is_on_cooldown(&self) -> bool {
        self.cooldown_remaining > 0
    }

    /// The currently tracked target, if any.
    #[must_use]
    pub const fn current_target(&self) -> Option<EntityId> {
        self.current_target
    }

    /// Observable state, derived from cooldown and target.
    #[must_use]
    pub const fn state(&self) -> FireControlState {
        if self.cooldown_remaining > 0 {
            FireControlState::Cooldown
        } else if self.current_target.is_some() {
            FireControlState::Tracking
        } else {
            FireControlState::Idle
        }
    }

    /// Check all firing preconditions: cooldown elapsed, enough
    /// energy, enough ammo.
    #[must_use]
    pub fn can_fire(&self, energy: &EnergyStore, ammo_available: u32) -> bool {
        self.cooldown_remaining == 0
            && energy.can_consume(self.power_per_shot)
            && ammo_available >= self.ammo_per_shot
    }

    /// Advance the state machine by one tick.
    ///
    /// While cooling down the controller only counts down: no
    /// selection runs and no events are emitted. Once the cooldown
    /// elapses (including on the tick it reaches zero), a target is
    /// resolved from `candidates`; with auto-fire enabled and
    /// [`can_fire`](Self::can_fire) satisfied a shot is taken,
    /// consuming energy and restarting the cooldown. Ammo is deducted
    /// by the owning unit, not here.
    pub fn advance(
        &mut self,
        origin: Vec3Fixed,
        candidates: &[Candidate],
        owner: Option<OwnerId>,
        energy: &mut EnergyStore,
        ammo_available: u32,
    ) -> ControllerTick {
        if self.cooldown_remaining > 0 {
            self.cooldown_remaining -= 1;
            if self.cooldown_remaining > 0 {
                return ControllerTick {
                    state: FireControlState::Cooldown,
                    shot: None,
                    target_change: None,
                };
            }
        }

        let previous = self.current_target;
        let selected = select_target(
            origin,
            candidates,
            &self.policy,
            &self.priorities,
            previous,
            owner,
        );
        let target_change = match (previous, selected) {
            (None, Some(target)) => Some(TargetChange::Acquired { target }),
            (Some(from), Some(to)) if from != to => Some(TargetChange::Switched { from, to }),
            (Some(from), None) => Some(TargetChange::Lost { from }),
            _ => None,
        };
        self.current_target = selected;

        let Some(target) = selected else {
            return ControllerTick {
                state: FireControlState::Idle,
                shot: None,
                target_change,
            };
        };

        let shot = if self.auto_fire && self.can_fire(energy, ammo_available) {
            Some(self.execute_shot(target, energy))
        } else {
            None
        };

        ControllerTick {
            state: self.state(),
            shot,
            target_change,
        }
    }

    /// Fire at the current target regardless of the auto-fire gate.
    ///
    /// Still requires [`can_fire`](Self::can_fire) and a tracked
    /// target; otherwise this is a no-op returning `None`, never an
    /// error. Ammo is deducted by the owning unit.
    pub fn force_fire(
        &mut self,
        energy: &mut EnergyStore,
        ammo_available: u32,
    ) -> Option<ShotDecision> {
        let target = self.current_target?;
        if !self.can_fire(energy, ammo_available) {
            return None;
        }
        Some(self.execute_shot(target, energy))
    }

    /// Consume energy, restart the cooldown, and produce the decision.
    fn execute_shot(&mut self, target: EntityId, energy: &mut EnergyStore) -> ShotDecision {
        energy.consume(self.power_per_shot, false);
        self.cooldown_remaining = self.cooldown_ticks;

        ShotDecision {
            target,
            accuracy: self.accuracy,
            tier: self.tier,
            power_used: self.power_per_shot,
            ammo_used: self.ammo_per_shot,
        }
    }

    /// Construct from parts the caller has already clamped into the
    /// validated ranges (load path, which never fails).
    pub(crate) fn from_clamped_parts(
        tier: u8,
        power_per_shot: u32,
        ammo_per_shot: u32,
        accuracy: Fixed,
        cooldown_ticks: u32,
    ) -> Self {
        Self {
            policy: TargetingPolicy::new(),
            priorities: default_priorities(),
            auto_fire: true,
            power_per_shot,
            ammo_per_shot,
            accuracy: accuracy.clamp(Fixed::ZERO, Fixed::ONE),
            tier: tier.max(1),
            cooldown_ticks: cooldown_ticks.max(1),
            cooldown_remaining: 0,
            current_target: None,
        }
    }

    /// Overwrite the derived firing parameters after an upgrade
    /// recomputation.
    pub(crate) fn apply_derived(&mut self, params: &crate::upgrades::DerivedParams) {
        self.power_per_shot = params.power_per_shot;
        self.ammo_per_shot = params.ammo_per_shot;
        self.accuracy = params.accuracy.clamp(Fixed::ZERO, Fixed::ONE);
        self.cooldown_ticks = params.cooldown_ticks.max(1);
        self.policy.rebound_max_range(params.max_range);
    }

    /// Restore runtime state from a persisted snapshot.
    pub(crate) fn restore_runtime(
        &mut self,
        cooldown_remaining: u32,
        current_target: Option<EntityId>,
    ) {
        self.cooldown_remaining = cooldown_remaining;
        self.current_target = current_target;
    }
}
