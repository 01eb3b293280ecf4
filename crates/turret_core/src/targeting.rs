//! Targeting data types: candidate targets and the targeting policy.
//!
//! The policy is a pure value object with guarded setters. The range
//! invariant (`range <= max_range`) is a reject-invalid-mutation
//! contract: setters that would violate it leave the prior state
//! unchanged and report failure, they never clamp.

use serde::{Deserialize, Serialize};

use crate::math::Vec3Fixed;

/// Unique identifier for world entities (potential targets).
pub type EntityId = u64;

/// Opaque identity of a turret's owner.
///
/// Name and online-status resolution happen outside the core; only
/// equality matters here (friendly-fire exclusion).
pub type OwnerId = u64;

/// Category of a candidate target, as classified by the world-query
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TargetCategory {
    /// A player-controlled entity.
    Player,
    /// A hostile mob.
    #[default]
    Hostile,
    /// A passive creature.
    Passive,
}

/// A potential target surfaced by the candidate provider.
///
/// The provider returns everything within the search radius; policy
/// filtering is the selector's job, not the provider's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// World entity id.
    pub id: EntityId,
    /// Position in world space.
    pub position: Vec3Fixed,
    /// Target category.
    pub category: TargetCategory,
    /// Owner identity, if this entity belongs to someone.
    pub owner: Option<OwnerId>,
    /// Current health, for collaborators that rank by it.
    pub health: u32,
}

impl Candidate {
    /// Create an unowned candidate.
    #[must_use]
    pub const fn new(id: EntityId, position: Vec3Fixed, category: TargetCategory) -> Self {
        Self {
            id,
            position,
            category,
            owner: None,
            health: 20,
        }
    }

    /// Builder method to set the owner.
    #[must_use]
    pub const fn with_owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Builder method to set the health.
    #[must_use]
    pub const fn with_health(mut self, health: u32) -> Self {
        self.health = health;
        self
    }
}

/// Declarative targeting preferences for one turret.
///
/// `range` is the live working radius used for every selection;
/// `max_range` is only the upper bound that upgrades may raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetingPolicy {
    target_players: bool,
    target_mobs: bool,
    target_passive: bool,
    range: u32,
    max_range: u32,
}

impl TargetingPolicy {
    /// Create a policy with the default preferences: mobs only,
    /// range 16 inside an upper bound of 32.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            target_players: false,
            target_mobs: true,
            target_passive: false,
            range: 16,
            max_range: 32,
        }
    }

    /// Whether players are valid targets.
    #[must_use]
    pub const fn target_players(&self) -> bool {
        self.target_players
    }

    /// Whether hostile mobs are valid targets.
    #[must_use]
    pub const fn target_mobs(&self) -> bool {
        self.target_mobs
    }

    /// Whether passive creatures are valid targets.
    #[must_use]
    pub const fn target_passive(&self) -> bool {
        self.target_passive
    }

    /// Live working radius.
    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }

    /// Upper bound on the working radius.
    #[must_use]
    pub const fn max_range(&self) -> u32 {
        self.max_range
    }

    /// Enable or disable targeting players.
    pub fn set_target_players(&mut self, target: bool) {
        self.target_players = target;
    }

    /// Enable or disable targeting hostile mobs.
    pub fn set_target_mobs(&mut self, target: bool) {
        self.target_mobs = target;
    }

    /// Enable or disable targeting passive creatures.
    pub fn set_target_passive(&mut self, target: bool) {
        self.target_passive = target;
    }

    /// Set the working radius. Rejected (state unchanged, returns
    /// `false`) when it would exceed `max_range`.
    pub fn set_range(&mut self, range: u32) -> bool {
        if range <= self.max_range {
            self.range = range;
            true
        } else {
            false
        }
    }

    /// Set the radius upper bound. Rejected (state unchanged, returns
    /// `false`) when it would fall below the current working radius.
    pub fn set_max_range(&mut self, max_range: u32) -> bool {
        if max_range >= self.range {
            self.max_range = max_range;
            true
        } else {
            false
        }
    }

    /// Check whether this policy permits attacking the given category.
    #[must_use]
    pub const fn allows(&self, category: TargetCategory) -> bool {
        match category {
            TargetCategory::Player => self.target_players,
            TargetCategory::Hostile => self.target_mobs,
            TargetCategory::Passive => self.target_passive,
        }
    }

    /// Rebuild a policy from untrusted parts, clamping into validity.
    ///
    /// Used by the load path, which never hard-fails on bad saved
    /// data: a range above the bound is pulled down, never rejected.
    #[must_use]
    pub fn from_clamped_parts(
        target_players: bool,
        target_mobs: bool,
        target_passive: bool,
        range: u32,
        max_range: u32,
    ) -> Self {
        Self {
            target_players,
            target_mobs,
            target_passive,
            range: range.min(max_range),
            max_range,
        }
    }

    /// Pull the working radius down to a new upper bound.
    ///
    /// Upgrade recomputation path: unlike the guarded setters this is
    /// not a caller mutation, so shrinking the bound below the working
    /// radius shrinks the radius with it.
    pub(crate) fn rebound_max_range(&mut self, max_range: u32) {
        self.max_range = max_range;
        if self.range > max_range {
            self.range = max_range;
        }
    }
}

impl Default for TargetingPolicy {
    fn default() -> Self {
        Self::new()
    }
}
