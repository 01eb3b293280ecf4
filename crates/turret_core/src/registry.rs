//! Shared unit registry and the per-tick driver.
//!
//! Units reference each other (and are referenced by collaborators)
//! through ids in this arena, never through owning object references.
//! Iteration is always in sorted-id order so a registry full of
//! turrets produces identical results on every run.
//!
//! # Determinism
//!
//! All operations here are fully deterministic:
//! - No floating-point math (fixed-point via [`Fixed`](crate::math::Fixed))
//! - No system randomness
//! - Consistent iteration order (sorted unit ids)
//! - Same inputs always produce same outputs

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::controller::TargetChange;
use crate::error::{Result, TurretError};
use crate::math::Vec3Fixed;
use crate::targeting::Candidate;
use crate::unit::{FireEvent, TurretUnit, TurretUnitParams, UnitId};

/// Ticks per second the host loop is expected to run at.
pub const TICK_RATE: u32 = 20;

/// Events generated during one registry tick.
///
/// These are plain return values: the host turns fire events into
/// world effects and may surface target changes to UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Shots fired this tick, in unit-id order.
    pub fired: Vec<FireEvent>,
    /// Target changes this tick, in unit-id order.
    pub target_changes: Vec<(UnitId, TargetChange)>,
}

/// Arena of turret units keyed by id.
///
/// The registry owns every unit, assigns ids on registration, and
/// drives all units exactly once per [`tick`](Self::tick). The host
/// guarantees exclusive access per tick; the registry holds no locks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurretRegistry {
    tick: u64,
    units: HashMap<UnitId, TurretUnit>,
    next_id: UnitId,
}

impl TurretRegistry {
    /// Create an empty registry starting at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick: 0,
            units: HashMap::new(),
            next_id: 1,
        }
    }

    /// Current tick number.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Build and register a new unit, returning its id.
    ///
    /// # Errors
    ///
    /// Propagates construction validation failures from
    /// [`TurretUnit::new`].
    pub fn register(&mut self, params: TurretUnitParams) -> Result<UnitId> {
        let unit = TurretUnit::new(params)?;
        Ok(self.insert(unit))
    }

    /// Insert an already-built unit, assigning it a fresh id.
    pub fn insert(&mut self, mut unit: TurretUnit) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        unit.set_id(id);
        self.units.insert(id, unit);
        id
    }

    /// Remove a unit.
    ///
    /// # Errors
    ///
    /// Returns [`TurretError::UnitNotFound`] if the id is unknown.
    pub fn remove(&mut self, id: UnitId) -> Result<TurretUnit> {
        self.units.remove(&id).ok_or(TurretError::UnitNotFound(id))
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&TurretUnit> {
        self.units.get(&id)
    }

    /// Get a mutable unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut TurretUnit> {
        self.units.get_mut(&id)
    }

    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sorted unit ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all units (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &TurretUnit)> {
        self.units.iter()
    }

    /// Advance every unit by one tick.
    ///
    /// The candidate provider is called once per unit with the unit's
    /// id, position, and live targeting range; it must return every
    /// entity within that radius (policy filtering happens in the
    /// selector, not the provider). A provider that returns nothing —
    /// including one standing in for a slow or failed world query —
    /// simply means no eligible targets for that unit this tick.
    pub fn tick<P>(&mut self, mut provider: P) -> TickEvents
    where
        P: FnMut(UnitId, Vec3Fixed, u32) -> Vec<Candidate>,
    {
        let mut events = TickEvents::default();

        for id in self.sorted_ids() {
            let Some(unit) = self.units.get_mut(&id) else {
                continue;
            };

            let candidates = provider(id, unit.position(), unit.search_radius());
            let result = unit.tick(&candidates);

            if let Some(fired) = result.fired {
                events.fired.push(fired);
            }
            if let Some(change) = result.target_change {
                events.target_changes.push((id, change));
            }
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Registry state hash");
        }

        events
    }

    /// Restore a persisted unit into the registry, assigning a fresh
    /// id.
    ///
    /// Loading clamps rather than fails, so a corrupt record still
    /// yields a unit (see [`crate::persistence::load_unit`]).
    pub fn restore_unit(&mut self, record: &crate::persistence::UnitRecord) -> UnitId {
        self.insert(crate::persistence::load_unit(record))
    }

    /// Calculate a hash of the current registry state.
    ///
    /// Two registries with identical state produce identical hashes;
    /// used by the determinism harness and for desync detection.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        let ids = self.sorted_ids();
        ids.len().hash(&mut hasher);

        for id in ids {
            if let Some(unit) = self.units.get(&id) {
                id.hash(&mut hasher);

                unit.position().hash(&mut hasher);
                unit.owner().hash(&mut hasher);
                unit.concealed().hash(&mut hasher);

                let energy = unit.energy();
                energy.stored().hash(&mut hasher);
                energy.capacity().hash(&mut hasher);

                let controller = unit.controller();
                controller.cooldown_remaining().hash(&mut hasher);
                controller.current_target().hash(&mut hasher);
                controller.power_per_shot().hash(&mut hasher);
                controller.accuracy().to_bits().hash(&mut hasher);
                controller.policy().hash(&mut hasher);

                unit.ammo().rounds().hash(&mut hasher);
                unit.upgrade_slots().len().hash(&mut hasher);
                for slot in unit.upgrade_slots() {
                    match slot {
                        Some(stack) => {
                            1u8.hash(&mut hasher);
                            stack.count.hash(&mut hasher);
                        }
                        None => 0u8.hash(&mut hasher),
                    }
                }
            }
        }

        hasher.finish()
    }

    /// Serialize the registry state for save or sync.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| TurretError::InvalidState(format!("Failed to serialize registry: {e}")))
    }

    /// Deserialize registry state from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| TurretError::InvalidState(format!("Failed to deserialize registry: {e}")))
    }
}

impl Default for TurretRegistry {
    fn default() -> Self {
        Self::new()
    }
}
