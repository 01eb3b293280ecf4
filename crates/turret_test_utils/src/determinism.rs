//! Determinism testing utilities.
//!
//! Provides a harness for verifying that turret simulations produce
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Hosts tick many turrets per world and may sync snapshots between
//! peers, so the decision core must be 100% deterministic. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different
//!   results. We use fixed-point arithmetic via
//!   [`turret_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   We always iterate in sorted unit-id order.
//!
//! - **System randomness**: No calls to `rand()` anywhere in the core;
//!   hit/miss resolution happens in the host, outside the core.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual component determinism (energy, selection)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full registry scenarios are reproducible
//! 4. **Parallel tests**: Running N registries in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use turret_core::math::Vec3Fixed;
use turret_core::registry::TurretRegistry;
use turret_core::targeting::Candidate;
use turret_core::unit::UnitId;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the run was deterministic, with a detailed error
    /// message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel registry runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks each run simulated.
    pub ticks: u64,
    /// Number of runs.
    pub num_runs: usize,
}

impl ParallelRunResult {
    /// Check if all runs produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all runs matched.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel runs diverged!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_runs,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one tick
/// * `hash` - Function to compute a state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for a [`TurretRegistry`].
///
/// Runs the registry twice with identical setup and candidate
/// provider and verifies the final state hashes match exactly.
pub fn verify_registry_determinism<Setup, Provider>(
    setup_fn: Setup,
    provider: Provider,
    num_ticks: u64,
) -> bool
where
    Setup: Fn() -> TurretRegistry,
    Provider: Fn(UnitId, Vec3Fixed, u32) -> Vec<Candidate>,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |registry| {
            registry.tick(|id, origin, radius| provider(id, origin, radius));
        },
        |registry| registry.state_hash(),
    );
    result.is_deterministic
}

/// Run N registries in parallel using scoped threads and collect
/// final hashes.
///
/// This catches non-determinism that only manifests under thread
/// scheduling variations, memory layout differences, etc.
pub fn run_parallel_registries_scoped<Setup, Provider>(
    setup_fn: Setup,
    provider: Provider,
    num_runs: usize,
    num_ticks: u64,
) -> ParallelRunResult
where
    Setup: Fn() -> TurretRegistry + Sync,
    Provider: Fn(UnitId, Vec3Fixed, u32) -> Vec<Candidate> + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut registry = setup_fn();
                    for _ in 0..num_ticks {
                        registry.tick(|id, origin, radius| provider(id, origin, radius));
                    }
                    registry.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelRunResult {
        hashes,
        ticks: num_ticks,
        num_runs,
    }
}

/// Compare two registry runs tick-by-tick, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly when the
/// runs start to differ.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<Setup, Provider>(
    setup_fn: Setup,
    provider: Provider,
    num_ticks: u64,
) -> Option<u64>
where
    Setup: Fn() -> TurretRegistry,
    Provider: Fn(UnitId, Vec3Fixed, u32) -> Vec<Candidate>,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.tick(|id, origin, radius| provider(id, origin, radius));
        second.tick(|id, origin, radius| provider(id, origin, radius));

        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that serialization round-trip preserves registry state
/// exactly.
///
/// This is critical for save/load and host-to-host sync.
pub fn verify_serialization_determinism<Setup, Provider>(
    setup_fn: Setup,
    provider: Provider,
    num_ticks: u64,
) -> bool
where
    Setup: Fn() -> TurretRegistry,
    Provider: Fn(UnitId, Vec3Fixed, u32) -> Vec<Candidate>,
{
    let mut registry = setup_fn();

    for _ in 0..num_ticks {
        registry.tick(|id, origin, radius| provider(id, origin, radius));
    }

    let hash_before = registry.state_hash();

    let bytes = match registry.serialize() {
        Ok(b) => b,
        Err(_) => return false,
    };

    let restored = match TurretRegistry::deserialize(&bytes) {
        Ok(r) => r,
        Err(_) => return false,
    };

    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the decision core.
pub mod strategies {
    use proptest::prelude::*;
    use turret_core::math::Vec3Fixed;
    use turret_core::targeting::{Candidate, TargetCategory};

    /// Generate a block coordinate in a reasonable world range.
    pub fn arb_coordinate() -> impl Strategy<Value = i32> {
        -1_000i32..1_000i32
    }

    /// Generate a position from block coordinates.
    pub fn arb_position() -> impl Strategy<Value = Vec3Fixed> {
        (arb_coordinate(), 0i32..256, arb_coordinate())
            .prop_map(|(x, y, z)| Vec3Fixed::from_blocks(x, y, z))
    }

    /// Generate a target category.
    pub fn arb_category() -> impl Strategy<Value = TargetCategory> {
        prop_oneof![
            Just(TargetCategory::Player),
            Just(TargetCategory::Hostile),
            Just(TargetCategory::Passive),
        ]
    }

    /// Generate a candidate with an arbitrary id, position, category,
    /// and owner.
    pub fn arb_candidate() -> impl Strategy<Value = Candidate> {
        (
            1u64..10_000,
            arb_position(),
            arb_category(),
            proptest::option::of(1u64..100),
            1u32..100,
        )
            .prop_map(|(id, position, category, owner, health)| {
                let candidate = Candidate::new(id, position, category).with_health(health);
                match owner {
                    Some(owner) => candidate.with_owner(owner),
                    None => candidate,
                }
            })
    }

    /// Generate a list of candidates.
    pub fn arb_candidate_list(max: usize) -> impl Strategy<Value = Vec<Candidate>> {
        proptest::collection::vec(arb_candidate(), 0..max)
    }

    /// Generate a supported turret tier.
    pub fn arb_tier() -> impl Strategy<Value = u8> {
        1u8..=turret_core::data::MAX_TIER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{armed_turret, hostile_at, pos};
    use proptest::prelude::*;
    use turret_core::targeting::TargetCategory;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_empty_registry_determinism() {
        assert!(verify_registry_determinism(
            TurretRegistry::new,
            |_, _, _| Vec::new(),
            100,
        ));
    }

    // =========================================================================
    // Integration tests: firing determinism
    // =========================================================================

    fn setup_defense_line() -> TurretRegistry {
        let mut registry = TurretRegistry::new();
        for (i, tier) in [(0, 1u8), (1, 2), (2, 3)] {
            registry
                .register(armed_turret(pos(i * 50, 0, 0), tier))
                .expect("valid turret");
        }
        registry
    }

    fn raid_provider(_: u64, origin: Vec3Fixed, _: u32) -> Vec<Candidate> {
        vec![
            Candidate::new(500, origin + pos(5, 0, 0), TargetCategory::Hostile),
            Candidate::new(501, origin + pos(9, 0, 2), TargetCategory::Hostile),
            Candidate::new(502, origin + pos(3, 0, -4), TargetCategory::Passive),
        ]
    }

    #[test]
    fn test_defense_line_determinism() {
        let result = verify_determinism(
            5,
            200,
            setup_defense_line,
            |registry| {
                registry.tick(raid_provider);
            },
            |registry| registry.state_hash(),
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_fire_events_are_exact() {
        // Run the scenario twice and check events are identical
        let mut first = setup_defense_line();
        let mut second = setup_defense_line();

        for tick in 0..100 {
            let events1 = first.tick(raid_provider);
            let events2 = second.tick(raid_provider);

            assert_eq!(
                events1, events2,
                "Events differ at tick {tick}"
            );
        }
    }

    #[test]
    fn test_find_divergence_on_deterministic_run() {
        let divergence = find_first_divergence(setup_defense_line, raid_provider, 100);
        assert!(divergence.is_none(), "Expected no divergence");
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_empty_registry() {
        assert!(verify_serialization_determinism(
            TurretRegistry::new,
            |_, _, _| Vec::new(),
            0,
        ));
    }

    #[test]
    fn test_serialization_preserves_mid_cooldown_state() {
        assert!(verify_serialization_determinism(
            setup_defense_line,
            raid_provider,
            37,
        ));
    }

    // =========================================================================
    // Parallel runs
    // =========================================================================

    #[test]
    fn test_parallel_empty_registries() {
        let result =
            run_parallel_registries_scoped(TurretRegistry::new, |_, _, _| Vec::new(), 4, 100);
        result.assert_deterministic();
    }

    #[test]
    fn test_parallel_defense_lines() {
        let result = run_parallel_registries_scoped(setup_defense_line, raid_provider, 4, 200);
        result.assert_deterministic();
    }

    // =========================================================================
    // Property-based tests using proptest
    // =========================================================================

    proptest! {
        /// Any random turret placement must tick deterministically.
        #[test]
        fn prop_random_placements_are_deterministic(
            x in strategies::arb_coordinate(),
            z in strategies::arb_coordinate(),
            tier in strategies::arb_tier(),
        ) {
            let setup = move || {
                let mut registry = TurretRegistry::new();
                registry
                    .register(armed_turret(pos(x, 0, z), tier))
                    .expect("valid turret");
                registry
            };

            let is_det = verify_registry_determinism(
                setup,
                |_, origin, _| vec![Candidate::new(9, origin + pos(4, 0, 0), TargetCategory::Hostile)],
                64,
            );
            prop_assert!(is_det);
        }

        /// Any candidate field produces the same selection every run.
        #[test]
        fn prop_candidate_fields_are_deterministic(
            candidates in strategies::arb_candidate_list(24),
        ) {
            let candidates_clone = candidates.clone();
            let setup = || {
                let mut registry = TurretRegistry::new();
                registry
                    .register(armed_turret(pos(0, 0, 0), 2))
                    .expect("valid turret");
                registry
            };

            let is_det = verify_registry_determinism(
                setup,
                move |_, _, _| candidates_clone.clone(),
                32,
            );
            prop_assert!(is_det);
        }

        /// Serialization round-trip preserves state after any number
        /// of ticks.
        #[test]
        fn prop_serialization_roundtrip_is_exact(
            num_ticks in 0u64..100,
        ) {
            prop_assert!(verify_serialization_determinism(
                setup_defense_line,
                raid_provider,
                num_ticks,
            ));
        }

        /// A turret never fires more than its ammo allows.
        #[test]
        fn prop_ammo_bounds_total_shots(
            rounds in 0u32..10,
        ) {
            let mut registry = TurretRegistry::new();
            let mut params = armed_turret(pos(0, 0, 0), 1);
            params.initial_ammo = rounds;
            let id = registry.register(params).expect("valid turret");

            let mut shots = 0u32;
            for _ in 0..500 {
                let events = registry.tick(|_, origin, _| {
                    vec![Candidate::new(9, origin + pos(4, 0, 0), TargetCategory::Hostile)]
                });
                shots += events.fired.len() as u32;
            }

            prop_assert!(shots <= rounds);
            prop_assert_eq!(registry.get(id).unwrap().ammo().rounds(), rounds - shots);
        }
    }

    // =========================================================================
    // Stress tests (only run explicitly with --ignored)
    // =========================================================================

    #[test]
    #[ignore = "Long-running stress test"]
    fn stress_test_many_turrets() {
        let setup = || {
            let mut registry = TurretRegistry::new();
            for i in 0..100 {
                let tier = (i % 5 + 1) as u8;
                registry
                    .register(armed_turret(pos((i % 10) * 40, 0, (i / 10) * 40), tier))
                    .expect("valid turret");
            }
            registry
        };

        let result = verify_determinism(
            5,
            1_000,
            setup,
            |registry| {
                registry.tick(raid_provider);
            },
            |registry| registry.state_hash(),
        );
        result.assert_deterministic();
    }

    #[test]
    #[ignore = "Long-running stress test"]
    fn stress_test_parallel_many_runs() {
        let result = run_parallel_registries_scoped(setup_defense_line, raid_provider, 16, 1_000);
        result.assert_deterministic();
    }

    #[test]
    fn test_hostile_fixture_distance() {
        let candidate = hostile_at(1, 7);
        assert_eq!(
            compute_hash(&candidate.position),
            compute_hash(&pos(7, 0, 0))
        );
    }
}
