//! Property tests for the pure target selector.
//!
//! These live as an integration test (rather than a `#[cfg(test)]`
//! module inside `selector.rs`) because they consume
//! [`turret_test_utils`], which itself depends on `turret_core`. In a
//! unit-test build `turret_core` is compiled twice, so the `Candidate`
//! produced by the test-util strategies would not match the `Candidate`
//! seen by the unit test. As an integration test, `turret_core` is a
//! single ordinary dependency and the types line up.

use proptest::prelude::*;

use turret_core::math::Vec3Fixed;
use turret_core::selector::select_target;
use turret_core::targeting::TargetCategory::{Hostile, Passive, Player};
use turret_core::targeting::{TargetCategory, TargetingPolicy};
use turret_test_utils::determinism::strategies::arb_candidate_list;

const PRIORITIES: [TargetCategory; 3] = [Hostile, Player, Passive];

fn policy_all() -> TargetingPolicy {
    let mut policy = TargetingPolicy::new();
    policy.set_target_players(true);
    policy.set_target_passive(true);
    policy
}

proptest! {
    /// The selection never depends on candidate order: the
    /// provider may return its results in any order.
    #[test]
    fn prop_selection_is_order_independent(
        (original, shuffled) in arb_candidate_list(16)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
        let policy = policy_all();
        let first = select_target(
            Vec3Fixed::ZERO, &original, &policy, &PRIORITIES, None, Some(1),
        );
        let second = select_target(
            Vec3Fixed::ZERO, &shuffled, &policy, &PRIORITIES, None, Some(1),
        );
        prop_assert_eq!(first, second);
    }

    /// Repeated selection with an unchanged candidate set is
    /// stable once a target is held.
    #[test]
    fn prop_held_target_is_stable(
        candidates in arb_candidate_list(16),
    ) {
        let policy = policy_all();
        let first = select_target(
            Vec3Fixed::ZERO, &candidates, &policy, &PRIORITIES, None, None,
        );
        let second = select_target(
            Vec3Fixed::ZERO, &candidates, &policy, &PRIORITIES, first, None,
        );
        prop_assert_eq!(first, second);
    }
}
