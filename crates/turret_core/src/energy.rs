//! Bounded, rate-limited energy storage for turret units.
//!
//! Every mutator clamps rather than errors: a turret tick must never
//! halt on bad energy math, so out-of-range requests result in partial
//! transfers, never failures. All operations are total functions.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Bounded energy accumulator with independent receive/extract rate caps.
///
/// Invariant: `0 <= stored <= capacity` at all times, enforced by every
/// mutator. A rate cap of zero means the store cannot receive (or
/// extract) at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyStore {
    stored: u32,
    capacity: u32,
    max_receive: u32,
    max_extract: u32,
}

impl EnergyStore {
    /// Create an empty store with the given capacity.
    ///
    /// Receive and extract caps default to the full capacity.
    #[must_use]
    pub const fn new(capacity: u32) -> Self {
        Self {
            stored: 0,
            capacity,
            max_receive: capacity,
            max_extract: capacity,
        }
    }

    /// Create an empty store with explicit per-tick transfer caps.
    #[must_use]
    pub const fn with_limits(capacity: u32, max_receive: u32, max_extract: u32) -> Self {
        Self {
            stored: 0,
            capacity,
            max_receive,
            max_extract,
        }
    }

    /// Current stored energy.
    #[must_use]
    pub const fn stored(&self) -> u32 {
        self.stored
    }

    /// Maximum energy this store can hold.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Maximum energy accepted per transfer.
    #[must_use]
    pub const fn max_receive(&self) -> u32 {
        self.max_receive
    }

    /// Maximum energy released per transfer.
    #[must_use]
    pub const fn max_extract(&self) -> u32 {
        self.max_extract
    }

    /// Check whether the store accepts incoming energy at all.
    #[must_use]
    pub const fn can_receive(&self) -> bool {
        self.max_receive > 0
    }

    /// Check whether the store releases energy at all.
    #[must_use]
    pub const fn can_extract(&self) -> bool {
        self.max_extract > 0
    }

    /// Accept up to `amount` energy, bounded by free space and the
    /// receive cap.
    ///
    /// Returns the amount actually accepted. With `simulate` set the
    /// store is not mutated; a later non-simulated call with the same
    /// arguments accepts the same amount.
    pub fn receive(&mut self, amount: u32, simulate: bool) -> u32 {
        if !self.can_receive() {
            return 0;
        }

        let accepted = (self.capacity - self.stored).min(self.max_receive).min(amount);
        if !simulate && accepted > 0 {
            self.stored += accepted;
        }
        accepted
    }

    /// Release up to `amount` energy, bounded by the stored amount and
    /// the extract cap.
    ///
    /// Returns the amount actually released. Mutates only when not
    /// simulating.
    pub fn extract(&mut self, amount: u32, simulate: bool) -> u32 {
        if !self.can_extract() {
            return 0;
        }

        let released = self.stored.min(self.max_extract).min(amount);
        if !simulate && released > 0 {
            self.stored -= released;
        }
        released
    }

    /// Set the stored amount directly, clamped to capacity.
    ///
    /// Used during load and administrative adjustment.
    pub fn set_stored(&mut self, stored: u32) {
        self.stored = stored.min(self.capacity);
    }

    /// Set the capacity. If the new capacity is below the stored
    /// amount, the excess energy is lost, not errored.
    pub fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity;
        if self.stored > self.capacity {
            self.stored = self.capacity;
        }
    }

    /// Set the per-transfer receive cap.
    pub fn set_max_receive(&mut self, max: u32) {
        self.max_receive = max;
    }

    /// Set the per-transfer extract cap.
    pub fn set_max_extract(&mut self, max: u32) {
        self.max_extract = max;
    }

    /// Add or subtract energy, clamped into `[0, capacity]`.
    ///
    /// This is the path used for direct firing-cost deduction; it
    /// ignores the transfer caps.
    pub fn modify(&mut self, delta: i32) {
        if delta >= 0 {
            self.stored = self.stored.saturating_add(delta as u32).min(self.capacity);
        } else {
            self.stored = self.stored.saturating_sub(delta.unsigned_abs());
        }
    }

    /// Check whether `amount` energy is available for consumption.
    #[must_use]
    pub const fn can_consume(&self, amount: u32) -> bool {
        self.stored >= amount
    }

    /// Consume up to `amount` energy, ignoring the extract cap.
    ///
    /// Returns the amount actually consumed. Mutates only when not
    /// simulating.
    pub fn consume(&mut self, amount: u32, simulate: bool) -> u32 {
        let consumed = self.stored.min(amount);
        if !simulate && consumed > 0 {
            self.stored -= consumed;
        }
        consumed
    }

    /// Fill fraction in `[0, 1]`, or zero for a zero-capacity store.
    #[must_use]
    pub fn percentage(&self) -> Fixed {
        if self.capacity == 0 {
            Fixed::ZERO
        } else {
            Fixed::from_num(self.stored) / Fixed::from_num(self.capacity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_bounded_by_rate() {
        let mut store = EnergyStore::with_limits(100, 10, 20);

        // Rate cap limits each transfer to 10
        assert_eq!(store.receive(50, false), 10);
        assert_eq!(store.stored(), 10);
        assert_eq!(store.receive(50, false), 10);
        assert_eq!(store.stored(), 20);
    }

    #[test]
    fn test_receive_bounded_by_free_space() {
        let mut store = EnergyStore::new(30);
        store.set_stored(25);

        assert_eq!(store.receive(100, false), 5);
        assert_eq!(store.stored(), 30);
        // Full store accepts nothing
        assert_eq!(store.receive(1, false), 0);
    }

    #[test]
    fn test_receive_zero_rate_cannot_receive() {
        let mut store = EnergyStore::with_limits(100, 0, 20);
        assert!(!store.can_receive());
        assert_eq!(store.receive(50, false), 0);
        assert_eq!(store.stored(), 0);
    }

    #[test]
    fn test_simulate_does_not_mutate() {
        let mut store = EnergyStore::with_limits(100, 10, 20);

        let simulated = store.receive(50, true);
        assert_eq!(simulated, 10);
        assert_eq!(store.stored(), 0);

        // The non-simulated call yields the same delta
        assert_eq!(store.receive(50, false), simulated);
        assert_eq!(store.stored(), 10);
    }

    #[test]
    fn test_extract_symmetric() {
        let mut store = EnergyStore::with_limits(100, 100, 20);
        store.set_stored(50);

        assert_eq!(store.extract(100, false), 20);
        assert_eq!(store.stored(), 30);

        let mut sealed = EnergyStore::with_limits(100, 100, 0);
        sealed.set_stored(50);
        assert_eq!(sealed.extract(10, false), 0);
        assert_eq!(sealed.stored(), 50);
    }

    #[test]
    fn test_set_stored_clamps_to_capacity() {
        let mut store = EnergyStore::new(100);
        store.set_stored(250);
        assert_eq!(store.stored(), 100);
    }

    #[test]
    fn test_set_capacity_truncates_stored() {
        let mut store = EnergyStore::new(100);
        store.set_stored(80);

        store.set_capacity(50);
        assert_eq!(store.capacity(), 50);
        // Excess energy is lost, not errored
        assert_eq!(store.stored(), 50);
    }

    #[test]
    fn test_modify_clamps_both_directions() {
        let mut store = EnergyStore::new(100);

        store.modify(250);
        assert_eq!(store.stored(), 100);

        store.modify(-30);
        assert_eq!(store.stored(), 70);

        store.modify(-1000);
        assert_eq!(store.stored(), 0);
    }

    #[test]
    fn test_consume_ignores_extract_cap() {
        let mut store = EnergyStore::with_limits(100, 100, 5);
        store.set_stored(60);

        assert!(store.can_consume(50));
        assert!(!store.can_consume(61));

        // Firing cost deduction is not subject to the transfer cap
        assert_eq!(store.consume(50, false), 50);
        assert_eq!(store.stored(), 10);

        // Partial consumption when short
        assert_eq!(store.consume(50, false), 10);
        assert_eq!(store.stored(), 0);
    }

    #[test]
    fn test_consume_simulate() {
        let mut store = EnergyStore::new(100);
        store.set_stored(40);

        assert_eq!(store.consume(25, true), 25);
        assert_eq!(store.stored(), 40);
    }

    #[test]
    fn test_percentage() {
        let mut store = EnergyStore::new(200);
        store.set_stored(50);
        assert_eq!(store.percentage(), Fixed::from_num(1) / Fixed::from_num(4));

        let empty = EnergyStore::new(0);
        assert_eq!(empty.percentage(), Fixed::ZERO);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// One randomly chosen mutation of an energy store.
        #[derive(Debug, Clone, Copy)]
        enum Op {
            Receive(u32),
            Extract(u32),
            Consume(u32),
            Modify(i32),
            SetStored(u32),
            SetCapacity(u32),
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u32..5_000).prop_map(Op::Receive),
                (0u32..5_000).prop_map(Op::Extract),
                (0u32..5_000).prop_map(Op::Consume),
                (-5_000i32..5_000).prop_map(Op::Modify),
                (0u32..5_000).prop_map(Op::SetStored),
                (0u32..5_000).prop_map(Op::SetCapacity),
            ]
        }

        fn apply(store: &mut EnergyStore, op: Op) {
            match op {
                Op::Receive(n) => {
                    store.receive(n, false);
                }
                Op::Extract(n) => {
                    store.extract(n, false);
                }
                Op::Consume(n) => {
                    store.consume(n, false);
                }
                Op::Modify(d) => store.modify(d),
                Op::SetStored(n) => store.set_stored(n),
                Op::SetCapacity(n) => store.set_capacity(n),
            }
        }

        proptest! {
            /// After any operation sequence, `0 <= stored <= capacity`.
            #[test]
            fn prop_invariant_survives_any_sequence(
                capacity in 0u32..2_000,
                max_receive in 0u32..2_000,
                max_extract in 0u32..2_000,
                ops in proptest::collection::vec(arb_op(), 0..64),
            ) {
                let mut store = EnergyStore::with_limits(capacity, max_receive, max_extract);
                for op in ops {
                    apply(&mut store, op);
                    prop_assert!(store.stored() <= store.capacity());
                }
            }

            /// Simulated transfers never mutate and predict the real
            /// transfer exactly.
            #[test]
            fn prop_simulate_predicts_transfer(
                capacity in 0u32..2_000,
                max_receive in 0u32..2_000,
                prefill in 0u32..2_000,
                amount in 0u32..4_000,
            ) {
                let mut store = EnergyStore::with_limits(capacity, max_receive, capacity);
                store.set_stored(prefill);

                let before = store.stored();
                let predicted = store.receive(amount, true);
                prop_assert_eq!(store.stored(), before);

                let accepted = store.receive(amount, false);
                prop_assert_eq!(accepted, predicted);
                prop_assert_eq!(store.stored(), before + accepted);
            }
        }
    }
}
