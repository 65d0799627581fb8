use proptest::prelude::*;

use commons_types::{BasisPoints, Timestamp, BPS_DENOMINATOR};

proptest! {
    /// Applying a percentage never yields more than the input amount.
    #[test]
    fn apply_never_exceeds_amount(
        raw in 0u32..=BPS_DENOMINATOR,
        amount in 0u128..1_000_000_000_000_000_000_000,
    ) {
        let bps = BasisPoints::new(raw).unwrap();
        let applied = bps.apply(amount).unwrap();
        prop_assert!(applied <= amount);
    }

    /// Truncating ratio matches the integer definition exactly.
    #[test]
    fn ratio_matches_integer_division(
        part in 0u128..1_000_000_000_000,
        whole in 1u128..1_000_000_000_000,
    ) {
        let ratio = BasisPoints::ratio(part, whole).unwrap();
        prop_assert_eq!(ratio, part * 10_000 / whole);
        prop_assert!(ratio * whole <= part * 10_000);
    }

    /// A threshold is met iff the truncated ratio reaches it.
    #[test]
    fn is_met_by_is_monotonic_in_part(
        raw in 0u32..=BPS_DENOMINATOR,
        part in 0u128..1_000_000,
        whole in 1u128..1_000_000,
    ) {
        let bps = BasisPoints::new(raw).unwrap();
        if bps.is_met_by(part, whole) {
            prop_assert!(bps.is_met_by(part + 1, whole));
        }
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// has_expired agrees with saturating addition.
    #[test]
    fn has_expired_matches_deadline(start in 0u64..1_000_000, dur in 0u64..1_000_000, now in 0u64..3_000_000) {
        let ts = Timestamp::new(start);
        prop_assert_eq!(ts.has_expired(dur, Timestamp::new(now)), now >= start + dur);
    }
}
