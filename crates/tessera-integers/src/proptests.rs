//! Property-based tests for compact integer arithmetic.

#[cfg(test)]
mod tests {
    use dashu::integer::IBig;
    use num_traits::Zero;
    use proptest::prelude::*;

    use crate::CompactInteger;

    // Strategy for values that always stay inline
    fn small_int() -> impl Strategy<Value = i64> {
        -1000i64..1000i64
    }

    // Strategy for values spanning inline, boundary and heap magnitudes
    fn any_magnitude() -> impl Strategy<Value = IBig> {
        (any::<bool>(), proptest::collection::vec(any::<u64>(), 0..=4)).prop_map(
            |(negative, limbs)| {
                let magnitude = limbs
                    .iter()
                    .rev()
                    .fold(IBig::ZERO, |acc, &limb| (acc << 64) + IBig::from(limb));
                if negative {
                    -magnitude
                } else {
                    magnitude
                }
            },
        )
    }

    // Strategy biased towards the two-limb boundary
    fn near_boundary() -> impl Strategy<Value = IBig> {
        (any::<bool>(), 0u32..8, any::<u64>()).prop_map(|(negative, below, jitter)| {
            let edge = (IBig::from(1u8) << 128) - IBig::from(below) - IBig::from(jitter % 4);
            if negative {
                -edge
            } else {
                edge
            }
        })
    }

    fn operand() -> impl Strategy<Value = IBig> {
        prop_oneof![any_magnitude(), near_boundary()]
    }

    fn is_canonical(x: &CompactInteger) -> bool {
        x.is_inline() == (x.bit_len() <= crate::integer::INLINE_BITS)
    }

    proptest! {
        // Integer ring axioms

        #[test]
        fn integer_add_commutative(a in small_int(), b in small_int()) {
            let a = CompactInteger::new(a);
            let b = CompactInteger::new(b);
            prop_assert_eq!(&a + &b, &b + &a);
        }

        #[test]
        fn integer_mul_associative(a in operand(), b in operand(), c in operand()) {
            let a = CompactInteger::from(a);
            let b = CompactInteger::from(b);
            let c = CompactInteger::from(c);
            prop_assert_eq!(&(&a * &b) * &c, &a * &(&b * &c));
        }

        #[test]
        fn integer_distributive(a in operand(), b in operand(), c in operand()) {
            let a = CompactInteger::from(a);
            let b = CompactInteger::from(b);
            let c = CompactInteger::from(c);
            prop_assert_eq!(&a * &(&b + &c), &(&a * &b) + &(&a * &c));
        }

        #[test]
        fn integer_additive_inverse(a in operand()) {
            let a = CompactInteger::from(a);
            let sum = &a + &(-&a);
            prop_assert!(sum.is_zero());
            prop_assert!(sum.is_inline());
        }

        // Agreement with the unbounded reference, all storage combinations

        #[test]
        fn add_matches_reference(a in operand(), b in operand()) {
            let sum = CompactInteger::from(a.clone()) + CompactInteger::from(b.clone());
            prop_assert_eq!(sum.to_ibig(), &a + &b);
            prop_assert!(is_canonical(&sum));
        }

        #[test]
        fn sub_matches_reference(a in operand(), b in operand()) {
            let diff = CompactInteger::from(a.clone()) - CompactInteger::from(b.clone());
            prop_assert_eq!(diff.to_ibig(), &a - &b);
            prop_assert!(is_canonical(&diff));
        }

        #[test]
        fn mul_matches_reference(a in operand(), b in operand()) {
            let prod = CompactInteger::from(a.clone()) * CompactInteger::from(b.clone());
            prop_assert_eq!(prod.to_ibig(), &a * &b);
            prop_assert!(is_canonical(&prod));
        }

        #[test]
        fn add_mul_matches_reference(acc in operand(), a in operand(), b in operand()) {
            let mut x = CompactInteger::from(acc.clone());
            x.add_mul(&CompactInteger::from(a.clone()), &CompactInteger::from(b.clone()));
            prop_assert_eq!(x.to_ibig(), acc + &a * &b);
            prop_assert!(is_canonical(&x));
        }

        #[test]
        fn ordering_matches_reference(a in operand(), b in operand()) {
            let ca = CompactInteger::from(a.clone());
            let cb = CompactInteger::from(b.clone());
            prop_assert_eq!(ca.cmp(&cb), a.cmp(&b));
            prop_assert_eq!(ca == cb, a == b);
        }

        #[test]
        fn display_matches_reference(a in operand()) {
            prop_assert_eq!(CompactInteger::from(a.clone()).to_string(), a.to_string());
        }

        #[test]
        fn equal_values_hash_equal(a in operand()) {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};

            // Reach the same value through a heap detour.
            let direct = CompactInteger::from(a.clone());
            let detour = (&direct + &CompactInteger::from(u128::MAX)) - CompactInteger::from(u128::MAX);

            let mut h1 = DefaultHasher::new();
            let mut h2 = DefaultHasher::new();
            direct.hash(&mut h1);
            detour.hash(&mut h2);
            prop_assert_eq!(&direct, &detour);
            prop_assert_eq!(h1.finish(), h2.finish());
        }

        #[test]
        fn native_roundtrip(v in any::<i64>()) {
            prop_assert_eq!(CompactInteger::from(v).to_i64(), Some(v));
        }
    }
}
