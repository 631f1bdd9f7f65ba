//! Property-based tests for packing and multiplication.

#[cfg(test)]
mod tests {
    use dashu::integer::IBig;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use tessera_integers::CompactInteger;

    use crate::{Monomial, MultiplierConfig, PackingMode, PackingScheme, SparsePoly};

    // Strategy for per-variable bounds together with a vector inside them
    fn bounded_exponents() -> impl Strategy<Value = (Vec<u32>, Vec<u32>)> {
        proptest::collection::vec(0u32..=1000, 1..=4).prop_flat_map(|bounds| {
            let exps: Vec<_> = bounds.iter().map(|&b| 0..=b).collect();
            (Just(bounds), exps)
        })
    }

    // Strategy for coefficients, mostly small with occasional heap values
    fn coeff() -> impl Strategy<Value = CompactInteger> {
        prop_oneof![
            4 => (-50i64..50).prop_map(CompactInteger::new),
            1 => any::<i128>().prop_map(|v| CompactInteger::from(v) * CompactInteger::from(v)),
        ]
    }

    // Strategy for small sparse polynomials in `num_vars` variables
    fn sparse_poly(num_vars: usize) -> impl Strategy<Value = SparsePoly<CompactInteger>> {
        proptest::collection::vec(
            (proptest::collection::vec(0u32..6, num_vars), coeff()),
            0..12,
        )
        .prop_map(move |terms| {
            SparsePoly::new(
                terms
                    .into_iter()
                    .map(|(e, c)| (Monomial::from_exponents(&e), c))
                    .collect(),
                num_vars,
            )
        })
    }

    fn poly_pair() -> impl Strategy<Value = (SparsePoly<CompactInteger>, SparsePoly<CompactInteger>)> {
        (1usize..=3).prop_flat_map(|n| (sparse_poly(n), sparse_poly(n)))
    }

    // Single-threaded product over IBig
    fn reference(a: &SparsePoly<CompactInteger>, b: &SparsePoly<CompactInteger>) -> BTreeMap<Vec<u32>, IBig> {
        let mut out: BTreeMap<Vec<u32>, IBig> = BTreeMap::new();
        for (ma, ca) in a.terms() {
            for (mb, cb) in b.terms() {
                let key = ma.mul(mb).exponents().to_vec();
                *out.entry(key).or_insert(IBig::ZERO) += ca.to_ibig() * cb.to_ibig();
            }
        }
        out.retain(|_, c| *c != IBig::ZERO);
        out
    }

    fn as_map(poly: &SparsePoly<CompactInteger>) -> BTreeMap<Vec<u32>, IBig> {
        poly.terms()
            .iter()
            .map(|(m, c)| (m.exponents().to_vec(), c.to_ibig()))
            .collect()
    }

    proptest! {
        #[test]
        fn pack_roundtrip((bounds, exps) in bounded_exponents()) {
            let scheme = PackingScheme::new(&bounds).unwrap();
            let key = scheme.pack(&exps).unwrap();
            let unpacked = scheme.unpack(key);
            prop_assert_eq!(unpacked.exponents(), exps.as_slice());
        }

        #[test]
        fn pack_is_homomorphic(
            (bounds, a) in bounded_exponents(),
            seed in proptest::collection::vec(any::<u32>(), 4),
        ) {
            let b: Vec<u32> = bounds.iter().zip(&seed).map(|(&bound, &s)| s % (bound + 1)).collect();
            let scheme = PackingScheme::for_product(&bounds, &bounds).unwrap();
            let product = scheme.pack(&a).unwrap().multiply(scheme.pack(&b).unwrap());
            let expected: Vec<u32> = a.iter().zip(&b).map(|(x, y)| x + y).collect();
            let unpacked = scheme.unpack(product);
            prop_assert_eq!(unpacked.exponents(), expected.as_slice());
        }

        #[test]
        fn product_matches_reference((a, b) in poly_pair()) {
            let config = MultiplierConfig::default().with_threads(4).with_parallel_threshold(0);
            let mut product = a.mul_with(&b, &config).unwrap();
            product.prune_zeros();
            prop_assert_eq!(as_map(&product), reference(&a, &b));
        }

        #[test]
        fn packed_and_general_paths_agree((a, b) in poly_pair()) {
            let packed = a.mul(&b).unwrap();
            let general = a
                .mul_with(&b, &MultiplierConfig::default().with_packing(PackingMode::Never))
                .unwrap();
            prop_assert_eq!(packed, general);
        }

        #[test]
        fn product_is_sorted_and_unique((a, b) in poly_pair()) {
            let product = a.mul(&b).unwrap();
            prop_assert!(product.terms().windows(2).all(|w| w[0].0 < w[1].0));
        }

        #[test]
        fn mul_commutative((a, b) in poly_pair()) {
            let mut ab = a.mul(&b).unwrap();
            let mut ba = b.mul(&a).unwrap();
            ab.prune_zeros();
            ba.prune_zeros();
            prop_assert_eq!(ab, ba);
        }
    }
}
