//! Kronecker-packed monomials.
//!
//! A [`PackingScheme`] assigns each variable a bit field inside a single
//! `u64`, wide enough to hold every exponent up to the variable's declared
//! bound. Packing is a bijection on exponent vectors within bounds, and it is
//! additive: `pack(a) + pack(b) == pack(a + b)` as long as `a + b` stays
//! within bounds, so monomial multiplication becomes one integer addition.

use smallvec::SmallVec;

use crate::error::PackError;
use crate::monomial::{Monomial, INLINE_VARS};

/// Width of a packed key in bits.
pub const KEY_BITS: u32 = u64::BITS;

/// A monomial packed into a single machine word.
///
/// The layout is only meaningful relative to the [`PackingScheme`] that
/// produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct PackedMonomial(u64);

impl PackedMonomial {
    /// The packed form of the monomial 1 under every scheme.
    pub const ONE: Self = Self(0);

    /// Wraps a raw key.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw packed value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Multiplies two monomials (adds exponents).
    ///
    /// The scheme must bound the exponent sums; otherwise a field carries into
    /// its neighbour.
    #[must_use]
    pub fn multiply(self, other: Self) -> Self {
        // Exponent addition is just integer addition when packed
        Self(self.0 + other.0)
    }
}

/// Returns the smallest field width holding every value in `0..=bound`.
#[inline]
fn width_for(bound: u32) -> u32 {
    u32::BITS - bound.leading_zeros()
}

/// Per-variable bit layout for packing exponent vectors into a `u64`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackingScheme {
    bounds: SmallVec<[u32; INLINE_VARS]>,
    widths: SmallVec<[u32; INLINE_VARS]>,
    offsets: SmallVec<[u32; INLINE_VARS]>,
    total_bits: u32,
}

impl PackingScheme {
    /// Builds a scheme from the maximum exponent of each variable.
    ///
    /// Variable 0 occupies the least significant field.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::WidthExceeded`] if the fields do not fit in
    /// [`KEY_BITS`].
    pub fn new(bounds: &[u32]) -> Result<Self, PackError> {
        let widths: SmallVec<[u32; INLINE_VARS]> = bounds.iter().map(|&b| width_for(b)).collect();
        let required: u64 = widths.iter().map(|&w| u64::from(w)).sum();
        if required > u64::from(KEY_BITS) {
            return Err(PackError::WidthExceeded {
                num_vars: bounds.len(),
                required: u32::try_from(required).unwrap_or(u32::MAX),
                available: KEY_BITS,
            });
        }

        let mut offsets = SmallVec::with_capacity(widths.len());
        let mut offset = 0;
        for &w in &widths {
            offsets.push(offset);
            offset += w;
        }

        Ok(Self {
            bounds: SmallVec::from_slice(bounds),
            widths,
            offsets,
            total_bits: offset,
        })
    }

    /// Builds the scheme for multiplying operands whose exponents are bounded
    /// by `lhs_max` and `rhs_max`.
    ///
    /// Every variable's bound is the sum of both operand bounds, so each
    /// product of packed keys stays within its field.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::ArityMismatch`] if the bound vectors differ in
    /// length, [`PackError::BoundOverflow`] if a bound sum overflows, and
    /// [`PackError::WidthExceeded`] if the summed bounds cannot be packed.
    pub fn for_product(lhs_max: &[u32], rhs_max: &[u32]) -> Result<Self, PackError> {
        if lhs_max.len() != rhs_max.len() {
            return Err(PackError::ArityMismatch {
                expected: lhs_max.len(),
                found: rhs_max.len(),
            });
        }

        let bounds = lhs_max
            .iter()
            .zip(rhs_max)
            .enumerate()
            .map(|(var, (a, b))| a.checked_add(*b).ok_or(PackError::BoundOverflow { var }))
            .collect::<Result<SmallVec<[u32; INLINE_VARS]>, _>>()?;

        Self::new(&bounds)
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.bounds.len()
    }

    /// Returns the declared per-variable bounds.
    #[must_use]
    pub fn bounds(&self) -> &[u32] {
        &self.bounds
    }

    /// Returns the per-variable field widths.
    #[must_use]
    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    /// Returns the number of bits used by all fields together.
    #[must_use]
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// Returns true if `exps` can be packed under this scheme.
    #[must_use]
    pub fn is_packable(&self, exps: &[u32]) -> bool {
        exps.len() == self.num_vars() && exps.iter().zip(&self.bounds).all(|(e, b)| e <= b)
    }

    /// Packs an exponent vector.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::ArityMismatch`] on a wrong variable count and
    /// [`PackError::ExponentOutOfBounds`] if an exponent exceeds its bound.
    pub fn pack(&self, exps: &[u32]) -> Result<PackedMonomial, PackError> {
        if exps.len() != self.num_vars() {
            return Err(PackError::ArityMismatch {
                expected: self.num_vars(),
                found: exps.len(),
            });
        }

        let mut packed = 0u64;
        for (var, ((&e, &bound), &offset)) in exps.iter().zip(&self.bounds).zip(&self.offsets).enumerate() {
            if e > bound {
                return Err(PackError::ExponentOutOfBounds {
                    var,
                    exponent: e,
                    bound,
                });
            }
            // Zero-width fields only ever hold 0 and may sit at offset 64.
            if e != 0 {
                packed |= u64::from(e) << offset;
            }
        }

        Ok(PackedMonomial(packed))
    }

    /// Packs a [`Monomial`].
    ///
    /// # Errors
    ///
    /// See [`PackingScheme::pack`].
    pub fn pack_monomial(&self, monomial: &Monomial) -> Result<PackedMonomial, PackError> {
        self.pack(monomial.exponents())
    }

    /// Returns the exponent of variable `var` in `key`.
    ///
    /// # Panics
    ///
    /// Panics if `var` is out of range.
    #[must_use]
    pub fn exponent(&self, key: PackedMonomial, var: usize) -> u32 {
        let width = self.widths[var];
        if width == 0 {
            return 0;
        }
        let mask = (1u64 << width) - 1;
        #[allow(clippy::cast_possible_truncation)]
        let e = ((key.0 >> self.offsets[var]) & mask) as u32;
        e
    }

    /// Unpacks `key` into `out`.
    ///
    /// Only the first `min(out.len(), num_vars)` slots are written.
    pub fn unpack_into(&self, key: PackedMonomial, out: &mut [u32]) {
        for (var, slot) in out.iter_mut().take(self.num_vars()).enumerate() {
            *slot = self.exponent(key, var);
        }
    }

    /// Unpacks a key into an exponent vector.
    #[must_use]
    pub fn unpack(&self, key: PackedMonomial) -> Monomial {
        (0..self.num_vars()).map(|var| self.exponent(key, var)).collect()
    }

    /// Computes the total degree of a packed key.
    #[must_use]
    pub fn total_degree(&self, key: PackedMonomial) -> u64 {
        (0..self.num_vars())
            .map(|var| u64::from(self.exponent(key, var)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        let scheme = PackingScheme::new(&[0, 1, 2, 7, 8, 100_000]).unwrap();
        assert_eq!(scheme.widths(), &[0, 1, 2, 3, 4, 17]);
        assert_eq!(scheme.total_bits(), 27);
    }

    #[test]
    fn test_roundtrip() {
        let scheme = PackingScheme::new(&[10, 3, 255]).unwrap();
        let key = scheme.pack(&[7, 3, 200]).unwrap();
        assert_eq!(scheme.unpack(key).exponents(), &[7, 3, 200]);
        assert_eq!(scheme.total_degree(key), 210);
    }

    #[test]
    fn test_multiply_is_addition() {
        let scheme = PackingScheme::for_product(&[3, 5], &[4, 2]).unwrap();
        let a = scheme.pack(&[3, 1]).unwrap();
        let b = scheme.pack(&[4, 2]).unwrap();
        assert_eq!(scheme.unpack(a.multiply(b)).exponents(), &[7, 3]);
        assert_eq!(a.multiply(PackedMonomial::ONE), a);
    }

    #[test]
    fn test_unpack_into_any_length() {
        let scheme = PackingScheme::new(&[7, 7]).unwrap();
        let key = scheme.pack(&[3, 5]).unwrap();

        let mut longer = [9u32; 4];
        scheme.unpack_into(key, &mut longer);
        assert_eq!(longer, [3, 5, 9, 9]);

        let mut shorter = [0u32; 1];
        scheme.unpack_into(key, &mut shorter);
        assert_eq!(shorter, [3]);
    }

    #[test]
    fn test_out_of_bounds() {
        let scheme = PackingScheme::new(&[100_000]).unwrap();
        assert_eq!(
            scheme.pack(&[200_000]),
            Err(PackError::ExponentOutOfBounds {
                var: 0,
                exponent: 200_000,
                bound: 100_000
            })
        );
        assert!(!scheme.is_packable(&[200_000]));
        assert!(scheme.is_packable(&[100_000]));
    }

    #[test]
    fn test_width_exceeded() {
        // Four variables of 17 bits each need 68 bits.
        let err = PackingScheme::new(&[100_000; 4]).unwrap_err();
        assert_eq!(
            err,
            PackError::WidthExceeded {
                num_vars: 4,
                required: 68,
                available: 64
            }
        );
    }

    #[test]
    fn test_full_width_with_trailing_zero_field() {
        let scheme = PackingScheme::new(&[u32::MAX, u32::MAX, 0]).unwrap();
        assert_eq!(scheme.total_bits(), 64);
        let key = scheme.pack(&[u32::MAX, 12, 0]).unwrap();
        assert_eq!(scheme.unpack(key).exponents(), &[u32::MAX, 12, 0]);
        assert!(scheme.pack(&[0, 0, 1]).is_err());
    }

    #[test]
    fn test_arity_and_bound_overflow() {
        let scheme = PackingScheme::new(&[1, 1]).unwrap();
        assert_eq!(
            scheme.pack(&[1]),
            Err(PackError::ArityMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            PackingScheme::for_product(&[u32::MAX], &[1]),
            Err(PackError::BoundOverflow { var: 0 })
        );
    }
}
