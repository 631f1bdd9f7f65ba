//! General exponent-vector monomials.
//!
//! [`Monomial`] is the fallback key of the multiplier when exponents cannot
//! be Kronecker-packed, and the public term representation of
//! [`SparsePoly`](crate::SparsePoly). Exponent vectors of up to
//! [`INLINE_VARS`] variables are stored without allocating.

use smallvec::SmallVec;
use std::fmt;

/// Number of exponents stored inline before spilling to the heap.
pub const INLINE_VARS: usize = 6;

/// A monomial as a vector of `u32` exponents, one per variable.
///
/// Ordering is lexicographic on the exponent vector.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Monomial(SmallVec<[u32; INLINE_VARS]>);

impl Monomial {
    /// Creates the monomial 1 (all exponents zero).
    #[must_use]
    pub fn one(num_vars: usize) -> Self {
        Self(SmallVec::from_elem(0, num_vars))
    }

    /// Creates the monomial x_i.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_vars`.
    #[must_use]
    pub fn var(i: usize, num_vars: usize) -> Self {
        assert!(i < num_vars, "variable index {i} out of range for {num_vars} variables");
        let mut m = Self::one(num_vars);
        m.0[i] = 1;
        m
    }

    /// Creates a monomial from exponents.
    #[must_use]
    pub fn from_exponents(exps: &[u32]) -> Self {
        Self(SmallVec::from_slice(exps))
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.0.len()
    }

    /// Returns the exponent of variable i.
    #[must_use]
    pub fn exponent(&self, i: usize) -> u32 {
        self.0.get(i).copied().unwrap_or(0)
    }

    /// Returns all exponents.
    #[must_use]
    pub fn exponents(&self) -> &[u32] {
        &self.0
    }

    /// Multiplies two monomials (adds exponents).
    ///
    /// Callers guarantee that no exponent sum overflows; the multiplier
    /// validates this once before scheduling any work.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        debug_assert_eq!(self.num_vars(), other.num_vars());
        Self(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }

    /// Multiplies two monomials, returning `None` on exponent overflow.
    #[must_use]
    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        if self.num_vars() != other.num_vars() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_add(*b))
            .collect::<Option<SmallVec<_>>>()
            .map(Self)
    }

    /// Computes the total degree.
    #[must_use]
    pub fn total_degree(&self) -> u64 {
        self.0.iter().map(|&e| u64::from(e)).sum()
    }

    /// Returns true if all exponents are zero.
    #[must_use]
    pub fn is_one(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }
}

impl FromIterator<u32> for Monomial {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&[u32]> for Monomial {
    fn from(exps: &[u32]) -> Self {
        Self::from_exponents(exps)
    }
}

impl<const N: usize> From<[u32; N]> for Monomial {
    fn from(exps: [u32; N]) -> Self {
        Self::from_exponents(&exps)
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const VARS: [char; 6] = ['x', 'y', 'z', 'w', 'u', 'v'];

        let mut first = true;
        for (i, &e) in self.0.iter().enumerate() {
            if e == 0 {
                continue;
            }
            if !first {
                write!(f, "*")?;
            }
            first = false;

            if self.0.len() <= VARS.len() {
                write!(f, "{}", VARS[i])?;
            } else {
                write!(f, "x{i}")?;
            }
            if e > 1 {
                write!(f, "^{e}")?;
            }
        }

        if first {
            write!(f, "1")?;
        }
        Ok(())
    }
}
