//! Sparse multivariate polynomials.
//!
//! Terms are stored as `(Monomial, coefficient)` pairs sorted by exponent
//! vector with no monomial repeated.

use std::fmt;

use crate::coefficient::Coefficient;
use crate::error::MultiplyError;
use crate::monomial::Monomial;
use crate::multiply::{max_exponents, MultiplierConfig, SeriesMultiplier};

/// A sparse multivariate polynomial.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SparsePoly<C: Coefficient> {
    /// Terms sorted by exponent vector.
    terms: Vec<(Monomial, C)>,
    /// Number of variables.
    num_vars: usize,
}

impl<C: Coefficient> SparsePoly<C> {
    /// Creates a new polynomial from terms.
    ///
    /// Terms are sorted, like terms are combined and zero terms dropped.
    ///
    /// # Panics
    ///
    /// Panics if a monomial does not have `num_vars` exponents. Use
    /// [`SparsePoly::from_terms`] to get an error instead.
    #[must_use]
    pub fn new(terms: Vec<(Monomial, C)>, num_vars: usize) -> Self {
        assert!(
            terms.iter().all(|(m, _)| m.num_vars() == num_vars),
            "every monomial must have {num_vars} exponents"
        );
        let mut poly = Self { terms, num_vars };
        poly.normalize();
        poly
    }

    /// Creates a new polynomial from terms, checking their arity.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplyError::VariableCountMismatch`] if a monomial does not
    /// have `num_vars` exponents.
    pub fn from_terms(terms: Vec<(Monomial, C)>, num_vars: usize) -> Result<Self, MultiplyError> {
        if let Some((m, _)) = terms.iter().find(|(m, _)| m.num_vars() != num_vars) {
            return Err(MultiplyError::VariableCountMismatch {
                expected: num_vars,
                found: m.num_vars(),
            });
        }
        let mut poly = Self { terms, num_vars };
        poly.normalize();
        Ok(poly)
    }

    /// Wraps terms that are already sorted and unique, keeping zeros.
    pub(crate) fn from_unique_terms(terms: Vec<(Monomial, C)>, num_vars: usize) -> Self {
        debug_assert!(terms.windows(2).all(|w| w[0].0 < w[1].0));
        Self { terms, num_vars }
    }

    /// Creates the zero polynomial.
    #[must_use]
    pub fn zero(num_vars: usize) -> Self {
        Self {
            terms: Vec::new(),
            num_vars,
        }
    }

    /// Creates the constant polynomial 1.
    #[must_use]
    pub fn one(num_vars: usize) -> Self {
        Self::constant(C::one(), num_vars)
    }

    /// Creates a constant polynomial.
    #[must_use]
    pub fn constant(c: C, num_vars: usize) -> Self {
        if c.is_zero() {
            Self::zero(num_vars)
        } else {
            Self {
                terms: vec![(Monomial::one(num_vars), c)],
                num_vars,
            }
        }
    }

    /// Creates a single variable x_i.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_vars`.
    #[must_use]
    pub fn var(i: usize, num_vars: usize) -> Self {
        Self {
            terms: vec![(Monomial::var(i, num_vars), C::one())],
            num_vars,
        }
    }

    /// Returns true if every coefficient is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.terms.iter().all(|(_, c)| c.is_zero())
    }

    /// Returns the number of stored terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if there are no stored terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Returns the terms.
    #[must_use]
    pub fn terms(&self) -> &[(Monomial, C)] {
        &self.terms
    }

    /// Consumes the polynomial, returning its terms.
    #[must_use]
    pub fn into_terms(self) -> Vec<(Monomial, C)> {
        self.terms
    }

    /// Returns the coefficient of the monomial with exponents `exps`.
    #[must_use]
    pub fn coefficient(&self, exps: &[u32]) -> Option<&C> {
        self.terms
            .binary_search_by(|(m, _)| m.exponents().cmp(exps))
            .ok()
            .map(|i| &self.terms[i].1)
    }

    /// Computes the total degree.
    #[must_use]
    pub fn total_degree(&self) -> u64 {
        self.terms
            .iter()
            .map(|(m, _)| m.total_degree())
            .max()
            .unwrap_or(0)
    }

    /// Returns the largest exponent of each variable.
    #[must_use]
    pub fn max_exponents(&self) -> Vec<u32> {
        max_exponents(&self.terms, self.num_vars)
    }

    /// Removes terms whose coefficient is zero.
    pub fn prune_zeros(&mut self) {
        self.terms.retain(|(_, c)| !c.is_zero());
    }

    /// Multiplies two polynomials with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`SparsePoly::mul_with`].
    pub fn mul(&self, other: &Self) -> Result<Self, MultiplyError> {
        self.mul_with(other, &MultiplierConfig::default())
    }

    /// Multiplies two polynomials.
    ///
    /// Coefficients that cancel to zero are kept; call
    /// [`prune_zeros`](Self::prune_zeros) to remove them.
    ///
    /// # Errors
    ///
    /// Returns an error if the operands have different numbers of variables,
    /// if a product exponent overflows, or if the multiplication is cancelled.
    pub fn mul_with(&self, other: &Self, config: &MultiplierConfig) -> Result<Self, MultiplyError> {
        SeriesMultiplier::new(self, other, config.clone())?.run()
    }

    /// Sorts terms and combines like terms.
    fn normalize(&mut self) {
        self.terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut combined: Vec<(Monomial, C)> = Vec::with_capacity(self.terms.len());
        for (m, c) in self.terms.drain(..) {
            match combined.last_mut() {
                Some((last, acc)) if *last == m => acc.add_assign_ref(&c),
                _ => combined.push((m, c)),
            }
        }
        combined.retain(|(_, c)| !c.is_zero());
        self.terms = combined;
    }
}

impl<C: Coefficient + fmt::Display> fmt::Display for SparsePoly<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }

        for (i, (m, c)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            if m.is_one() {
                write!(f, "{c}")?;
            } else {
                write!(f, "{c}*{m}")?;
            }
        }
        Ok(())
    }
}
