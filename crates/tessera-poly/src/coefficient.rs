//! Coefficient types accepted by the multiplier.

use dashu::integer::IBig;
use tessera_integers::CompactInteger;

/// A coefficient ring element that can be accumulated concurrently.
///
/// Addition must be commutative and associative: the multiplier merges
/// partial products in an unspecified order.
pub trait Coefficient: Clone + Send + Sync {
    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Returns true if this is the additive identity.
    fn is_zero(&self) -> bool;

    /// Computes `self += other`.
    fn add_assign_ref(&mut self, other: &Self);

    /// Computes `a * b`.
    fn mul_ref(a: &Self, b: &Self) -> Self;

    /// Computes `self += a * b`.
    fn add_mul(&mut self, a: &Self, b: &Self) {
        let product = Self::mul_ref(a, b);
        self.add_assign_ref(&product);
    }
}

impl Coefficient for CompactInteger {
    fn zero() -> Self {
        <Self as num_traits::Zero>::zero()
    }

    fn one() -> Self {
        <Self as num_traits::One>::one()
    }

    fn is_zero(&self) -> bool {
        num_traits::Zero::is_zero(self)
    }

    fn add_assign_ref(&mut self, other: &Self) {
        *self += other;
    }

    fn mul_ref(a: &Self, b: &Self) -> Self {
        a * b
    }

    fn add_mul(&mut self, a: &Self, b: &Self) {
        CompactInteger::add_mul(self, a, b);
    }
}

impl Coefficient for IBig {
    fn zero() -> Self {
        IBig::ZERO
    }

    fn one() -> Self {
        IBig::ONE
    }

    fn is_zero(&self) -> bool {
        *self == IBig::ZERO
    }

    fn add_assign_ref(&mut self, other: &Self) {
        *self += other;
    }

    fn mul_ref(a: &Self, b: &Self) -> Self {
        a * b
    }
}
