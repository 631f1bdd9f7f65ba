//! Key representations for the multiplier.
//!
//! Both paths share the scheduler and the term table; they differ only in
//! the key type and in how two keys multiply.

use std::hash::Hash;

use crate::error::PackError;
use crate::monomial::Monomial;
use crate::packing::{PackedMonomial, PackingScheme};

/// How monomials are keyed while a product is accumulated.
pub trait KeyStrategy: Sync {
    /// The hash key stored in the term table.
    type Key: Clone + Eq + Hash + Send + Sync;

    /// Encodes an input monomial.
    ///
    /// # Errors
    ///
    /// Returns an error if the monomial cannot be represented.
    fn encode(&self, monomial: &Monomial) -> Result<Self::Key, PackError>;

    /// Multiplies two keys.
    fn multiply(&self, a: &Self::Key, b: &Self::Key) -> Self::Key;

    /// Decodes a key back into an exponent vector.
    fn decode(&self, key: &Self::Key) -> Monomial;
}

/// Kronecker-packed `u64` keys; multiplication is integer addition.
#[derive(Clone, Debug)]
pub struct PackedStrategy {
    scheme: PackingScheme,
}

impl PackedStrategy {
    /// Wraps a scheme whose bounds cover every product exponent.
    #[must_use]
    pub fn new(scheme: PackingScheme) -> Self {
        Self { scheme }
    }

    /// Returns the packing scheme.
    #[must_use]
    pub fn scheme(&self) -> &PackingScheme {
        &self.scheme
    }
}

impl KeyStrategy for PackedStrategy {
    type Key = PackedMonomial;

    fn encode(&self, monomial: &Monomial) -> Result<PackedMonomial, PackError> {
        self.scheme.pack_monomial(monomial)
    }

    #[inline]
    fn multiply(&self, a: &PackedMonomial, b: &PackedMonomial) -> PackedMonomial {
        a.multiply(*b)
    }

    fn decode(&self, key: &PackedMonomial) -> Monomial {
        self.scheme.unpack(*key)
    }
}

/// Exponent-vector keys; multiplication adds exponents elementwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct VectorStrategy;

impl KeyStrategy for VectorStrategy {
    type Key = Monomial;

    fn encode(&self, monomial: &Monomial) -> Result<Monomial, PackError> {
        Ok(monomial.clone())
    }

    #[inline]
    fn multiply(&self, a: &Monomial, b: &Monomial) -> Monomial {
        a.mul(b)
    }

    fn decode(&self, key: &Monomial) -> Monomial {
        key.clone()
    }
}
