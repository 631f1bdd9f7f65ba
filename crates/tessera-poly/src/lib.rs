//! # tessera-poly
//!
//! Concurrent sparse polynomial multiplication for Tessera.
//!
//! This crate provides:
//! - Exponent-vector monomials and Kronecker-packed `u64` monomials
//! - A lock-sharded hash table accumulating terms from many threads
//! - A scheduler handing out fine-grained work packages
//! - [`SeriesMultiplier`], which combines the above into a parallel product
//!
//! ## Path Selection
//!
//! Before any work is scheduled the multiplier checks once whether every
//! product exponent fits a packing of at most 64 bits:
//! - Fits: keys are packed `u64`s and monomial multiplication is one addition
//! - Does not fit: keys are exponent vectors, multiplied elementwise

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod coefficient;
pub mod error;
pub mod monomial;
pub mod multiply;
pub mod packing;
pub mod scheduler;
pub mod sparse;
pub mod sync;
pub mod table;

#[cfg(test)]
mod proptests;

pub use coefficient::Coefficient;
pub use error::{MultiplyError, PackError};
pub use monomial::Monomial;
pub use multiply::{
    KeyStrategy, MultiplicationPath, MultiplierConfig, MultiplierState, PackedStrategy, PackingMode,
    SeriesMultiplier, VectorStrategy,
};
pub use packing::{PackedMonomial, PackingScheme};
pub use scheduler::WorkScheduler;
pub use sparse::SparsePoly;
pub use sync::RawSpinLock;
pub use table::ConcurrentTermTable;
