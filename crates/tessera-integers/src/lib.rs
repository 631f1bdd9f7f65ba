//! # tessera-integers
//!
//! Compact arbitrary precision integers for Tessera.
//!
//! This crate provides [`CompactInteger`], a signed integer that:
//! - Stores magnitudes up to two machine words inline (no allocation)
//! - Promotes transparently to a heap-backed `dashu` integer on overflow
//! - Keeps a canonical form, so equality and hashing are structural
//!
//! ## Performance Notes
//!
//! - Inline/inline arithmetic is double-word schoolbook with explicit
//!   overflow detection
//! - Any operand on the heap defers to `dashu`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod integer;

#[cfg(test)]
mod proptests;

pub use integer::CompactInteger;
