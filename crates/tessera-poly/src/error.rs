//! Error types for packing and multiplication.

use thiserror::Error;

use crate::multiply::MultiplierState;

/// Errors raised while building or applying a Kronecker packing scheme.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PackError {
    /// The per-variable widths do not fit in a single key.
    #[error("packing {num_vars} variables needs {required} bits, but keys are {available} bits wide")]
    WidthExceeded {
        /// Number of variables in the scheme.
        num_vars: usize,
        /// Sum of the per-variable widths.
        required: u32,
        /// Width of the packed key.
        available: u32,
    },
    /// An exponent exceeds the bound declared for its variable.
    #[error("exponent {exponent} of variable {var} exceeds its declared bound {bound}")]
    ExponentOutOfBounds {
        /// Index of the offending variable.
        var: usize,
        /// The exponent that was passed in.
        exponent: u32,
        /// The bound declared for the variable.
        bound: u32,
    },
    /// The exponent vector has the wrong number of variables.
    #[error("expected {expected} exponents, found {found}")]
    ArityMismatch {
        /// Number of variables in the scheme.
        expected: usize,
        /// Length of the exponent vector.
        found: usize,
    },
    /// Summing the operand bounds of a variable overflows `u32`.
    #[error("combined exponent bound of variable {var} overflows")]
    BoundOverflow {
        /// Index of the offending variable.
        var: usize,
    },
}

/// Errors raised by the series multiplier.
#[derive(Debug, Error)]
pub enum MultiplyError {
    /// A term or operand does not have the expected number of variables.
    #[error("expected {expected} variables, found {found}")]
    VariableCountMismatch {
        /// Number of variables of the multiplication.
        expected: usize,
        /// Number of variables actually found.
        found: usize,
    },
    /// An exponent of the product does not fit in `u32`.
    #[error("exponent of variable {var} overflows in the product")]
    ExponentOverflow {
        /// Index of the offending variable.
        var: usize,
    },
    /// The number of term pairs does not fit in `usize`.
    #[error("cross product of {lhs} x {rhs} terms is too large to schedule")]
    WorkloadTooLarge {
        /// Number of terms in the left operand.
        lhs: usize,
        /// Number of terms in the right operand.
        rhs: usize,
    },
    /// A stage of the multiplier was driven out of order.
    #[error("invalid multiplier transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// State the multiplier was in.
        from: MultiplierState,
        /// State that was requested.
        to: MultiplierState,
    },
    /// The abort flag was raised before every package was processed.
    #[error("multiplication was cancelled")]
    Cancelled,
    /// Encoding a monomial into a packed key failed.
    #[error(transparent)]
    Pack(#[from] PackError),
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
