//! # Tessera
//!
//! The arithmetic and multiplication core of a computer algebra system.
//!
//! ## Features
//!
//! - **Compact Integers**: Inline two-word integers promoting to `dashu` on overflow
//! - **Kronecker Packing**: Bounded monomials packed into a single `u64`
//! - **Concurrent Accumulation**: Lock-sharded term table shared by all workers
//! - **Fine-Grained Scheduling**: Many small work packages claimed atomically
//!
//! ## Quick Start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! let x = SparsePoly::<CompactInteger>::var(0, 2);
//! let y = SparsePoly::<CompactInteger>::var(1, 2);
//! let sum = SparsePoly::new(x.terms().iter().chain(y.terms()).cloned().collect(), 2);
//!
//! let config = MultiplierConfig::default().with_threads(4);
//! let square = sum.mul_with(&sum, &config).unwrap();
//! assert_eq!(square.coefficient(&[1, 1]), Some(&CompactInteger::new(2)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use tessera_integers as integers;
pub use tessera_poly as poly;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tessera_integers::CompactInteger;
    pub use tessera_poly::{
        Coefficient, ConcurrentTermTable, Monomial, MultiplierConfig, MultiplyError, PackedMonomial,
        PackingMode, PackingScheme, SeriesMultiplier, SparsePoly, WorkScheduler,
    };
}
