//! Concurrent sparse series multiplication.
//!
//! [`SeriesMultiplier`] computes the product of two term sequences. It first
//! decides once whether every product exponent fits a Kronecker packing; if so
//! monomials are keyed by a packed `u64` and multiplied by integer addition,
//! otherwise they are keyed by their exponent vectors. Either way the cross
//! product is split by a [`WorkScheduler`] and accumulated into a shared
//! [`ConcurrentTermTable`] by a fixed pool of workers.
//!
//! # Example
//!
//! ```
//! use tessera_integers::CompactInteger;
//! use tessera_poly::{Monomial, MultiplierConfig, SeriesMultiplier, SparsePoly};
//!
//! let one_plus_x = SparsePoly::new(
//!     vec![
//!         (Monomial::from([0]), CompactInteger::new(1)),
//!         (Monomial::from([1]), CompactInteger::new(1)),
//!     ],
//!     1,
//! );
//! let mut multiplier =
//!     SeriesMultiplier::new(&one_plus_x, &one_plus_x, MultiplierConfig::default()).unwrap();
//! let square = multiplier.run().unwrap();
//! assert_eq!(square.coefficient(&[1]), Some(&CompactInteger::new(2)));
//! ```

mod config;
mod strategy;

pub use config::{MultiplierConfig, PackingMode};
pub use strategy::{KeyStrategy, PackedStrategy, VectorStrategy};

use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

use crate::coefficient::Coefficient;
use crate::error::MultiplyError;
use crate::monomial::Monomial;
use crate::packing::PackingScheme;
use crate::scheduler::WorkScheduler;
use crate::sparse::SparsePoly;
use crate::table::ConcurrentTermTable;

/// Number of terms sampled from each operand when sizing the table.
const SAMPLE_TERMS: usize = 32;

/// Upper bound on the bucket count chosen up front.
const MAX_INITIAL_BUCKETS: usize = 1 << 22;

/// Progress of a [`SeriesMultiplier`].
///
/// States are visited strictly in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MultiplierState {
    /// Nothing has been computed yet.
    NotStarted,
    /// The key representation has been chosen.
    FeasibilityChecked,
    /// Work packages have been handed to the workers.
    Scheduled,
    /// All workers have finished; the table is being emptied.
    Draining,
    /// The product has been returned.
    Complete,
}

impl MultiplierState {
    /// Returns the state that follows this one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::FeasibilityChecked),
            Self::FeasibilityChecked => Some(Self::Scheduled),
            Self::Scheduled => Some(Self::Draining),
            Self::Draining => Some(Self::Complete),
            Self::Complete => None,
        }
    }
}

/// Key representation selected for one multiplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MultiplicationPath {
    /// Kronecker-packed `u64` keys.
    Packed,
    /// Exponent-vector keys.
    General,
}

/// Multiplies two sparse term sequences on a pool of worker threads.
///
/// The terms of each operand must have exactly `num_vars` exponents. Terms
/// need not be sorted or unique; the product combines like monomials either
/// way.
#[derive(Debug)]
pub struct SeriesMultiplier<'a, C: Coefficient> {
    lhs: &'a [(Monomial, C)],
    rhs: &'a [(Monomial, C)],
    num_vars: usize,
    config: MultiplierConfig,
    state: MultiplierState,
    scheme: Option<PackingScheme>,
}

impl<'a, C: Coefficient> SeriesMultiplier<'a, C> {
    /// Creates a multiplier for `lhs * rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplyError::VariableCountMismatch`] if the operands have
    /// different numbers of variables.
    pub fn new(
        lhs: &'a SparsePoly<C>,
        rhs: &'a SparsePoly<C>,
        config: MultiplierConfig,
    ) -> Result<Self, MultiplyError> {
        if lhs.num_vars() != rhs.num_vars() {
            return Err(MultiplyError::VariableCountMismatch {
                expected: lhs.num_vars(),
                found: rhs.num_vars(),
            });
        }
        Ok(Self::unchecked(lhs.terms(), rhs.terms(), lhs.num_vars(), config))
    }

    /// Creates a multiplier over raw term slices.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplyError::VariableCountMismatch`] if any term does not
    /// have `num_vars` exponents.
    pub fn from_terms(
        lhs: &'a [(Monomial, C)],
        rhs: &'a [(Monomial, C)],
        num_vars: usize,
        config: MultiplierConfig,
    ) -> Result<Self, MultiplyError> {
        if let Some((m, _)) = lhs.iter().chain(rhs).find(|(m, _)| m.num_vars() != num_vars) {
            return Err(MultiplyError::VariableCountMismatch {
                expected: num_vars,
                found: m.num_vars(),
            });
        }
        Ok(Self::unchecked(lhs, rhs, num_vars, config))
    }

    fn unchecked(
        lhs: &'a [(Monomial, C)],
        rhs: &'a [(Monomial, C)],
        num_vars: usize,
        config: MultiplierConfig,
    ) -> Self {
        Self {
            lhs,
            rhs,
            num_vars,
            config,
            state: MultiplierState::NotStarted,
            scheme: None,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> MultiplierState {
        self.state
    }

    /// Returns the selected path, once feasibility has been checked.
    #[must_use]
    pub fn path(&self) -> Option<MultiplicationPath> {
        if self.state == MultiplierState::NotStarted {
            None
        } else if self.scheme.is_some() {
            Some(MultiplicationPath::Packed)
        } else {
            Some(MultiplicationPath::General)
        }
    }

    /// Returns the packing scheme of the packed path.
    #[must_use]
    pub fn scheme(&self) -> Option<&PackingScheme> {
        self.scheme.as_ref()
    }

    fn advance(&mut self, to: MultiplierState) -> Result<(), MultiplyError> {
        if self.state.next() == Some(to) {
            self.state = to;
            Ok(())
        } else {
            Err(MultiplyError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    /// Chooses between the packed and the general path.
    ///
    /// Packing is used when the configuration allows it and the summed
    /// per-variable exponent bounds of both operands fit in one key. Failure
    /// to pack is not an error; the general path is taken instead.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplyError::ExponentOverflow`] if some product exponent
    /// exceeds `u32::MAX`, and [`MultiplyError::InvalidTransition`] if
    /// feasibility was already checked.
    pub fn check_feasibility(&mut self) -> Result<MultiplicationPath, MultiplyError> {
        if self.state != MultiplierState::NotStarted {
            return Err(MultiplyError::InvalidTransition {
                from: self.state,
                to: MultiplierState::FeasibilityChecked,
            });
        }

        let lhs_max = max_exponents(self.lhs, self.num_vars);
        let rhs_max = max_exponents(self.rhs, self.num_vars);
        if let Some(var) = lhs_max
            .iter()
            .zip(&rhs_max)
            .position(|(a, b)| a.checked_add(*b).is_none())
        {
            return Err(MultiplyError::ExponentOverflow { var });
        }
        self.advance(MultiplierState::FeasibilityChecked)?;

        self.scheme = match self.config.packing {
            PackingMode::Never => None,
            PackingMode::Auto => match PackingScheme::for_product(&lhs_max, &rhs_max) {
                Ok(scheme) => Some(scheme),
                Err(err) => {
                    debug!(num_vars = self.num_vars, %err, "packing infeasible, using exponent vectors");
                    None
                }
            },
        };

        let path = if self.scheme.is_some() {
            MultiplicationPath::Packed
        } else {
            MultiplicationPath::General
        };
        debug!(?path, lhs = self.lhs.len(), rhs = self.rhs.len(), "selected multiplication path");
        Ok(path)
    }

    /// Computes the product.
    ///
    /// Feasibility is checked first if that has not happened yet. The
    /// resulting terms are sorted by exponent vector and unique; coefficients
    /// that cancelled to zero are kept.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplyError::Cancelled`] if the abort flag stopped the
    /// workers early, [`MultiplyError::WorkloadTooLarge`] if the number of
    /// term pairs overflows `usize`, [`MultiplyError::ThreadPool`] if the
    /// worker pool cannot be built, and [`MultiplyError::InvalidTransition`]
    /// if the multiplier already ran.
    pub fn run(&mut self) -> Result<SparsePoly<C>, MultiplyError> {
        if self.state == MultiplierState::NotStarted {
            self.check_feasibility()?;
        }

        let terms = match self.scheme.clone() {
            Some(scheme) => self.execute(&PackedStrategy::new(scheme))?,
            None => self.execute(&VectorStrategy)?,
        };

        self.advance(MultiplierState::Complete)?;
        Ok(SparsePoly::from_unique_terms(terms, self.num_vars))
    }

    fn execute<S: KeyStrategy>(&mut self, strategy: &S) -> Result<Vec<(Monomial, C)>, MultiplyError> {
        let (lhs, rhs) = (self.lhs, self.rhs);
        let total = lhs
            .len()
            .checked_mul(rhs.len())
            .ok_or(MultiplyError::WorkloadTooLarge {
                lhs: lhs.len(),
                rhs: rhs.len(),
            })?;

        let lhs_keys = encode_all(strategy, lhs)?;
        let rhs_keys = encode_all(strategy, rhs)?;

        self.advance(MultiplierState::Scheduled)?;

        let threads = if total < self.config.parallel_threshold {
            1
        } else {
            self.config.effective_threads()
        };
        let scheduler = WorkScheduler::new(total, threads, self.config.packages_per_thread);
        let expected = estimate_terms(strategy, &lhs_keys, &rhs_keys);
        let mut table = ConcurrentTermTable::with_capacity(expected.min(MAX_INITIAL_BUCKETS));
        debug!(
            pairs = total,
            threads,
            packages = scheduler.package_count(),
            expected_terms = expected,
            buckets = table.bucket_count(),
            "scheduled multiplication"
        );

        let worker = Worker {
            strategy,
            lhs_keys: &lhs_keys,
            rhs_keys: &rhs_keys,
            lhs,
            rhs,
            scheduler: &scheduler,
            table: &table,
            abort: self.config.abort.as_deref(),
        };

        if threads <= 1 || scheduler.package_count() <= 1 {
            worker.run(0);
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("tessera-mul-{i}"))
                .build()?;
            let worker = &worker;
            pool.scope(|s| {
                for id in 0..threads {
                    s.spawn(move |_| worker.run(id));
                }
            });
        }

        self.advance(MultiplierState::Draining)?;

        let aborted = self
            .config
            .abort
            .as_deref()
            .is_some_and(|flag| flag.load(Ordering::Acquire));
        if aborted && !scheduler.is_exhausted() {
            debug!(
                claimed = scheduler.claimed_count(),
                packages = scheduler.package_count(),
                "multiplication cancelled"
            );
            return Err(MultiplyError::Cancelled);
        }

        trace!(occupancy = ?table.occupancy(), "draining term table");
        let mut terms: Vec<(Monomial, C)> = table
            .drain()
            .into_iter()
            .map(|(key, coeff)| (strategy.decode(&key), coeff))
            .collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Ok(terms)
    }
}

/// Shared, read-only view of one multiplication handed to every worker.
struct Worker<'w, S: KeyStrategy, C> {
    strategy: &'w S,
    lhs_keys: &'w [S::Key],
    rhs_keys: &'w [S::Key],
    lhs: &'w [(Monomial, C)],
    rhs: &'w [(Monomial, C)],
    scheduler: &'w WorkScheduler,
    table: &'w ConcurrentTermTable<S::Key, C>,
    abort: Option<&'w AtomicBool>,
}

impl<S: KeyStrategy, C: Coefficient> Worker<'_, S, C> {
    /// Claims and processes packages until none are left or the abort flag
    /// is raised.
    fn run(&self, id: usize) {
        let width = self.rhs.len();
        let mut packages = 0usize;
        let mut pairs = 0usize;

        loop {
            if self.abort.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                break;
            }
            let Some(range) = self.scheduler.claim() else {
                break;
            };
            packages += 1;
            pairs += range.len();

            // Pair index p covers lhs term p / width and rhs term p % width.
            let (mut i, mut j) = (range.start / width, range.start % width);
            for _ in range {
                let key = self.strategy.multiply(&self.lhs_keys[i], &self.rhs_keys[j]);
                self.table.upsert_product(key, &self.lhs[i].1, &self.rhs[j].1);
                j += 1;
                if j == width {
                    j = 0;
                    i += 1;
                }
            }
        }

        trace!(worker = id, packages, pairs, "worker finished");
    }
}

fn encode_all<S: KeyStrategy, C>(strategy: &S, terms: &[(Monomial, C)]) -> Result<Vec<S::Key>, MultiplyError> {
    terms
        .iter()
        .map(|(m, _)| strategy.encode(m).map_err(MultiplyError::from))
        .collect()
}

/// Returns the largest exponent of each variable over `terms`.
pub(crate) fn max_exponents<C>(terms: &[(Monomial, C)], num_vars: usize) -> Vec<u32> {
    let mut max = vec![0; num_vars];
    for (m, _) in terms {
        for (slot, &e) in max.iter_mut().zip(m.exponents()) {
            *slot = (*slot).max(e);
        }
    }
    max
}

/// Estimates the number of distinct product monomials.
///
/// A strided sample of at most `SAMPLE_TERMS` terms from each side is
/// multiplied out and the ratio of distinct keys is extrapolated to the full
/// cross product.
fn estimate_terms<S: KeyStrategy>(strategy: &S, lhs: &[S::Key], rhs: &[S::Key]) -> usize {
    let total = lhs.len() * rhs.len();
    if total == 0 {
        return 0;
    }

    let lhs_step = lhs.len().div_ceil(SAMPLE_TERMS);
    let rhs_step = rhs.len().div_ceil(SAMPLE_TERMS);
    let mut seen = FxHashSet::default();
    let mut sampled = 0usize;
    for a in lhs.iter().step_by(lhs_step) {
        for b in rhs.iter().step_by(rhs_step) {
            seen.insert(strategy.multiply(a, b));
            sampled += 1;
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
    let scaled = (seen.len() as f64 / sampled as f64 * total as f64) as usize;
    scaled.clamp(lhs.len().max(rhs.len()), total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_integers::CompactInteger;

    fn int(v: i64) -> CompactInteger {
        CompactInteger::new(v)
    }

    fn poly(terms: &[(&[u32], i64)], num_vars: usize) -> SparsePoly<CompactInteger> {
        SparsePoly::new(
            terms.iter().map(|(e, c)| (Monomial::from(*e), int(*c))).collect(),
            num_vars,
        )
    }

    #[test]
    fn test_state_sequence() {
        let p = poly(&[(&[0, 0], 1), (&[1, 0], 1), (&[0, 1], 1)], 2);
        let mut m = SeriesMultiplier::new(&p, &p, MultiplierConfig::default()).unwrap();
        assert_eq!(m.state(), MultiplierState::NotStarted);
        assert_eq!(m.path(), None);

        assert_eq!(m.check_feasibility().unwrap(), MultiplicationPath::Packed);
        assert_eq!(m.state(), MultiplierState::FeasibilityChecked);
        assert!(m.scheme().is_some());

        let product = m.run().unwrap();
        assert_eq!(m.state(), MultiplierState::Complete);
        assert_eq!(product.len(), 6);
        assert_eq!(m.path(), Some(MultiplicationPath::Packed));
    }

    #[test]
    fn test_feasibility_checked_once() {
        let p = poly(&[(&[1], 1)], 1);
        let mut m = SeriesMultiplier::new(&p, &p, MultiplierConfig::default()).unwrap();
        m.check_feasibility().unwrap();
        assert!(matches!(
            m.check_feasibility(),
            Err(MultiplyError::InvalidTransition {
                from: MultiplierState::FeasibilityChecked,
                to: MultiplierState::FeasibilityChecked,
            })
        ));
    }

    #[test]
    fn test_run_twice_is_rejected() {
        let p = poly(&[(&[1], 1)], 1);
        let mut m = SeriesMultiplier::new(&p, &p, MultiplierConfig::default()).unwrap();
        m.run().unwrap();
        assert!(matches!(
            m.run(),
            Err(MultiplyError::InvalidTransition {
                from: MultiplierState::Complete,
                ..
            })
        ));
    }

    #[test]
    fn test_next_has_no_skips() {
        let mut state = MultiplierState::NotStarted;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            seen.push(next);
            state = next;
        }
        assert_eq!(
            seen,
            vec![
                MultiplierState::NotStarted,
                MultiplierState::FeasibilityChecked,
                MultiplierState::Scheduled,
                MultiplierState::Draining,
                MultiplierState::Complete,
            ]
        );
    }

    #[test]
    fn test_general_path_when_packing_disabled() {
        let p = poly(&[(&[3, 1], 2), (&[0, 2], -1)], 2);
        let config = MultiplierConfig::default().with_packing(PackingMode::Never);
        let mut m = SeriesMultiplier::new(&p, &p, config).unwrap();
        assert_eq!(m.check_feasibility().unwrap(), MultiplicationPath::General);

        let product = m.run().unwrap();
        assert_eq!(product.coefficient(&[6, 2]), Some(&int(4)));
        assert_eq!(product.coefficient(&[3, 3]), Some(&int(-4)));
        assert_eq!(product.coefficient(&[0, 4]), Some(&int(1)));
    }

    #[test]
    fn test_from_terms_rejects_wrong_arity() {
        let lhs = vec![(Monomial::from([1, 2]), int(1))];
        let rhs = vec![(Monomial::from([1]), int(1))];
        let err = SeriesMultiplier::from_terms(&lhs, &rhs, 2, MultiplierConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            MultiplyError::VariableCountMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_unsorted_raw_terms_are_combined() {
        let lhs = vec![
            (Monomial::from([1]), int(1)),
            (Monomial::from([0]), int(2)),
            (Monomial::from([1]), int(3)),
        ];
        let rhs = vec![(Monomial::from([1]), int(1))];
        let mut m = SeriesMultiplier::from_terms(&lhs, &rhs, 1, MultiplierConfig::default()).unwrap();
        let product = m.run().unwrap();
        assert_eq!(product.len(), 2);
        assert_eq!(product.coefficient(&[1]), Some(&int(2)));
        assert_eq!(product.coefficient(&[2]), Some(&int(4)));
    }

    #[test]
    fn test_empty_operand() {
        let p = poly(&[(&[1, 1], 1)], 2);
        let zero = SparsePoly::zero(2);
        let config = MultiplierConfig::default().with_threads(4).with_parallel_threshold(0);
        let mut m = SeriesMultiplier::new(&p, &zero, config).unwrap();
        let product = m.run().unwrap();
        assert!(product.is_empty());
        assert_eq!(m.state(), MultiplierState::Complete);
    }

    #[test]
    fn test_estimate_is_clamped() {
        let lhs: Vec<Monomial> = (0..100u32).map(|e| Monomial::from([e])).collect();
        let rhs = lhs.clone();
        let estimate = estimate_terms(&VectorStrategy, &lhs, &rhs);
        // The true count is 199 distinct monomials out of 10000 pairs.
        assert!(estimate >= 100);
        assert!(estimate <= 10_000);
        assert_eq!(estimate_terms(&VectorStrategy, &lhs, &[]), 0);
    }

    #[test]
    fn test_max_exponents() {
        let terms = vec![(Monomial::from([3, 0]), ()), (Monomial::from([1, 7]), ())];
        assert_eq!(max_exponents(&terms, 2), vec![3, 7]);
        assert_eq!(max_exponents::<()>(&[], 3), vec![0, 0, 0]);
    }
}
