//! Fine-grained work packages claimed on demand.
//!
//! The cross product of two operands is flattened into `0..total` and split
//! into many more packages than there are workers. Each worker repeatedly
//! claims the next unclaimed package with a compare-and-swap until none are
//! left. Per-pair cost varies with coefficient size and threads start at
//! different times; small packages soak up both.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Default number of packages per worker.
pub const DEFAULT_PACKAGES_PER_WORKER: usize = 12;

/// A contiguous range of work units and its claim flag.
#[derive(Debug)]
struct WorkPackage {
    range: Range<usize>,
    claimed: AtomicBool,
}

/// Hands out disjoint ranges of `0..total` to competing workers.
#[derive(Debug)]
pub struct WorkScheduler {
    packages: Box<[WorkPackage]>,
    /// Every package below this index is known to be claimed.
    cursor: AtomicUsize,
}

impl WorkScheduler {
    /// Splits `total` units into `workers * packages_per_worker` packages.
    ///
    /// Fewer packages are made when there are fewer units than that, so no
    /// package is ever empty. Package sizes differ by at most one unit.
    #[must_use]
    pub fn new(total: usize, workers: usize, packages_per_worker: usize) -> Self {
        let wanted = workers.max(1).saturating_mul(packages_per_worker.max(1));
        let count = wanted.min(total);

        let packages: Box<[WorkPackage]> = if count == 0 {
            Box::default()
        } else {
            let base = total / count;
            let extra = total % count;
            let mut start = 0;
            (0..count)
                .map(|i| {
                    let len = base + usize::from(i < extra);
                    let range = start..start + len;
                    start += len;
                    WorkPackage {
                        range,
                        claimed: AtomicBool::new(false),
                    }
                })
                .collect()
        };

        Self {
            packages,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Claims the next unclaimed package.
    ///
    /// Returns `None` once every package has been claimed. Each package is
    /// returned to exactly one caller.
    pub fn claim(&self) -> Option<Range<usize>> {
        let start = self.cursor.load(Ordering::Relaxed);
        for (offset, package) in self.packages[start..].iter().enumerate() {
            if package
                .claimed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                self.cursor.fetch_max(start + offset + 1, Ordering::Relaxed);
                return Some(package.range.clone());
            }
        }
        None
    }

    /// Returns the number of packages.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Returns the number of packages claimed so far.
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.packages
            .iter()
            .filter(|p| p.claimed.load(Ordering::Acquire))
            .count()
    }

    /// Returns true once every package has been claimed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.claimed_count() == self.package_count()
    }

    /// Returns the ranges of all packages, in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.packages.iter().map(|p| p.range.clone())
    }
}
