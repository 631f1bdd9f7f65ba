//! Multiplier configuration.

use std::num::NonZeroUsize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::scheduler::DEFAULT_PACKAGES_PER_WORKER;

/// Whether the multiplier may use Kronecker-packed keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PackingMode {
    /// Pack whenever the combined exponent bounds fit in a key.
    #[default]
    Auto,
    /// Always use exponent-vector keys.
    Never,
}

/// Configuration for [`SeriesMultiplier`](super::SeriesMultiplier).
#[derive(Clone, Debug)]
pub struct MultiplierConfig {
    /// Number of worker threads (0 = one per available core).
    pub threads: usize,
    /// Work packages per worker thread.
    pub packages_per_thread: usize,
    /// Minimum number of term pairs before worker threads are spawned.
    pub parallel_threshold: usize,
    /// Key representation policy.
    pub packing: PackingMode,
    /// Raised by the caller to stop the multiplication at the next package
    /// boundary.
    pub abort: Option<Arc<AtomicBool>>,
}

impl Default for MultiplierConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            packages_per_thread: DEFAULT_PACKAGES_PER_WORKER,
            parallel_threshold: 4096,
            packing: PackingMode::Auto,
            abort: None,
        }
    }
}

impl MultiplierConfig {
    /// Sets the number of worker threads.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the number of packages per worker.
    #[must_use]
    pub fn with_packages_per_thread(mut self, packages: usize) -> Self {
        self.packages_per_thread = packages;
        self
    }

    /// Sets the minimum number of term pairs for parallel execution.
    #[must_use]
    pub fn with_parallel_threshold(mut self, pairs: usize) -> Self {
        self.parallel_threshold = pairs;
        self
    }

    /// Sets the packing policy.
    #[must_use]
    pub fn with_packing(mut self, packing: PackingMode) -> Self {
        self.packing = packing;
        self
    }

    /// Installs a cancellation flag.
    #[must_use]
    pub fn with_abort_flag(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Returns the number of worker threads to use.
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            self.threads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MultiplierConfig::default();
        assert_eq!(config.packing, PackingMode::Auto);
        assert_eq!(config.packages_per_thread, DEFAULT_PACKAGES_PER_WORKER);
        assert!(config.effective_threads() >= 1);
    }

    #[test]
    fn test_builder() {
        let config = MultiplierConfig::default()
            .with_threads(3)
            .with_parallel_threshold(0)
            .with_packing(PackingMode::Never);
        assert_eq!(config.effective_threads(), 3);
        assert_eq!(config.parallel_threshold, 0);
        assert_eq!(config.packing, PackingMode::Never);
    }
}
