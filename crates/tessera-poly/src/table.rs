//! Concurrent term accumulation.
//!
//! [`ConcurrentTermTable`] maps monomial keys to coefficients. Buckets are
//! selected from the high bits of an Fx hash of the key and each bucket is
//! guarded by its own lock, so workers updating unrelated buckets never touch
//! the same cache line. A bucket holding at most one term stores it inline;
//! only a collision between two distinct keys allocates.
//!
//! Accumulation is purely additive. Terms that cancel to zero stay in the
//! table; removing them is left to the caller.

use parking_lot::lock_api::{Mutex, RawMutex};
use rustc_hash::FxHasher;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

use crate::coefficient::Coefficient;
use crate::sync::RawSpinLock;

/// The default hasher of the term table.
pub type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Contents of one bucket.
enum Slot<K, C> {
    Empty,
    One(K, C),
    Many(Vec<(K, C)>),
}

impl<K, C> Default for Slot<K, C> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<K: Eq, C> Slot<K, C> {
    fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(..) => 1,
            Self::Many(entries) => entries.len(),
        }
    }

    /// Applies `hit` to the coefficient stored under `key`, or inserts the
    /// coefficient produced by `miss`.
    fn accumulate<V>(&mut self, key: K, value: V, hit: impl FnOnce(&mut C, V), miss: impl FnOnce(V) -> C) {
        match self {
            Self::Empty => *self = Self::One(key, miss(value)),
            Self::One(existing, coeff) if *existing == key => hit(coeff, value),
            Self::One(..) => {
                if let Self::One(k, c) = std::mem::take(self) {
                    *self = Self::Many(vec![(k, c), (key, miss(value))]);
                }
            }
            Self::Many(entries) => match entries.iter().position(|(k, _)| *k == key) {
                Some(i) => hit(&mut entries[i].1, value),
                None => entries.push((key, miss(value))),
            },
        }
    }

    fn get(&self, key: &K) -> Option<&C> {
        match self {
            Self::Empty => None,
            Self::One(k, c) => (k == key).then_some(c),
            Self::Many(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, c)| c),
        }
    }

    fn drain_into(self, out: &mut Vec<(K, C)>) {
        match self {
            Self::Empty => {}
            Self::One(k, c) => out.push((k, c)),
            Self::Many(entries) => out.extend(entries),
        }
    }
}

/// Bucket occupancy statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Occupancy {
    /// Buckets holding no term.
    pub empty: usize,
    /// Buckets holding exactly one term (no allocation).
    pub single: usize,
    /// Buckets that spilled to a vector.
    pub multi: usize,
    /// Largest number of terms in one bucket.
    pub longest: usize,
}

/// A lock-sharded hash table accumulating `(key, coefficient)` pairs.
///
/// `upsert` may be called from any number of threads at once. Operations that
/// restructure the table (`drain`, `rehash`) take `&mut self` and therefore
/// only run once all workers are done.
pub struct ConcurrentTermTable<K, C, L: RawMutex = RawSpinLock, S = FxBuildHasher> {
    buckets: Box<[Mutex<L, Slot<K, C>>]>,
    /// Right shift selecting the top `log2(buckets)` bits of a hash.
    shift: u32,
    hasher: S,
}

impl<K: Eq + Hash, C: Coefficient> ConcurrentTermTable<K, C> {
    /// Creates a table with at least `count` buckets, rounded up to a power
    /// of two.
    #[must_use]
    pub fn with_buckets(count: usize) -> Self {
        Self::with_buckets_and_hasher(count, FxBuildHasher::default())
    }

    /// Creates a table sized for about `expected_terms` distinct keys.
    #[must_use]
    pub fn with_capacity(expected_terms: usize) -> Self {
        Self::with_buckets(expected_terms)
    }
}

fn make_buckets<K, C, L: RawMutex>(count: usize) -> (Box<[Mutex<L, Slot<K, C>>]>, u32) {
    let count = count.max(1).next_power_of_two();
    let buckets = (0..count).map(|_| Mutex::new(Slot::Empty)).collect();
    (buckets, u64::BITS - count.trailing_zeros())
}

impl<K, C, L, S> ConcurrentTermTable<K, C, L, S>
where
    K: Eq + Hash,
    C: Coefficient,
    L: RawMutex,
    S: BuildHasher,
{
    /// Creates a table with at least `count` buckets using the given hasher.
    pub fn with_buckets_and_hasher(count: usize, hasher: S) -> Self {
        let (buckets, shift) = make_buckets(count);
        Self {
            buckets,
            shift,
            hasher,
        }
    }

    #[inline]
    fn bucket_index(&self, key: &K) -> usize {
        let hash = self.hasher.hash_one(key);
        // The high bits of a multiplicative hash are the well-mixed ones.
        #[allow(clippy::cast_possible_truncation)]
        let index = hash.checked_shr(self.shift).unwrap_or(0) as usize;
        index
    }

    /// Returns the number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Adds `coeff` to the entry for `key`, inserting it if absent.
    pub fn upsert(&self, key: K, coeff: C) {
        let index = self.bucket_index(&key);
        self.buckets[index]
            .lock()
            .accumulate(key, coeff, |c, v| c.add_assign_ref(&v), |v| v);
    }

    /// Adds `a * b` to the entry for `key`, inserting it if absent.
    ///
    /// When `key` is already present the product is accumulated in place.
    pub fn upsert_product(&self, key: K, a: &C, b: &C) {
        let index = self.bucket_index(&key);
        self.buckets[index].lock().accumulate(
            key,
            (a, b),
            |c, (a, b)| c.add_mul(a, b),
            |(a, b)| C::mul_ref(a, b),
        );
    }

    /// Returns a copy of the coefficient stored under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<C> {
        let index = self.bucket_index(key);
        self.buckets[index].lock().get(key).cloned()
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.lock().len()).sum()
    }

    /// Returns true if no key is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.lock().len() == 0)
    }

    /// Returns the ratio of stored keys to buckets.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.bucket_count() as f64
    }

    /// Collects bucket occupancy statistics.
    #[must_use]
    pub fn occupancy(&self) -> Occupancy {
        let mut stats = Occupancy::default();
        for bucket in self.buckets.iter() {
            let n = bucket.lock().len();
            match n {
                0 => stats.empty += 1,
                1 => stats.single += 1,
                _ => stats.multi += 1,
            }
            stats.longest = stats.longest.max(n);
        }
        stats
    }

    /// Removes and returns every entry, zero coefficients included.
    ///
    /// The order of the returned entries is unspecified.
    pub fn drain(&mut self) -> Vec<(K, C)> {
        let mut out = Vec::new();
        for bucket in self.buckets.iter_mut() {
            std::mem::take(bucket.get_mut()).drain_into(&mut out);
        }
        out
    }

    /// Consumes the table, returning every entry.
    #[must_use]
    pub fn into_terms(mut self) -> Vec<(K, C)> {
        self.drain()
    }

    /// Redistributes all entries over at least `count` buckets.
    pub fn rehash(&mut self, count: usize) {
        let entries = self.drain();
        let (buckets, shift) = make_buckets(count);
        self.buckets = buckets;
        self.shift = shift;
        for (key, coeff) in entries {
            let index = self.bucket_index(&key);
            // Keys are already unique, so this never merges.
            self.buckets[index]
                .get_mut()
                .accumulate(key, coeff, |c, v| c.add_assign_ref(&v), |v| v);
        }
    }
}
