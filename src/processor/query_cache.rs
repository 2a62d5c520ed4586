use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::debug;

use crate::processor::results::{
    Heatmap, MonthlyPoint, OverallSummary, RankedEntry, SeriesMode, UniqueCounts,
};

/// Whole-table queries whose answers are worth keeping
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub enum QueryKey {
    OverallSummary,
    UniqueCounts,
    MonthlySeries(SeriesMode),
    TopStartups(usize),
    TopInvestors(usize),
    FundingHeatmap,
}

#[derive(Debug, Clone)]
pub enum CachedResult {
    Summary(OverallSummary),
    UniqueCounts(UniqueCounts),
    Monthly(Vec<MonthlyPoint>),
    RankedAmounts(Vec<RankedEntry<f64>>),
    RankedCounts(Vec<RankedEntry<usize>>),
    Heatmap(Heatmap),
}

/// Conversion between a query's result type and its cache slot
pub trait Cacheable: Clone {
    fn into_cached(self) -> CachedResult;
    fn from_cached(result: CachedResult) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedResult {
                CachedResult::$variant(self)
            }

            fn from_cached(result: CachedResult) -> Option<Self> {
                match result {
                    CachedResult::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(OverallSummary, Summary);
cacheable!(UniqueCounts, UniqueCounts);
cacheable!(Vec<MonthlyPoint>, Monthly);
cacheable!(Vec<RankedEntry<f64>>, RankedAmounts);
cacheable!(Vec<RankedEntry<usize>>, RankedCounts);
cacheable!(Heatmap, Heatmap);

/// LRU of query results shared by every caller of one engine snapshot.
///
/// The dataset behind a snapshot never changes, so entries never go stale.
#[derive(Debug)]
pub struct QueryCache {
    cache: Mutex<LruCache<QueryKey, CachedResult>>,
}

impl QueryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// `None` when `capacity` is 0, meaning caching is off
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        NonZeroUsize::new(capacity).map(Self::new)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<QueryKey, CachedResult>> {
        // entries are whole values, a panic elsewhere cannot leave one half-written
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &QueryKey) -> Option<CachedResult> {
        self.lock().get(key).cloned()
    }

    pub fn put(&self, key: QueryKey, value: CachedResult) {
        self.lock().put(key, value);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached answer for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs without the lock held.
    pub fn get_or_insert_with<T: Cacheable>(&self, key: QueryKey, compute: impl FnOnce() -> T) -> T {
        if let Some(hit) = self.get(&key).and_then(T::from_cached) {
            debug!(?key, "query cache hit");
            return hit;
        }
        let value = compute();
        self.put(key, value.clone().into_cached());
        value
    }
}
