//! In-memory memoization of read query results.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::{QueryResult, SqlParam};

/// Identity of a cached read: exact SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryKey {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Snapshot of cache effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<QueryKey, Arc<QueryResult>>,
    order: VecDeque<QueryKey>,
    capacity: usize,
}

impl CacheInner {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, key: &QueryKey) -> Option<Arc<QueryResult>> {
        self.map.get(key).cloned()
    }

    fn put(&mut self, key: QueryKey, result: Arc<QueryResult>) {
        if self.capacity == 0 {
            return;
        }
        if self.map.insert(key.clone(), result).is_none() {
            self.order.push_back(key);
        }
        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.map.remove(&oldest);
        }
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

/// Thread-safe memo of query results with explicit invalidation.
///
/// Entries never expire on their own; writers call [`QueryCache::invalidate`].
#[derive(Debug, Clone)]
pub struct QueryCache {
    inner: Arc<RwLock<CacheInner>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    generation: Arc<AtomicU64>,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` results (oldest evicted first).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::new(capacity))),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Get a cached result for the key.
    pub fn get(&self, key: &QueryKey) -> Option<Arc<QueryResult>> {
        let store = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        store.get(key)
    }

    /// Return the cached result, or compute and store it.
    ///
    /// The boolean is `true` on a cache hit. Errors from `compute` are returned
    /// as-is and nothing is stored. A result computed while [`QueryCache::invalidate`]
    /// ran is returned but not stored.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: QueryKey,
        compute: impl FnOnce(&QueryKey) -> Result<QueryResult, E>,
    ) -> Result<(Arc<QueryResult>, bool), E> {
        if let Some(result) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((result, true));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let generation = self.generation.load(Ordering::Acquire);
        let result = Arc::new(compute(&key)?);
        let mut store = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) == generation {
            store.put(key, Arc::clone(&result));
        }
        Ok((result, false))
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        let mut store = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        store.clear();
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        let store = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        store.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn result_with(value: i64) -> QueryResult {
        QueryResult {
            columns: Vec::new(),
            rows: vec![vec![serde_json::Value::from(value)]],
            row_count: 1,
            truncated: false,
        }
    }

    fn key(sql: &str) -> QueryKey {
        QueryKey::new(sql, Vec::new())
    }

    #[test]
    fn second_lookup_is_served_from_cache() {
        let cache = QueryCache::new(8);
        let mut computed = 0;

        let (first, hit) = cache
            .get_or_try_insert_with(key("SELECT 1"), |_| {
                computed += 1;
                Ok::<_, Infallible>(result_with(1))
            })
            .expect("compute");
        assert!(!hit);

        let (second, hit) = cache
            .get_or_try_insert_with(key("SELECT 1"), |_| {
                computed += 1;
                Ok::<_, Infallible>(result_with(2))
            })
            .expect("cached");
        assert!(hit);
        assert_eq!(computed, 1);
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn parameters_are_part_of_the_key() {
        let cache = QueryCache::new(8);
        let sql = "SELECT Name FROM providers WHERE City = ?";
        cache
            .get_or_try_insert_with(QueryKey::new(sql, vec![SqlParam::from("Springfield")]), |_| {
                Ok::<_, Infallible>(result_with(1))
            })
            .expect("first city");
        let (_, hit) = cache
            .get_or_try_insert_with(QueryKey::new(sql, vec![SqlParam::from("Shelbyville")]), |_| {
                Ok::<_, Infallible>(result_with(2))
            })
            .expect("second city");

        assert!(!hit);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = QueryCache::new(8);
        let error = cache
            .get_or_try_insert_with(key("SELEC 1"), |_| Err::<QueryResult, _>("syntax error"))
            .expect_err("compute fails");

        assert_eq!(error, "syntax error");
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_clears_all_entries() {
        let cache = QueryCache::new(8);
        for sql in ["SELECT 1", "SELECT 2"] {
            cache
                .get_or_try_insert_with(key(sql), |_| Ok::<_, Infallible>(result_with(1)))
                .expect("insert");
        }
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(&key("SELECT 1")).is_none());
    }

    #[test]
    fn result_computed_across_an_invalidation_is_not_stored() {
        let cache = QueryCache::new(8);
        let writer = cache.clone();

        let (result, hit) = cache
            .get_or_try_insert_with(key("SELECT SUM(Quantity) FROM food_listings"), |_| {
                // A write commits and clears the cache while this read is in flight.
                writer.invalidate();
                Ok::<_, Infallible>(result_with(100))
            })
            .expect("compute");

        assert!(!hit);
        assert_eq!(*result, result_with(100));
        assert!(cache
            .get(&key("SELECT SUM(Quantity) FROM food_listings"))
            .is_none());

        let (_, hit) = cache
            .get_or_try_insert_with(key("SELECT SUM(Quantity) FROM food_listings"), |_| {
                Ok::<_, Infallible>(result_with(107))
            })
            .expect("recompute");
        assert!(!hit);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let cache = QueryCache::new(2);
        for sql in ["SELECT 1", "SELECT 2", "SELECT 3"] {
            cache
                .get_or_try_insert_with(key(sql), |_| Ok::<_, Infallible>(result_with(1)))
                .expect("insert");
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("SELECT 1")).is_none());
        assert!(cache.get(&key("SELECT 3")).is_some());
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = QueryCache::disabled();
        cache
            .get_or_try_insert_with(key("SELECT 1"), |_| Ok::<_, Infallible>(result_with(1)))
            .expect("compute");
        assert!(cache.is_empty());
    }
}
