//! Bounded TTL cache for retrieval results.
//!
//! Keys combine the query, the index name, and a timestamp bucket, so two
//! identical queries within one TTL window share an entry across callers of
//! the same collection without ever bleeding between collections. Only
//! non-empty result sets are cached.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use moka::sync::Cache;
use tracing::debug;

use lexrag_core::chunk::{hash_text, Chunk};
use lexrag_core::config::RetrievalConfig;

pub struct RetrievalCache {
    cache: Cache<String, Arc<Vec<Chunk>>>,
    ttl_secs: u64,
}

impl RetrievalCache {
    pub fn new(cfg: &RetrievalConfig) -> Self {
        let ttl_secs = cfg.cache_ttl_secs.max(1);
        let cache = Cache::builder()
            .max_capacity(cfg.cache_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self { cache, ttl_secs }
    }

    /// Cache key for a query against a named index, bucketed by TTL window.
    pub fn key(&self, query: &str, index_name: &str) -> String {
        let bucket = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() / self.ttl_secs)
            .unwrap_or(0);
        hash_text(&format!("{query}:{index_name}:{bucket}"))
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<Chunk>>> {
        let hit = self.cache.get(key);
        if hit.is_some() {
            debug!(key, "retrieval cache hit");
        }
        hit
    }

    /// Store a result set. Empty sets are not cached; a later identical
    /// query should get another chance at the providers.
    pub fn put(&self, key: String, docs: Vec<Chunk>) {
        if docs.is_empty() {
            return;
        }
        self.cache.insert(key, Arc::new(docs));
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
