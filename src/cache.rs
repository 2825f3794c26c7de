//! TTL cache for computed query results
//!
//! Keys are built by the caller from the endpoint name and its serialized
//! request. Values are stored type-erased and cloned out on a hit.

use dashmap::DashMap;
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

type Entry = (Instant, Arc<dyn Any + Send + Sync>);

#[derive(Default)]
pub struct QueryCache {
    entries: DashMap<String, Entry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for `scope` and a serializable request
    pub fn key<T: Serialize>(scope: &str, request: &T) -> String {
        match serde_json::to_string(request) {
            Ok(body) => format!("{}:{}", scope, body),
            Err(_) => scope.to_string(),
        }
    }

    /// Fresh entry for `key`; expired entries are dropped
    pub fn get<T: Clone + 'static>(&self, key: &str, ttl: Duration) -> Option<T> {
        {
            let entry = self.entries.get(key)?;
            let (stored_at, value) = entry.value();
            if stored_at.elapsed() < ttl {
                if let Some(hit) = value.downcast_ref::<T>() {
                    debug!("Cache hit: {}", key);
                    return Some(hit.clone());
                }
            }
        }
        self.entries.remove(key);
        None
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: String, value: T) {
        self.entries.insert(key, (Instant::now(), Arc::new(value)));
    }

    /// Cached value for `key`, or compute and store it. A zero TTL disables caching.
    pub fn get_or_try_insert<T, E, F>(&self, key: String, ttl: Duration, compute: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        if ttl.is_zero() {
            return compute();
        }
        if let Some(hit) = self.get(&key, ttl) {
            return Ok(hit);
        }
        let value = compute()?;
        self.purge_expired(ttl);
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drop every entry older than `ttl`
    pub fn purge_expired(&self, ttl: Duration) {
        let before = self.entries.len();
        self.entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!("Purged {} expired cached results", purged);
        }
    }

    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        if count > 0 {
            debug!("Cleared {} cached results", count);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
