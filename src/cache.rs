//! TTL- and capacity-bounded cache of normalized query results.
//!
//! One coarse mutex guards the whole map for the read-check-then-write
//! sequence; traffic is low and the cache is advisory, not authoritative.
//! Entries are kept past their TTL so a failed refetch can fall back to
//! stale data. Capacity is enforced by evicting the oldest entry on insert.
//!
//! All operations take the current `Instant` from the caller, so tests can
//! drive time without sleeping.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::aggregator::NormalizedVideo;

/// Cache key for one aggregated query: lowercased term, sort order, first
/// upstream page of the fetched window and the page size. All four shape
/// the result set, so all four are part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    term: String,
    order: String,
    page: u32,
    per_page: u32,
}

impl CacheKey {
    pub fn new(term: &str, order: &str, page: u32, per_page: u32) -> Self {
        Self {
            term: term.trim().to_lowercase(),
            order: order.to_string(),
            page,
            per_page,
        }
    }
}

struct Entry {
    inserted_at: Instant,
    videos: Vec<NormalizedVideo>,
    total: u64,
}

pub struct QueryCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl QueryCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Entry younger than the freshness window, if any.
    pub fn get_fresh(&self, key: &CacheKey, now: Instant) -> Option<(Vec<NormalizedVideo>, u64)> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        if now.duration_since(entry.inserted_at) < self.ttl {
            Some((entry.videos.clone(), entry.total))
        } else {
            None
        }
    }

    /// Entry regardless of age. Used as a fallback when a refetch fails
    /// entirely: stale results beat an empty grid.
    pub fn get_any(&self, key: &CacheKey) -> Option<(Vec<NormalizedVideo>, u64)> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|entry| (entry.videos.clone(), entry.total))
    }

    /// Overwrite the entry for `key` with a fresh timestamp. When the map is
    /// full and `key` is new, the oldest entry is evicted first.
    pub fn insert(&self, key: CacheKey, videos: Vec<NormalizedVideo>, total: u64, now: Instant) {
        let mut entries = self.entries.lock().unwrap();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            Entry {
                inserted_at: now,
                videos,
                total,
            },
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
