//! In-process cache backend for local development and tests.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::backend::{CacheBackend, CacheBackendError};

/// Longest TTL honoured; larger values are clamped.
const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// A `DashMap` of entries with per-entry expiry. Expired entries are
/// dropped lazily on access and during pattern sweeps.
#[derive(Default)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, Entry>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` holds a live entry.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|e| e.expires_at > now)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheBackendError> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .and_then(|e| (e.expires_at > now).then(|| e.value.clone()));

        if live.is_none() {
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        Ok(live)
    }

    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<(), CacheBackendError> {
        let entry = Entry {
            value: value.to_vec(),
            expires_at: Instant::now() + Duration::from_secs(ttl_secs.min(MAX_TTL_SECS)),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheBackendError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, e)| e.expires_at > now))
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheBackendError> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| CacheBackendError::Command(format!("Invalid pattern '{pattern}': {e}")))?;
        let now = Instant::now();
        let mut deleted = 0u64;

        self.entries.retain(|key, entry| {
            if entry.expires_at <= now {
                return false;
            }
            if matcher.matches(key) {
                deleted += 1;
                return false;
            }
            true
        });

        Ok(deleted)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
