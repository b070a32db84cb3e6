// Time-based expiring key/value cache.
//
// Entries are checked lazily on read; there is no background sweep and no
// capacity bound. Timestamps come from `tokio::time::Instant` so a paused
// test clock drives expiry.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// TTL for data that rarely changes (completed seasons, career histories).
pub const LONG_TTL: Duration = Duration::from_secs(30 * 60);

/// TTL for data that changes during a live season.
pub const SHORT_TTL: Duration = Duration::from_secs(5 * 60);

/// Join key parts with `-`: `cache_key!(player_id, season, group)` gives
/// `"592450-2024-hitting"`.
#[macro_export]
macro_rules! cache_key {
    ($($part:expr),+ $(,)?) => {
        [$(::std::string::ToString::to_string(&$part)),+].join("-")
    };
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// String-keyed cache whose entries are fresh for `ttl` after insertion.
#[derive(Debug, Clone)]
pub struct ExpiringCache<V> {
    ttl: Duration,
    entries: HashMap<String, Entry<V>>,
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new(ttl: Duration) -> Self {
        ExpiringCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Thirty-minute cache.
    pub fn long() -> Self {
        Self::new(LONG_TTL)
    }

    /// Five-minute cache.
    pub fn short() -> Self {
        Self::new(SHORT_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True if `key` holds a fresh entry. An expired entry is evicted.
    pub fn has(&mut self, key: &str) -> bool {
        self.fresh(key).is_some()
    }

    /// The value under `key` if it is still fresh. An expired entry is
    /// evicted.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let value = self.fresh(key).map(|entry| entry.value.clone());
        debug!(key, hit = value.is_some(), "cache lookup");
        value
    }

    /// Store `value` under `key`, replacing any previous entry and resetting
    /// its age.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh(&mut self, key: &str) -> Option<&Entry<V>> {
        let expired = self.entries.get(key)?.inserted_at.elapsed() > self.ttl;
        if expired {
            debug!(key, "evicting expired cache entry");
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
