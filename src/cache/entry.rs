//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use crate::cache::clock::to_datetime;
use crate::models::CacheRecord;

// == Cache Entry ==
/// Represents a single live cache entry with value and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value, never inspected by the cache
    pub data: V,
    /// Requested lifetime in milliseconds, 0 = no expiration
    pub ttl: u64,
    /// Expiration timestamp (Unix milliseconds), 0 = no expiration
    pub expires_at: u64,
    /// Identity of the `set` call that produced this entry
    pub generation: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `key` - The key to store under
    /// * `data` - The value to store
    /// * `ttl` - TTL in milliseconds, 0 for none
    /// * `expires_at` - Absolute expiry in Unix milliseconds, 0 for none
    /// * `generation` - Identity of the owning `set` call
    pub fn new(key: String, data: V, ttl: u64, expires_at: u64, generation: u64) -> Self {
        Self {
            key,
            data,
            ttl,
            expires_at,
            generation,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time. Entries without a TTL never expire.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at != 0 && self.expires_at <= now_ms
    }
}

impl<V: Clone> CacheEntry<V> {
    /// Snapshot handed to `on_set` hooks.
    pub fn to_record(&self) -> CacheRecord<V> {
        CacheRecord {
            key: self.key.clone(),
            data: self.data.clone(),
            ttl: self.ttl,
            expires_at: self.expires_at,
            expires_on: (self.expires_at != 0).then(|| to_datetime(self.expires_at)),
        }
    }
}
