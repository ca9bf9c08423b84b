//! Entry Store Module
//!
//! Key → entry storage plus the directory of known keys. Pure data: no expiry
//! checks, no timers, no statistics.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::cache::CacheEntry;
use crate::models::KeyMeta;

// == Entry Store ==
/// Source of truth for cached data and per-key metadata.
#[derive(Debug)]
pub struct EntryStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Known keys with creation/modification times
    directory: HashMap<String, KeyMeta>,
}

impl<V> Default for EntryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EntryStore<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            directory: HashMap::new(),
        }
    }

    // == Put ==
    /// Stores a fresh entry, replacing any previous one for the key.
    ///
    /// Only the key's `created_at` survives a replacement; `changed_at` is
    /// moved to `now`.
    pub fn put(&mut self, entry: CacheEntry<V>, now: DateTime<Utc>) -> &CacheEntry<V> {
        let key = entry.key.clone();

        self.directory
            .entry(key.clone())
            .and_modify(|meta| meta.touch(now))
            .or_insert_with(|| KeyMeta::new(key.clone(), now));

        self.entries.insert(key.clone(), entry);
        &self.entries[&key]
    }

    // == Get ==
    /// Looks up an entry without checking expiry.
    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Remove ==
    /// Removes the entry and its directory record.
    ///
    /// Returns whether the key was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let had_meta = self.directory.remove(key).is_some();
        let had_entry = self.entries.remove(key).is_some();
        had_meta || had_entry
    }

    // == Remove All ==
    /// Empties both the entries and the directory.
    pub fn remove_all(&mut self) {
        self.entries.clear();
        self.directory.clear();
    }

    // == Directory Views ==
    /// Returns a copy of the directory ordered by key.
    pub fn keys(&self) -> BTreeMap<String, KeyMeta> {
        self.directory
            .iter()
            .map(|(key, meta)| (key.clone(), meta.clone()))
            .collect()
    }

    /// Returns whether `key` has a stored entry.
    pub fn contains(&self, key: &str) -> bool {
        self.directory.contains_key(key)
    }

    /// Returns the number of known keys.
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }
}
