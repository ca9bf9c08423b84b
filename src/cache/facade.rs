//! Cache Facade
//!
//! The public operation set. Composes the entry store, expiration scheduler
//! and statistics recorder, and routes every removal of an entry (timer,
//! lazy expiry, delete, clear) through one lock so only one remover wins.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::clock::{checked_datetime, to_datetime};
use crate::cache::{
    CacheEntry, Clock, EntryStore, ExpirationScheduler, StatsRecorder, SystemClock,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::args::ExpireHook;
use crate::models::{validate_key, EventLog, GetHooks, KeyMeta, Keys, SetHooks, StatsReport};

/// Everything guarded by the cache lock.
struct State<V> {
    store: EntryStore<V>,
    timers: ExpirationScheduler,
    /// Last generation handed out by `set`
    generation: u64,
}

impl<V> State<V> {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Removal for delete: disarms the key's timer, dropping its expiry hook,
    /// and drops the entry and directory record. Returns whether the key was
    /// present.
    fn remove_entry(&mut self, key: &str) -> bool {
        self.timers.disarm(key);
        self.store.remove(key)
    }

    /// Removal of an entry whose time is up, shared by its timer and by
    /// lazy expiry on read. Only the entry of `generation` is removed, and
    /// only by whoever settles its timer slot first; the winner gets the
    /// expiry hook.
    fn remove_expired(&mut self, key: &str, generation: u64) -> Option<ExpireHook> {
        if self.store.get(key).map(|entry| entry.generation) != Some(generation) {
            return None;
        }
        let on_expire = self.timers.settle(key, generation)?;
        self.store.remove(key);
        Some(on_expire)
    }
}

struct Inner<V> {
    state: Mutex<State<V>>,
    stats: StatsRecorder,
    clock: Arc<dyn Clock>,
    debug: AtomicBool,
}

// == Cache ==
/// In-memory key-value cache with per-entry TTL and hit/miss auditing.
///
/// `Cache` is a cheap handle: clones share the same entries, timers and
/// statistics. Expiration timers run on the Tokio runtime the cache was
/// created in; dropping the last handle cancels them.
///
/// # Example
///
/// ```rust,no_run
/// use varcache::{Cache, CacheConfig};
///
/// #[tokio::main]
/// async fn main() -> varcache::Result<()> {
///     let cache = Cache::with_config(CacheConfig::default().with_record_misses(true))?;
///
///     cache.set("session", "abc".to_string(), 5_000)?;
///     assert_eq!(cache.get("session")?, Some("abc".to_string()));
///     Ok(())
/// }
/// ```
pub struct Cache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Cache")
            .field("keys", &state.store.len())
            .field("pending_timers", &state.timers.len())
            .field("debug", &self.inner.debug.load(Ordering::SeqCst))
            .finish()
    }
}

impl<V: Clone + Send + 'static> Cache<V> {
    // == Constructors ==
    /// Creates a cache with every flag off.
    ///
    /// Fails with [`CacheError::NoRuntime`] outside of a Tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with the given flags and the system clock.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache with the given flags and time source.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let timers = ExpirationScheduler::try_current()?;
        let stats = StatsRecorder::new(clock.clone(), config.record_hits, config.record_misses);

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    store: EntryStore::new(),
                    timers,
                    generation: 0,
                }),
                stats,
                clock,
                debug: AtomicBool::new(config.debug),
            }),
        })
    }

    // == Set ==
    /// Stores `data` under `key` for `ttl` milliseconds (0 = forever).
    pub fn set(&self, key: impl Into<String>, data: V, ttl: u64) -> Result<()> {
        self.set_with(key, data, ttl, SetHooks::new())
    }

    /// Stores `data` under `key`, replacing any previous entry and cancelling
    /// its timer, then arms a new timer when `ttl > 0`.
    ///
    /// `on_set` runs before this returns; `on_expire` runs once when the
    /// entry expires, whether its timer or a `get` notices first. It does not
    /// run if the entry is replaced, deleted or cleared before then.
    pub fn set_with(
        &self,
        key: impl Into<String>,
        data: V,
        ttl: u64,
        hooks: SetHooks<'_, V>,
    ) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        let now_ms = self.inner.clock.now_ms();
        let expires_at = if ttl > 0 {
            now_ms
                .checked_add(ttl)
                .filter(|&at| checked_datetime(at).is_some())
                .ok_or_else(|| {
                    CacheError::InvalidArgument(format!(
                        "TTL of {} ms expires past the last representable date",
                        ttl
                    ))
                })?
        } else {
            0
        };

        if self.debug_enabled() {
            if ttl == 0 {
                info!(key = %key, "Caching forever");
            } else {
                info!(key = %key, ttl, "Caching for {} milliseconds", ttl);
            }
        }

        let SetHooks { on_set, on_expire } = hooks;
        let record = {
            let mut state = self.inner.state.lock();
            state.timers.disarm(&key);

            let generation = state.next_generation();
            if ttl > 0 {
                let cache = Arc::downgrade(&self.inner);
                let timer_key = key.clone();
                let on_expire = on_expire.unwrap_or_else(|| Box::new(|_: &str| {}));
                state.timers.arm(&key, generation, ttl, on_expire, move || {
                    Self::fire(cache, &timer_key, generation);
                });
            }

            let entry = CacheEntry::new(key.clone(), data, ttl, expires_at, generation);
            let stored = state.store.put(entry, to_datetime(now_ms));
            on_set.as_ref().map(|_| stored.to_record())
        };

        if let (Some(hook), Some(record)) = (on_set, record) {
            hook(&record);
        }
        Ok(())
    }

    // == Get ==
    /// Returns the live value for `key`, or `None` on a miss.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        self.get_with(key, GetHooks::new())
    }

    /// Looks up `key`, evicting it first if its expiry time has passed.
    ///
    /// A hit runs `on_hit` and records a hit; an absent or expired entry runs
    /// `on_miss` and records a miss. Evicting an expired entry also runs the
    /// `on_expire` hook it was set with, ahead of `on_miss`.
    pub fn get_with(&self, key: &str, hooks: GetHooks<'_, V>) -> Result<Option<V>> {
        validate_key(key)?;

        if self.debug_enabled() {
            info!(key, "Attempting to fetch cached item");
        }

        let now_ms = self.inner.clock.now_ms();
        let (found, on_expire) = {
            let mut state = self.inner.state.lock();
            match state.store.get(key) {
                Some(entry) if entry.is_expired(now_ms) => {
                    let generation = entry.generation;
                    (None, state.remove_expired(key, generation))
                }
                Some(entry) => (Some(entry.data.clone()), None),
                None => (None, None),
            }
        };

        if let Some(hook) = on_expire {
            if self.debug_enabled() {
                info!(key, "Evicted expired entry on read");
            }
            hook(key);
        }

        let GetHooks { on_hit, on_miss } = hooks;
        match found {
            Some(data) => {
                if let Some(hook) = on_hit {
                    hook(key, &data);
                }
                self.record_hit(key);
                Ok(Some(data))
            }
            None => {
                if let Some(hook) = on_miss {
                    hook(key);
                }
                self.record_miss(key);
                Ok(None)
            }
        }
    }

    // == Delete ==
    /// Deletes a key or a sequence of keys.
    pub fn delete(&self, keys: impl Into<Keys>) -> Result<()> {
        self.delete_with(keys, |_| {})
    }

    /// Deletes a key or a sequence of keys, in order.
    ///
    /// Every key is validated before anything is removed. Each present key
    /// is removed, passed to `on_deleted` and recorded as a hit; each absent
    /// key is recorded as a miss.
    pub fn delete_with(
        &self,
        keys: impl Into<Keys>,
        mut on_deleted: impl FnMut(&str),
    ) -> Result<()> {
        let keys = keys.into();
        keys.validate()?;

        if self.debug_enabled() {
            info!(keys = ?keys, "Attempting to delete keys");
        }

        for key in keys.iter() {
            let removed = self.inner.state.lock().remove_entry(key);
            if removed {
                on_deleted(key);
                self.record_hit(key);
            } else {
                self.record_miss(key);
            }
        }
        Ok(())
    }

    // == Clear ==
    /// Removes every entry and cancels every timer. Statistics are kept.
    pub fn clear(&self) {
        self.clear_with(|| {});
    }

    /// Like [`clear`](Self::clear), then runs `on_cleared`.
    pub fn clear_with(&self, on_cleared: impl FnOnce()) {
        let (keys, timers) = {
            let mut state = self.inner.state.lock();
            let timers = state.timers.disarm_all();
            let keys = state.store.len();
            state.store.remove_all();
            (keys, timers)
        };

        if self.debug_enabled() {
            info!(keys, timers, "Cleared cache");
        }
        on_cleared();
    }

    // == Expiry ==
    /// Runs when a timer fires. Does nothing if the timer was disarmed or
    /// superseded while it was waiting for the lock, or if the cache is gone.
    fn fire(cache: Weak<Inner<V>>, key: &str, generation: u64) {
        let Some(inner) = cache.upgrade() else {
            return;
        };
        Cache { inner }.expire(key, generation);
    }

    fn expire(&self, key: &str, generation: u64) {
        let on_expire = self.inner.state.lock().remove_expired(key, generation);

        let Some(hook) = on_expire else {
            debug!(key, generation, "Ignored stale expiration timer");
            return;
        };

        if self.debug_enabled() {
            info!(key, "Expired entry");
        }
        hook(key);
        self.record_miss(key);
    }
}

impl<V> Cache<V> {
    // == Key Directory ==
    /// Returns a copy of the known keys and their metadata.
    pub fn keys(&self) -> BTreeMap<String, KeyMeta> {
        if self.debug_enabled() {
            info!("Returning keys");
        }
        self.inner.state.lock().store.keys()
    }

    /// Returns the number of known keys.
    pub fn keys_count(&self) -> usize {
        if self.debug_enabled() {
            info!("Returning number of keys");
        }
        self.inner.state.lock().store.len()
    }

    /// Returns whether `key` is currently stored, without touching
    /// statistics or expiring anything.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.state.lock().store.contains(key)
    }

    /// Returns the number of armed expiration timers.
    pub fn pending_timers(&self) -> usize {
        self.inner.state.lock().timers.len()
    }

    // == Statistics ==
    /// Returns the number of recorded hits.
    pub fn hit_count(&self) -> u64 {
        if self.debug_enabled() {
            info!("Returning hit count");
        }
        self.inner.stats.hit_count()
    }

    /// Returns the number of recorded misses.
    pub fn miss_count(&self) -> u64 {
        if self.debug_enabled() {
            info!("Returning miss count");
        }
        self.inner.stats.miss_count()
    }

    /// Returns a copy of the per-key hit timestamps.
    pub fn hit_log(&self) -> EventLog {
        if self.debug_enabled() {
            info!("Returning hit log");
        }
        self.inner.stats.hit_log()
    }

    /// Returns a copy of the per-key miss timestamps.
    pub fn miss_log(&self) -> EventLog {
        if self.debug_enabled() {
            info!("Returning miss log");
        }
        self.inner.stats.miss_log()
    }

    /// Returns a snapshot of all recorded statistics.
    pub fn stats(&self) -> StatsReport {
        if self.debug_enabled() {
            info!("Returning statistics report");
        }
        self.inner.stats.report()
    }

    // == Toggles ==
    /// Turns debug tracing on or off. `None` turns it on.
    pub fn debug(&self, value: impl Into<Option<bool>>) {
        let enabled = value.into().unwrap_or(true);
        self.inner.debug.store(enabled, Ordering::SeqCst);
        if enabled {
            info!("Turned on debug");
        }
    }

    /// Turns hit recording on or off. `None` turns it on.
    pub fn record_hits(&self, value: impl Into<Option<bool>>) {
        let enabled = value.into().unwrap_or(true);
        self.inner.stats.set_record_hits(enabled);
        if self.debug_enabled() {
            info!("Turned {} hit-recording", on_off(enabled));
        }
    }

    /// Turns miss recording on or off. `None` turns it on.
    pub fn record_misses(&self, value: impl Into<Option<bool>>) {
        let enabled = value.into().unwrap_or(true);
        self.inner.stats.set_record_misses(enabled);
        if self.debug_enabled() {
            info!("Turned {} miss-recording", on_off(enabled));
        }
    }

    /// Returns the current flags.
    pub fn config(&self) -> CacheConfig {
        CacheConfig {
            debug: self.debug_enabled(),
            record_hits: self.inner.stats.records_hits(),
            record_misses: self.inner.stats.records_misses(),
        }
    }

    fn debug_enabled(&self) -> bool {
        self.inner.debug.load(Ordering::SeqCst)
    }

    fn record_hit(&self, key: &str) {
        if self.inner.stats.record_hit(key) && self.debug_enabled() {
            info!(key, "Recorded hit");
        }
    }

    fn record_miss(&self, key: &str) {
        if self.inner.stats.record_miss(key) && self.debug_enabled() {
            info!(key, "Recorded miss");
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
