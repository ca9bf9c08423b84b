//! Cache Statistics Module
//!
//! Tracks hit/miss counters and per-key event logs, each gated by its own
//! recording flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::clock::Clock;
use crate::models::{EventLog, StatsReport};

// == Stats Recorder ==
/// Accumulates hit/miss statistics.
///
/// Counters only grow and logs are never trimmed; both live as long as the
/// recorder does.
#[derive(Debug)]
pub struct StatsRecorder {
    record_hits: AtomicBool,
    record_misses: AtomicBool,
    clock: Arc<dyn Clock>,
    state: Mutex<StatsReport>,
}

impl StatsRecorder {
    // == Constructor ==
    /// Creates a recorder with all counters at zero.
    pub fn new(clock: Arc<dyn Clock>, record_hits: bool, record_misses: bool) -> Self {
        Self {
            record_hits: AtomicBool::new(record_hits),
            record_misses: AtomicBool::new(record_misses),
            clock,
            state: Mutex::new(StatsReport::default()),
        }
    }

    // == Flags ==
    /// Turns hit recording on or off. Already recorded hits are kept.
    pub fn set_record_hits(&self, enabled: bool) {
        self.record_hits.store(enabled, Ordering::SeqCst);
    }

    /// Turns miss recording on or off. Already recorded misses are kept.
    pub fn set_record_misses(&self, enabled: bool) {
        self.record_misses.store(enabled, Ordering::SeqCst);
    }

    /// Returns whether hits are currently recorded.
    pub fn records_hits(&self) -> bool {
        self.record_hits.load(Ordering::SeqCst)
    }

    /// Returns whether misses are currently recorded.
    pub fn records_misses(&self) -> bool {
        self.record_misses.load(Ordering::SeqCst)
    }

    // == Record Hit ==
    /// Logs a hit on `key` and increments the hit counter.
    ///
    /// Returns whether anything was recorded.
    pub fn record_hit(&self, key: &str) -> bool {
        if !self.records_hits() {
            return false;
        }
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.hit_count += 1;
        state.hit_log.entry(key.to_string()).or_default().push(now);
        true
    }

    // == Record Miss ==
    /// Logs a miss on `key` and increments the miss counter.
    ///
    /// Returns whether anything was recorded.
    pub fn record_miss(&self, key: &str) -> bool {
        if !self.records_misses() {
            return false;
        }
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.miss_count += 1;
        state.miss_log.entry(key.to_string()).or_default().push(now);
        true
    }

    // == Accessors ==
    /// Returns the number of hits recorded so far.
    pub fn hit_count(&self) -> u64 {
        self.state.lock().hit_count
    }

    /// Returns the number of misses recorded so far.
    pub fn miss_count(&self) -> u64 {
        self.state.lock().miss_count
    }

    /// Returns a copy of the hit timestamps, grouped by key.
    pub fn hit_log(&self) -> EventLog {
        self.state.lock().hit_log.clone()
    }

    /// Returns a copy of the miss timestamps, grouped by key.
    pub fn miss_log(&self) -> EventLog {
        self.state.lock().miss_log.clone()
    }

    /// Returns a copy of everything recorded so far.
    pub fn report(&self) -> StatsReport {
        self.state.lock().clone()
    }
}
