//! Expiration Scheduler
//!
//! One cancellable Tokio timer per key. Each timer is tagged with the
//! generation of the `set` that armed it so a timer that lost a race with a
//! re-`set`, `delete` or `clear` can tell it is stale. The pending slot also
//! owns the entry's expiry hook; whoever settles the slot gets the hook.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::models::args::ExpireHook;

struct PendingTimer {
    generation: u64,
    handle: AbortHandle,
    on_expire: ExpireHook,
}

impl fmt::Debug for PendingTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTimer")
            .field("generation", &self.generation)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

// == Expiration Scheduler ==
/// Table of pending expiration timers, at most one per key.
///
/// The table is not internally synchronized; the cache keeps it behind the
/// same lock as the entry store so arm/disarm pairs and removals are atomic
/// with respect to each other.
#[derive(Debug)]
pub struct ExpirationScheduler {
    runtime: Handle,
    pending: HashMap<String, PendingTimer>,
}

impl ExpirationScheduler {
    // == Constructor ==
    /// Creates a scheduler that spawns its timers on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: HashMap::new(),
        }
    }

    /// Creates a scheduler on the runtime the caller is running in.
    pub fn try_current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| CacheError::NoRuntime)
    }

    // == Arm ==
    /// Schedules `on_fire` to run once, `ttl_ms` from now, and parks
    /// `on_expire` in the slot until the timer is settled or disarmed.
    ///
    /// Any timer already pending for `key` is cancelled first.
    pub fn arm<F>(
        &mut self,
        key: &str,
        generation: u64,
        ttl_ms: u64,
        on_expire: ExpireHook,
        on_fire: F,
    ) where
        F: FnOnce() + Send + 'static,
    {
        self.disarm(key);

        let delay = Duration::from_millis(ttl_ms);
        let handle = self
            .runtime
            .spawn(async move {
                tokio::time::sleep(delay).await;
                on_fire();
            })
            .abort_handle();

        debug!(key, generation, ttl_ms, "Armed expiration timer");
        self.pending.insert(
            key.to_string(),
            PendingTimer {
                generation,
                handle,
                on_expire,
            },
        );
    }

    // == Disarm ==
    /// Cancels the pending timer for `key`, if any, dropping its hook.
    ///
    /// Returns whether a timer was pending.
    pub fn disarm(&mut self, key: &str) -> bool {
        match self.pending.remove(key) {
            Some(timer) => {
                timer.handle.abort();
                debug!(key, generation = timer.generation, "Disarmed expiration timer");
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer. Returns how many were pending.
    pub fn disarm_all(&mut self) -> usize {
        let count = self.pending.len();
        for (_, timer) in self.pending.drain() {
            timer.handle.abort();
        }
        count
    }

    // == Settle ==
    /// Claims the pending slot of `generation` for an entry whose time is
    /// up, cancelling the timer if it is still sleeping, and hands back the
    /// expiry hook.
    ///
    /// Returns `None` when the slot was already settled, disarmed or re-armed
    /// for a newer generation; the caller must then do nothing.
    pub fn settle(&mut self, key: &str, generation: u64) -> Option<ExpireHook> {
        match self.pending.get(key) {
            Some(timer) if timer.generation == generation => {
                let timer = self.pending.remove(key)?;
                timer.handle.abort();
                debug!(key, generation, "Settled expiration timer");
                Some(timer.on_expire)
            }
            _ => None,
        }
    }

    /// Returns whether a timer is pending for `key`.
    pub fn is_armed(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Returns the number of pending timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Drop for ExpirationScheduler {
    fn drop(&mut self) {
        self.disarm_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook = {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        };
        (fired, hook)
    }

    fn noop() -> ExpireHook {
        Box::new(|_: &str| {})
    }

    #[test]
    fn test_try_current_without_runtime() {
        assert!(matches!(
            ExpirationScheduler::try_current(),
            Err(CacheError::NoRuntime)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_after_ttl() {
        let mut scheduler = ExpirationScheduler::try_current().unwrap();
        let (fired, hook) = counter();

        scheduler.arm("k", 1, 50, noop(), hook);
        assert!(scheduler.is_armed("k"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_prevents_firing() {
        let mut scheduler = ExpirationScheduler::try_current().unwrap();
        let (fired, hook) = counter();

        scheduler.arm("k", 1, 50, noop(), hook);
        assert!(scheduler.disarm("k"));
        assert!(!scheduler.disarm("k"), "Disarm should be idempotent");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_cancels_previous_timer() {
        let mut scheduler = ExpirationScheduler::try_current().unwrap();
        let (first, first_hook) = counter();
        let (second, second_hook) = counter();

        scheduler.arm("k", 1, 50, noop(), first_hook);
        scheduler.arm("k", 2, 10_000, noop(), second_hook);
        assert_eq!(scheduler.len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_armed("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_all() {
        let mut scheduler = ExpirationScheduler::try_current().unwrap();
        let (fired, hook_a) = counter();
        let hook_b = {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        };

        scheduler.arm("a", 1, 10, noop(), hook_a);
        scheduler.arm("b", 2, 20, noop(), hook_b);
        assert_eq!(scheduler.disarm_all(), 2);
        assert!(scheduler.is_empty());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_settle_checks_generation() {
        let mut scheduler = ExpirationScheduler::try_current().unwrap();

        scheduler.arm("k", 7, 60_000, noop(), || {});

        assert!(scheduler.settle("k", 6).is_none(), "Stale generation must not settle");
        assert!(scheduler.is_armed("k"));

        assert!(scheduler.settle("k", 7).is_some());
        assert!(!scheduler.is_armed("k"));
        assert!(scheduler.settle("k", 7).is_none(), "Second settle must lose");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_hands_back_hook_and_cancels_timer() {
        let mut scheduler = ExpirationScheduler::try_current().unwrap();
        let (fired, on_fire) = counter();
        let (expired, on_expire) = counter();

        scheduler.arm("k", 3, 50, Box::new(move |_: &str| on_expire()), on_fire);

        let hook = scheduler.settle("k", 3).expect("Slot should settle");
        hook("k");
        assert_eq!(expired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "Settled timer must not fire");
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_drops_hook() {
        let mut scheduler = ExpirationScheduler::try_current().unwrap();
        let (expired, on_expire) = counter();

        scheduler.arm("k", 1, 50, Box::new(move |_: &str| on_expire()), || {});
        assert!(scheduler.disarm("k"));
        assert!(scheduler.settle("k", 1).is_none());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }
}
