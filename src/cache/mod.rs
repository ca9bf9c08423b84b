//! Cache Module
//!
//! Provides in-memory caching with per-entry TTL expiration timers and
//! hit/miss auditing.

mod clock;
mod entry;
mod facade;
mod scheduler;
mod stats;
mod store;


// Re-export public types
pub use clock::{checked_datetime, to_datetime, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use facade::Cache;
pub use scheduler::ExpirationScheduler;
pub use stats::StatsRecorder;
pub use store::EntryStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
