//! Argument and snapshot types for the cache API
//!
//! `args` holds what callers pass in (keys, hooks); `records` holds the
//! copies of cache state handed back out.

pub mod args;
pub mod records;

// Re-export commonly used types
pub use args::{validate_key, GetHooks, Keys, SetHooks};
pub use records::{CacheRecord, EventLog, KeyMeta, StatsReport};
