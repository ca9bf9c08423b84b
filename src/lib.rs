//! varcache - A pure in-memory key-value cache
//!
//! Stores values of any type with optional per-entry TTL expiration and
//! optional hit/miss auditing.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use cache::Cache;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use models::{GetHooks, Keys, SetHooks};
