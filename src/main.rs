//! varcache - A pure in-memory key-value cache
//!
//! Walks through a short set/get/expire/delete session and prints the
//! recorded statistics as JSON.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use varcache::{Cache, CacheConfig, SetHooks};

/// Entry point for the varcache demonstration.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load cache flags from environment variables
/// 3. Store one permanent and one short-lived entry
/// 4. Read them back before and after the short TTL elapses
/// 5. Delete a present and an absent key
/// 6. Print the statistics report and key directory
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "varcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: debug={}, record_hits={}, record_misses={}",
        config.debug, config.record_hits, config.record_misses
    );

    let cache: Cache<Value> = Cache::with_config(config)?;

    cache.set("a", json!({ "x": 1 }), 0)?;
    info!("get(a) = {:?}", cache.get("a")?);

    cache.set_with(
        "b",
        json!(1),
        100,
        SetHooks::new().on_expire(|key| info!("Entry '{}' expired", key)),
    )?;
    info!("get(b) = {:?}", cache.get("b")?);

    tokio::time::sleep(Duration::from_millis(150)).await;
    info!("get(b) after 150ms = {:?}", cache.get("b")?);

    cache.delete_with(vec!["a", "missing"], |key| info!("Deleted '{}'", key))?;

    println!("{}", serde_json::to_string_pretty(&cache.stats())?);
    println!("{}", serde_json::to_string_pretty(&cache.keys())?);

    Ok(())
}
