//! Configuration Module
//!
//! Handles loading the cache's runtime flags from environment variables.

use std::env;

/// Cache configuration flags.
///
/// All values can be configured via environment variables and changed later
/// through the cache's toggle operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Emit a trace event for every cache operation
    pub debug: bool,
    /// Count and log hits
    pub record_hits: bool,
    /// Count and log misses
    pub record_misses: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `VARCACHE_DEBUG` - Trace every operation (default: off)
    /// - `VARCACHE_RECORD_HITS` - Record hits (default: off)
    /// - `VARCACHE_RECORD_MISSES` - Record misses (default: off)
    pub fn from_env() -> Self {
        Self {
            debug: env_flag("VARCACHE_DEBUG").unwrap_or(false),
            record_hits: env_flag("VARCACHE_RECORD_HITS").unwrap_or(false),
            record_misses: env_flag("VARCACHE_RECORD_MISSES").unwrap_or(false),
        }
    }

    /// Enables or disables debug tracing.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Enables or disables hit recording.
    pub fn with_record_hits(mut self, enabled: bool) -> Self {
        self.record_hits = enabled;
        self
    }

    /// Enables or disables miss recording.
    pub fn with_record_misses(mut self, enabled: bool) -> Self {
        self.record_misses = enabled;
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_flag(&v))
}

/// Parses a boolean flag value, accepting the usual spellings.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert!(!config.debug);
        assert!(!config.record_hits);
        assert!(!config.record_misses);
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("VARCACHE_DEBUG", "garbage");
        env::set_var("VARCACHE_RECORD_HITS", "On");
        env::remove_var("VARCACHE_RECORD_MISSES");

        let config = CacheConfig::from_env();
        assert!(!config.debug);
        assert!(config.record_hits);
        assert!(!config.record_misses);

        env::remove_var("VARCACHE_DEBUG");
        env::remove_var("VARCACHE_RECORD_HITS");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_builder_methods() {
        let config = CacheConfig::default()
            .with_debug(true)
            .with_record_misses(true);
        assert!(config.debug);
        assert!(!config.record_hits);
        assert!(config.record_misses);
    }
}
