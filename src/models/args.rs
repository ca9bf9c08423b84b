//! Argument types for cache operations
//!
//! Defines key sets accepted by `delete`, key validation, and the optional
//! hook bundles accepted by `set_with` and `get_with`.

use crate::cache::MAX_KEY_LENGTH;
use crate::error::{CacheError, Result};
use crate::models::CacheRecord;

/// Validates a cache key.
///
/// Keys must be non-empty and at most [`MAX_KEY_LENGTH`] bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "Key cannot be empty".to_string(),
        ));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

// == Keys ==
/// A single key or an ordered sequence of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keys {
    One(String),
    Many(Vec<String>),
}

impl Keys {
    /// Iterates the keys in the order they were given.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Keys::One(key) => std::slice::from_ref(key),
            Keys::Many(keys) => keys,
        };
        slice.iter().map(String::as_str)
    }

    /// Validates every key, reporting the position of the first bad element
    /// of a sequence.
    pub fn validate(&self) -> Result<()> {
        match self {
            Keys::One(key) => validate_key(key),
            Keys::Many(keys) => keys.iter().enumerate().try_for_each(|(i, key)| {
                validate_key(key).map_err(|e| match e {
                    CacheError::InvalidArgument(msg) => {
                        CacheError::InvalidArgument(format!("element {}: {}", i, msg))
                    }
                    other => other,
                })
            }),
        }
    }
}

impl From<&str> for Keys {
    fn from(key: &str) -> Self {
        Keys::One(key.to_string())
    }
}

impl From<String> for Keys {
    fn from(key: String) -> Self {
        Keys::One(key)
    }
}

impl From<&String> for Keys {
    fn from(key: &String) -> Self {
        Keys::One(key.clone())
    }
}

impl From<Vec<String>> for Keys {
    fn from(keys: Vec<String>) -> Self {
        Keys::Many(keys)
    }
}

impl From<Vec<&str>> for Keys {
    fn from(keys: Vec<&str>) -> Self {
        Keys::Many(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Keys {
    fn from(keys: &[&str]) -> Self {
        Keys::Many(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Keys {
    fn from(keys: [&str; N]) -> Self {
        Keys::Many(keys.iter().map(|k| k.to_string()).collect())
    }
}

// == Hooks ==
/// Runs after a `set` stores its entry.
pub type SetHook<'a, V> = Box<dyn FnOnce(&CacheRecord<V>) + 'a>;
/// Runs once when an entry expires, by its timer or on read.
pub type ExpireHook = Box<dyn FnOnce(&str) + Send + 'static>;
/// Runs when a `get` finds a live entry.
pub type HitHook<'a, V> = Box<dyn FnOnce(&str, &V) + 'a>;
/// Runs when a `get` finds nothing, or finds an expired entry.
pub type MissHook<'a> = Box<dyn FnOnce(&str) + 'a>;

/// Optional hooks for `set_with`.
pub struct SetHooks<'a, V> {
    pub(crate) on_set: Option<SetHook<'a, V>>,
    pub(crate) on_expire: Option<ExpireHook>,
}

impl<'a, V> Default for SetHooks<'a, V> {
    fn default() -> Self {
        Self {
            on_set: None,
            on_expire: None,
        }
    }
}

impl<'a, V> SetHooks<'a, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called synchronously with the stored record.
    pub fn on_set(mut self, hook: impl FnOnce(&CacheRecord<V>) + 'a) -> Self {
        self.on_set = Some(Box::new(hook));
        self
    }

    /// Called with the key once the entry expires, whether its timer or a
    /// `get` removes it. Not called after a replace, delete or clear.
    pub fn on_expire(mut self, hook: impl FnOnce(&str) + Send + 'static) -> Self {
        self.on_expire = Some(Box::new(hook));
        self
    }
}

/// Optional hooks for `get_with`.
pub struct GetHooks<'a, V> {
    pub(crate) on_hit: Option<HitHook<'a, V>>,
    pub(crate) on_miss: Option<MissHook<'a>>,
}

impl<'a, V> Default for GetHooks<'a, V> {
    fn default() -> Self {
        Self {
            on_hit: None,
            on_miss: None,
        }
    }
}

impl<'a, V> GetHooks<'a, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the key and data on a hit.
    pub fn on_hit(mut self, hook: impl FnOnce(&str, &V) + 'a) -> Self {
        self.on_hit = Some(Box::new(hook));
        self
    }

    /// Called with the key on a miss.
    pub fn on_miss(mut self, hook: impl FnOnce(&str) + 'a) -> Self {
        self.on_miss = Some(Box::new(hook));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_key() {
        assert!(matches!(
            validate_key(""),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_long_key() {
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
        assert!(validate_key(&long_key).is_err());
        assert!(validate_key(&long_key[..MAX_KEY_LENGTH]).is_ok());
    }

    #[test]
    fn test_keys_from_single() {
        let keys = Keys::from("a");
        assert_eq!(keys.iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_keys_from_sequence_keeps_order() {
        let keys = Keys::from(["c", "a", "b"]);
        assert_eq!(keys.iter().collect::<Vec<_>>(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_keys_validate_reports_element() {
        let keys = Keys::from(vec!["ok", "", "also_ok"]);
        match keys.validate() {
            Err(CacheError::InvalidArgument(msg)) => assert!(msg.starts_with("element 1")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_sequence_is_valid() {
        assert!(Keys::Many(Vec::new()).validate().is_ok());
    }
}
