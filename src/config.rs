//! Configuration types.

use crate::error::ConfigError;

const USER_CAPACITY_KEY: &str = "MAILROOM_USER_CAPACITY";
const MESSAGE_CAPACITY_KEY: &str = "MAILROOM_MESSAGE_CAPACITY";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Initial capacity of the user table.
    pub user_capacity: usize,
    /// Initial capacity of the message index.
    pub message_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            user_capacity: 64,
            message_capacity: 256,
        }
    }
}

impl StoreConfig {
    /// Build config from environment variables, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            user_capacity: parse_usize(&lookup, USER_CAPACITY_KEY, defaults.user_capacity)?,
            message_capacity: parse_usize(
                &lookup,
                MESSAGE_CAPACITY_KEY,
                defaults.message_capacity,
            )?,
        })
    }
}

fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_keys_use_defaults() {
        let config = StoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn reads_capacities() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("MAILROOM_USER_CAPACITY", "10"),
            ("MAILROOM_MESSAGE_CAPACITY", " 1000 "),
        ]))
        .unwrap();
        assert_eq!(config.user_capacity, 10);
        assert_eq!(config.message_capacity, 1000);
    }

    #[test]
    fn rejects_unparsable_value() {
        let err = StoreConfig::from_lookup(lookup_from(&[("MAILROOM_MESSAGE_CAPACITY", "lots")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "MAILROOM_MESSAGE_CAPACITY"),
        }
    }
}
