//! Generation parameters.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::uid::{DEFAULT_LENGTH, MIN_LENGTH, UidError};

/// Environment variable holding the default symbol count.
pub const LENGTH_ENV: &str = "MICRO_UID_LENGTH";
/// Environment variable toggling separators (`true`/`false`, `1`/`0`, ...).
pub const SEPARATOR_ENV: &str = "MICRO_UID_SEPARATOR";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors raised while reading configuration.
pub enum ConfigError {
    #[error("Invalid integer for {name}: {value}")]
    InvalidInteger { name: &'static str, value: String },
    #[error("Invalid boolean for {name}: {value}")]
    InvalidBool { name: &'static str, value: String },
    #[error(transparent)]
    Uid(#[from] UidError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Parameters for [`crate::generate`]: symbol count and grouping.
pub struct UidConfig {
    pub length: usize,
    pub with_separator: bool,
}

impl Default for UidConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            with_separator: true,
        }
    }
}

impl UidConfig {
    /// Read `MICRO_UID_LENGTH` and `MICRO_UID_SEPARATOR` over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(lookup, None, None)
    }

    /// Merge explicit values over a key lookup over the defaults.
    ///
    /// A key is only parsed when no explicit value is given for it, and the
    /// length contract is checked once on the merged result.
    pub fn resolve<F>(
        lookup: F,
        length: Option<usize>,
        with_separator: Option<bool>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match (length, lookup(LENGTH_ENV)) {
            (Some(n), _) => config.length = n,
            (None, Some(value)) => {
                config.length =
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidInteger {
                            name: LENGTH_ENV,
                            value: value.clone(),
                        })?;
            }
            (None, None) => {}
        }

        match (with_separator, lookup(SEPARATOR_ENV)) {
            (Some(flag), _) => config.with_separator = flag,
            (None, Some(value)) => {
                config.with_separator =
                    parse_bool(&value).ok_or_else(|| ConfigError::InvalidBool {
                        name: SEPARATOR_ENV,
                        value: value.clone(),
                    })?;
            }
            (None, None) => {}
        }

        config.check()?;
        Ok(config)
    }

    /// Check the parameter contract without touching the clock.
    pub fn check(&self) -> Result<(), UidError> {
        if self.length < MIN_LENGTH {
            return Err(UidError::InvalidLength(self.length));
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = UidConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(c, UidConfig::default());
        assert_eq!(c.length, 10);
        assert!(c.with_separator);
    }

    #[test]
    fn test_overrides() {
        let c = UidConfig::from_lookup(lookup_from(&[
            (LENGTH_ENV, " 16 "),
            (SEPARATOR_ENV, "off"),
        ]))
        .unwrap();
        assert_eq!(c.length, 16);
        assert!(!c.with_separator);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            UidConfig::from_lookup(lookup_from(&[(LENGTH_ENV, "ten")])),
            Err(ConfigError::InvalidInteger { .. })
        ));
        assert!(matches!(
            UidConfig::from_lookup(lookup_from(&[(SEPARATOR_ENV, "maybe")])),
            Err(ConfigError::InvalidBool { .. })
        ));
        assert_eq!(
            UidConfig::from_lookup(lookup_from(&[(LENGTH_ENV, "7")])),
            Err(ConfigError::Uid(UidError::InvalidLength(7)))
        );
    }

    #[test]
    fn test_explicit_values_win_over_lookup() {
        let env = lookup_from(&[(LENGTH_ENV, "5"), (SEPARATOR_ENV, "maybe")]);
        let c = UidConfig::resolve(env, Some(12), Some(false)).unwrap();
        assert_eq!(c.length, 12);
        assert!(!c.with_separator);

        let env = lookup_from(&[(LENGTH_ENV, "14")]);
        let c = UidConfig::resolve(env, None, Some(false)).unwrap();
        assert_eq!(c.length, 14);
    }

    #[test]
    fn test_explicit_length_still_checked() {
        let env = lookup_from(&[(LENGTH_ENV, "20")]);
        assert_eq!(
            UidConfig::resolve(env, Some(6), None),
            Err(ConfigError::Uid(UidError::InvalidLength(6)))
        );
    }

    #[test]
    fn test_serialize_effective_config() {
        let c = UidConfig::resolve(lookup_from(&[]), Some(16), None).unwrap();
        assert_eq!(
            serde_json::to_value(c).unwrap(),
            serde_json::json!({"length": 16, "with_separator": true})
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let c: UidConfig = serde_json::from_str(r#"{"length": 12}"#).unwrap();
        assert_eq!(c.length, 12);
        assert!(c.with_separator);

        let c: UidConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c, UidConfig::default());
    }
}
