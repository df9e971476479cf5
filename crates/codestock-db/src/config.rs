//! Catalog configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. Database settings live on [`crate::DbConfig`].

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// How the writer treats ids that point at other aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Write links to category / product ids without checking them.
    /// Readers omit links whose target is missing.
    #[default]
    Trust,

    /// Check every referenced category / product before writing and fail
    /// with `DanglingReference` if one is missing.
    Verify,
}

impl FromStr for ReferencePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" => Ok(ReferencePolicy::Trust),
            "verify" => Ok(ReferencePolicy::Verify),
            _ => Err(ConfigError::InvalidValue(
                "CODESTOCK_REFERENCE_POLICY".to_string(),
            )),
        }
    }
}

/// Behaviour switches for [`crate::Catalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub reference_policy: ReferencePolicy,
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let reference_policy = match env::var("CODESTOCK_REFERENCE_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => ReferencePolicy::default(),
        };

        Ok(CatalogConfig { reference_policy })
    }

    pub fn reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

/// Reads and parses an optional environment variable.
pub(crate) fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_policy_parse() {
        assert_eq!("trust".parse::<ReferencePolicy>().unwrap(), ReferencePolicy::Trust);
        assert_eq!(" Verify ".parse::<ReferencePolicy>().unwrap(), ReferencePolicy::Verify);
        assert!("strict".parse::<ReferencePolicy>().is_err());
    }

    #[test]
    fn test_default_policy_is_trust() {
        assert_eq!(CatalogConfig::default().reference_policy, ReferencePolicy::Trust);
    }
}
