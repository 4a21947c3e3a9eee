//! Configuration management module
//!
//! Declarative configuration for the resolver: one optional section per
//! naming service plus cache settings, loadable from a file and
//! `CHAIN_RESOLUTION`-prefixed environment variables.

use crate::shared::error::{ConfigurationError, ResolutionError};
use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_network() -> String {
    "mainnet".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    300
}

/// Settings for one naming-service backend.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceSettings {
    /// JSON-RPC endpoint URL
    #[validate(url)]
    pub url: String,

    /// Network name
    #[serde(default = "default_network")]
    pub network: String,

    /// Registry address override
    #[serde(default)]
    pub registry: Option<String>,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,
}

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheSettings {
    /// Enable the TTL cache for resolution results
    pub enabled: bool,

    /// Time-to-live for cached resolutions, in seconds
    #[serde(default = "default_cache_ttl")]
    #[validate(range(min = 1, max = 86400))]
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: default_cache_ttl(),
        }
    }
}

/// Top-level resolver configuration. Services left unset are not
/// registered in the dispatch pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResolutionConfig {
    /// ENS-family backend
    #[serde(default)]
    pub ens: Option<ServiceSettings>,

    /// CNS backend
    #[serde(default)]
    pub cns: Option<ServiceSettings>,

    /// ZNS backend
    #[serde(default)]
    pub zns: Option<ServiceSettings>,

    /// RNS backend
    #[serde(default)]
    pub rns: Option<ServiceSettings>,

    /// Cache settings
    #[serde(default)]
    pub cache: CacheSettings,
}

impl ResolutionConfig {
    /// Load configuration from `Resolution.toml` (optional) layered with
    /// `CHAIN_RESOLUTION__`-prefixed environment variables.
    pub fn load() -> Result<Self, ResolutionError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("Resolution").required(false))
            .add_source(config::Environment::with_prefix("CHAIN_RESOLUTION").separator("__"))
            .build()
            .map_err(|e| configuration_error(format!("failed to build configuration: {}", e)))?;

        let config: ResolutionConfig = config
            .try_deserialize()
            .map_err(|e| configuration_error(format!("failed to deserialize configuration: {}", e)))?;

        config.validate_config()?;
        Ok(config)
    }

    /// Validate every configured section.
    pub fn validate_config(&self) -> Result<(), ResolutionError> {
        for settings in [&self.ens, &self.cns, &self.zns, &self.rns]
            .into_iter()
            .flatten()
        {
            settings
                .validate()
                .map_err(|e| configuration_error(format!("invalid service settings: {}", e)))?;
        }
        self.cache
            .validate()
            .map_err(|e| configuration_error(format!("invalid cache settings: {}", e)))?;
        Ok(())
    }

    /// Whether at least one service is configured.
    pub fn has_services(&self) -> bool {
        self.ens.is_some() || self.cns.is_some() || self.zns.is_some() || self.rns.is_some()
    }
}

fn configuration_error(reason: String) -> ResolutionError {
    ResolutionError::Configuration(ConfigurationError::IncorrectProvider { reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_services() {
        let config = ResolutionConfig::default();
        assert!(!config.has_services());
        assert!(!config.cache.enabled);
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_service_settings_defaults() {
        let settings: ServiceSettings =
            serde_json::from_str(r#"{"url": "https://mainnet.example/rpc"}"#).unwrap();
        assert_eq!(settings.network, "mainnet");
        assert_eq!(settings.timeout_seconds, 30);
        assert!(settings.registry.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_url_fails_validation() {
        let settings: ServiceSettings =
            serde_json::from_str(r#"{"url": "not a url"}"#).unwrap();
        let config = ResolutionConfig {
            cns: Some(settings),
            ..Default::default()
        };
        assert!(config.validate_config().is_err());
    }
}
