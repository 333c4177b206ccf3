//! Configuration types for the enrichment service.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::time::Duration;

use crate::EnrichError;

// ============================================================================
// Default configuration constants
// ============================================================================

/// Default registry lookup timeout in milliseconds.
pub const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 5_000;

/// Default maximum distinct attribute names per lookup.
///
/// Requests exceeding this limit are rejected before the registry is
/// contacted.
pub const DEFAULT_MAX_FIELD_NAMES: usize = 1_024;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "enrich.toml";

const ENV_PREFIX: &str = "ENRICH_";

/// Enrichment service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Schema registry configuration.
    pub registry: RegistryConfig,
}

impl EnrichConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in order (later sources override earlier):
    /// 1. Default values
    /// 2. `enrich.toml` in current directory
    /// 3. Environment variables prefixed with `ENRICH_`, `__` separating
    ///    nested keys (e.g. `ENRICH_REGISTRY__TIMEOUT_MS`)
    pub fn load() -> Result<Self, EnrichError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &str) -> Result<Self, EnrichError> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| EnrichError::Config(e.to_string()))
    }

    /// Parse configuration from TOML content, without the environment.
    pub fn from_toml_str(content: &str) -> Result<Self, EnrichError> {
        Figment::new()
            .merge(Toml::string(content))
            .extract()
            .map_err(|e| EnrichError::Config(e.to_string()))
    }
}

/// Schema registry lookup limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Lookup timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum distinct attribute names per lookup.
    pub max_field_names: usize,
}

impl RegistryConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_REGISTRY_TIMEOUT_MS,
            max_field_names: DEFAULT_MAX_FIELD_NAMES,
        }
    }
}
