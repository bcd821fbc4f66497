//! Runtime configuration
//!
//! Loaded from TOML; every section and field falls back to its default, so an
//! empty or missing file yields a working configuration.

use crate::aggregator::ContextScope;
use crate::{SaultError, SaultResult};
use sault_collab::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaultConfig {
    /// Registry refresh behaviour
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Context aggregation behaviour
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Link generation
    #[serde(default)]
    pub links: LinkConfig,
}

impl SaultConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load(path: Option<&Path>) -> SaultResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            SaultError::Config(format!("cannot read {}: {}", config_path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> SaultResult<Self> {
        toml::from_str(contents).map_err(|e| SaultError::Config(e.to_string()))
    }

    /// `<config dir>/sault/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sault").join("config.toml"))
    }
}

/// Registry configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Backoff for `list_documents` reads
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Aggregator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Which documents feed the context
    #[serde(default)]
    pub scope: ContextScope,

    /// Upper bound on concurrent fetch/summarize pipelines
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Classify summaries of documents that carry no category
    #[serde(default = "default_true")]
    pub classify_missing: bool,

    /// Backoff for content fetches and summarization
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            scope: ContextScope::default(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            classify_missing: true,
            retry: RetryPolicy::default(),
        }
    }
}

/// Link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Origin of the web app serving `/sign/<id>`
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// Content gateway serving `/ipfs/<ref>`
    #[serde(default = "default_gateway")]
    pub gateway: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            app_origin: default_app_origin(),
            gateway: default_gateway(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_app_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_gateway() -> String {
    "https://gateway.pinata.cloud".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = SaultConfig::from_toml_str("").unwrap();
        assert_eq!(config, SaultConfig::default());
        assert_eq!(config.aggregator.max_concurrent_fetches, 4);
        assert!(config.aggregator.classify_missing);
    }

    #[test]
    fn test_partial_sections() {
        let config = SaultConfig::from_toml_str(
            r#"
            [aggregator]
            scope = "visible"
            classify_missing = false

            [aggregator.retry]
            max_attempts = 5

            [links]
            app_origin = "https://sign.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.aggregator.scope, ContextScope::Visible);
        assert!(!config.aggregator.classify_missing);
        assert_eq!(config.aggregator.retry.max_attempts, 5);
        assert_eq!(config.aggregator.retry.initial_backoff_ms, 200);
        assert_eq!(config.links.app_origin, "https://sign.example.com");
        assert_eq!(config.links.gateway, "https://gateway.pinata.cloud");
        assert_eq!(config.registry, RegistryConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = SaultConfig::from_toml_str("[aggregator\nscope = 1").unwrap_err();
        assert!(matches!(err, SaultError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let config = SaultConfig::load(Some(Path::new("/nonexistent/sault/config.toml"))).unwrap();
        assert_eq!(config, SaultConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[registry.retry]\nmax_attempts = 1\n").unwrap();

        let config = SaultConfig::load(Some(&path)).unwrap();
        assert_eq!(config.registry.retry.max_attempts, 1);
    }
}
