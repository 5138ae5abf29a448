//! Configuration types and loading.
//!
//! [`EssenceConfig`] is assembled from, in increasing priority:
//! built-in defaults, `.essence/config.yaml`, `.essence/config.toml`, and
//! `ESSENCE_`-prefixed environment variables (nested keys split on `__`,
//! e.g. `ESSENCE_SERVICE__URL`). Command-line flags are applied on top by the
//! binary.

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration could not be serialized to YAML.
    #[error("failed to write config file: {0}")]
    WriteError(#[from] serde_yaml::Error),

    /// A layer contained invalid syntax or a mistyped value.
    #[error("invalid configuration: {0}")]
    Invalid(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "ESSENCE_";

/// Default base URL of the dose-calculation service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Where and how to reach the dose-calculation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceConfig {
    /// Base URL; endpoint paths are appended to it.
    #[serde(default = "default_service_url")]
    pub url: String,

    /// Whole-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Output preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Emit JSON instead of styled text.
    #[serde(default)]
    pub json: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssenceConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Builds the layered provider for `essence_dir` without extracting it.
///
/// Missing files are skipped silently.
pub fn figment(essence_dir: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(EssenceConfig::default()));
    if let Some(dir) = essence_dir {
        figment = figment
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Toml::file(dir.join("config.toml")));
    }
    figment.merge(
        Env::prefixed(ENV_PREFIX)
            .split("__")
            .map(|key| key.as_str().replace('_', "-").into()),
    )
}

/// Load configuration for the given `.essence/` directory, if any.
///
/// With no directory, only defaults and environment overrides apply.
pub fn load_config(essence_dir: Option<&Path>) -> Result<EssenceConfig> {
    Ok(figment(essence_dir).extract()?)
}

/// Save configuration to `config.yaml` inside `essence_dir`.
///
/// The directory is created if it does not exist.
pub fn save_config(essence_dir: &Path, config: &EssenceConfig) -> Result<()> {
    std::fs::create_dir_all(essence_dir)?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(essence_dir.join("config.yaml"), yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let cfg = EssenceConfig::default();
        assert_eq!(cfg.service.url, "http://localhost:8000");
        assert_eq!(cfg.service.timeout(), Duration::from_secs(30));
        assert!(!cfg.output.json);
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(dir.path())).unwrap();
        assert_eq!(cfg.service.timeout_secs, 30);
    }

    #[test]
    fn roundtrip_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let essence_dir = dir.path().join(".essence");

        let mut cfg = EssenceConfig::default();
        cfg.service.url = "http://dose.internal:9000".to_string();
        cfg.output.json = true;
        save_config(&essence_dir, &cfg).unwrap();

        let yaml = std::fs::read_to_string(essence_dir.join("config.yaml")).unwrap();
        assert!(yaml.contains("timeout-secs: 30"), "{}", yaml);
        let loaded = load_config(Some(&essence_dir)).unwrap();
        assert_eq!(loaded.service.url, "http://dose.internal:9000");
        assert!(loaded.output.json);
    }

    #[test]
    fn toml_layer_overrides_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "service:\n  url: http://from-yaml\n  timeout-secs: 5\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("config.toml"), "[service]\nurl = \"http://from-toml\"\n")
            .unwrap();

        let cfg = load_config(Some(dir.path())).unwrap();
        assert_eq!(cfg.service.url, "http://from-toml");
        assert_eq!(cfg.service.timeout_secs, 5);
    }

    #[test]
    fn mistyped_value_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "service:\n  timeout-secs: soon\n").unwrap();
        let err = load_config(Some(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
