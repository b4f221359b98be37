//! Service Configuration - server, model artifact and weather settings
//!
//! Each struct implements `Default` with the built-in values from
//! [`super::defaults`], so the service runs with no config file at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV_VAR: &str = "TUNNELVISION_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tunnelvision.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a service deployment.
///
/// Load with `ServiceConfig::load()` which searches:
/// 1. `$TUNNELVISION_CONFIG` env var
/// 2. `./tunnelvision.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Trained model artifacts
    #[serde(default)]
    pub models: ModelsConfig,

    /// Weather lookup
    #[serde(default)]
    pub weather: WeatherConfig,
}

impl ServiceConfig {
    /// Load configuration using the standard search order.
    ///
    /// A file that exists but fails to load is logged and skipped, so a bad
    /// env var still falls through to the local file and then to defaults.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded service config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./tunnelvision.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded service config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only warn; range errors reject the config.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all values for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `TUNNELVISION_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Origins allowed to call the API cross-origin. Empty = same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_server_addr() -> String {
    defaults::DEFAULT_SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            cors_origins: Vec::new(),
        }
    }
}

/// Where trained model bundles live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory with one `<target>/schema.json` + `<target>/model.json` pair per target.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_ARTIFACTS_DIR)
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

/// Weather lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// When false, every request uses `fallback_temperature_c` without a network call.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Bound on the single weather request (ms, at most 5000).
    #[serde(default = "default_weather_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_fallback_temperature_c")]
    pub fallback_temperature_c: f64,
}

fn default_true() -> bool {
    true
}

fn default_weather_base_url() -> String {
    defaults::DEFAULT_WEATHER_BASE_URL.to_string()
}

fn default_weather_timeout_ms() -> u64 {
    defaults::DEFAULT_WEATHER_TIMEOUT_MS
}

fn default_fallback_temperature_c() -> f64 {
    defaults::FALLBACK_TEMPERATURE_C
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_weather_base_url(),
            timeout_ms: default_weather_timeout_ms(),
            fallback_temperature_c: default_fallback_temperature_c(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
