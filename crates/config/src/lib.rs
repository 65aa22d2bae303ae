//! Backend connection settings for the Sentinel client.
//!
//! Loads configuration from `~/.sentinel/config.toml` with environment
//! variable overrides. The client re-reads the store on every call, so a
//! settings change takes effect on the next request without a restart.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

/// Timeout applied when the config file does not set one.
pub const DEFAULT_TIMEOUT_SECONDS: i64 = 45;

/// Connection settings for the analysis backend.
///
/// Maps directly to `~/.sentinel/config.toml`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Absolute base URL of the analysis backend
    #[serde(default)]
    pub backend_url: String,

    /// Sent as `X-Sentinel-API-Key` when non-blank
    #[serde(default)]
    pub api_key: String,

    /// Per-request deadline in seconds. Must be > 0.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: i64,

    /// Log request payloads and response statuses at debug level
    #[serde(default)]
    pub debug_logging_enabled: bool,
}

fn default_timeout_seconds() -> i64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api_key = if self.has_api_key() { "[REDACTED]" } else { "None" };
        f.debug_struct("BackendConfig")
            .field("backend_url", &self.backend_url)
            .field("api_key", &api_key)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("debug_logging_enabled", &self.debug_logging_enabled)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            api_key: String::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            debug_logging_enabled: false,
        }
    }
}

impl BackendConfig {
    /// Check the settings every backend call depends on.
    ///
    /// URL syntax is checked by the client when it builds endpoints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Backend URL is not configured".into(),
            ));
        }

        if self.timeout_seconds <= 0 {
            return Err(ConfigError::ValidationError(
                "Request timeout must be a positive number of seconds".into(),
            ));
        }

        Ok(())
    }

    /// The configured timeout, or `None` if it is not positive.
    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.timeout_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Apply `SENTINEL_*` overrides using `lookup` to read variables.
    ///
    /// Blank values are ignored. A timeout that is not a whole number is a
    /// validation error; the file value is never used in its place.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = present(ENV_BACKEND_URL) {
            self.backend_url = url;
        }
        if let Some(key) = present(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(raw) = present(ENV_TIMEOUT_SECONDS) {
            self.timeout_seconds = raw.trim().parse::<i64>().map_err(|_| {
                tracing::warn!(value = %raw, "Rejecting non-numeric {ENV_TIMEOUT_SECONDS}");
                ConfigError::ValidationError(format!(
                    "{ENV_TIMEOUT_SECONDS} must be a whole number of seconds, got `{}`",
                    raw.trim()
                ))
            })?;
        }
        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

pub const ENV_BACKEND_URL: &str = "SENTINEL_BACKEND_URL";
pub const ENV_API_KEY: &str = "SENTINEL_API_KEY";
pub const ENV_TIMEOUT_SECONDS: &str = "SENTINEL_TIMEOUT_SECONDS";

// ── Stores ───────────────────────────────────────────────────────────────

/// Load/save access to the persisted [`BackendConfig`].
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<BackendConfig, ConfigError>;

    fn save(&self, config: &BackendConfig) -> Result<(), ConfigError>;
}

/// TOML file on disk, with optional environment overrides on load.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    env_overrides: bool,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_overrides: true,
        }
    }

    /// Store at `~/.sentinel/config.toml`.
    pub fn at_default_location() -> Self {
        Self::new(Self::config_dir().join("config.toml"))
    }

    /// Disable `SENTINEL_*` environment overrides.
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sentinel")
    }

    fn read_file(&self) -> Result<BackendConfig, ConfigError> {
        if !self.path.exists() {
            tracing::info!("No config file found at {}, using defaults", self.path.display());
            return Ok(BackendConfig::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadError {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<BackendConfig, ConfigError> {
        let mut config = self.read_file()?;
        if self.env_overrides {
            config.apply_overrides(|key| std::env::var(key).ok())?;
        }
        Ok(config)
    }

    fn save(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        let write_error = |reason: String| ConfigError::WriteError {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| write_error(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| write_error(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "Saved backend config");
        Ok(())
    }
}

/// In-process store for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: RwLock<BackendConfig>,
}

impl MemoryConfigStore {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<BackendConfig, ConfigError> {
        self.config
            .read()
            .map(|config| config.clone())
            .map_err(|_| ConfigError::Unavailable("config lock poisoned".into()))
    }

    fn save(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        let mut guard = self
            .config
            .write()
            .map_err(|_| ConfigError::Unavailable("config lock poisoned".into()))?;
        *guard = config.clone();
        Ok(())
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("{0}")]
    ValidationError(String),

    #[error("Config store unavailable: {0}")]
    Unavailable(String),
}
