use crate::error::config::ConfigError;
use crate::{DEFAULT_PORT_RANGE_END, DEFAULT_PORT_RANGE_START};

use common::ErrorLocation;
use models::MIN_BACKEND_PORT;

use std::collections::BTreeMap;
use std::fs::{create_dir_all, read_to_string, rename, write};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;
const MAX_READINESS_DELAY_MS: u64 = 60_000;
const MAX_SHUTDOWN_GRACE_MS: u64 = 60_000;

// ============================================
// ENUMS WITH DEFAULTS
// ============================================

/// How the supervisor decides the backend is ready to serve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessMode {
    /// Sleep for `delay_ms`, then assume the listener is bound.
    #[default]
    FixedDelay,
    /// Poll `health_path` until it answers or `max_wait_ms` passes.
    HttpPoll,
}

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortRangeConfig {
    #[serde(default = "default_port_start")]
    pub start: u16,
    /// Exclusive upper bound.
    #[serde(default = "default_port_end")]
    pub end: u16,
}

impl Default for PortRangeConfig {
    fn default() -> Self {
        Self {
            start: default_port_start(),
            end: default_port_end(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Interpreter to run the entry script with. Unset means a project
    /// virtualenv if one exists, else the platform's python from `PATH`.
    pub interpreter: Option<String>,
    #[serde(default = "default_entry_script")]
    pub entry_script: String,
    /// Overrides the layout-derived backend directory.
    pub working_dir: Option<PathBuf>,
    /// Extra variables for the backend. The port and mode variables are
    /// always set by the supervisor and cannot be overridden here.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            entry_script: default_entry_script(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessConfig {
    #[serde(default)]
    pub mode: ReadinessMode,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            mode: ReadinessMode::default(),
            delay_ms: default_delay_ms(),
            health_path: default_health_path(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

impl ReadinessConfig {
    /// Fixed-delay readiness with a custom delay.
    pub fn fixed_delay(delay: Duration) -> Self {
        Self {
            mode: ReadinessMode::FixedDelay,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    /// HTTP polling readiness against `health_path`.
    pub fn http_poll(health_path: impl Into<String>, max_wait: Duration) -> Self {
        Self {
            mode: ReadinessMode::HttpPoll,
            health_path: health_path.into(),
            max_wait_ms: u64::try_from(max_wait.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShutdownConfig {
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace_ms(),
        }
    }
}

impl ShutdownConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LivenessConfig {
    /// `0` turns the watcher off.
    #[serde(default = "default_liveness_interval_ms")]
    pub interval_ms: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_liveness_interval_ms(),
        }
    }
}

impl LivenessConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupervisorConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub ports: PortRangeConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,

    #[serde(default)]
    pub liveness: LivenessConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ports: PortRangeConfig::default(),
            backend: BackendConfig::default(),
            readiness: ReadinessConfig::default(),
            shutdown: ShutdownConfig::default(),
            liveness: LivenessConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_port_start() -> u16 {
    DEFAULT_PORT_RANGE_START
}
fn default_port_end() -> u16 {
    DEFAULT_PORT_RANGE_END
}
fn default_entry_script() -> String {
    "app.py".to_string()
}
fn default_delay_ms() -> u64 {
    3_000
}
fn default_health_path() -> String {
    "/".to_string()
}
fn default_max_wait_ms() -> u64 {
    20_000
}
fn default_grace_ms() -> u64 {
    5_000
}
fn default_liveness_interval_ms() -> u64 {
    5_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl SupervisorConfig {
    /// Location of the config file inside `config_dir`.
    pub fn file_path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Load config from {config_dir}/config.json.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read, parsed or validated is an error; the caller decides whether to
    /// fall back.
    #[track_caller]
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let location = ErrorLocation::from(Location::caller());
        let config_path = Self::file_path(config_dir);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
            location,
            path: config_path.clone(),
            source: e,
        })?;

        let config: SupervisorConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
                location,
                path: config_path.clone(),
                reason: e.to_string(),
            })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json via temp file + rename.
    #[track_caller]
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let location = ErrorLocation::from(Location::caller());
        self.validate()?;

        create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location,
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = Self::file_path(config_dir);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location,
            reason: e.to_string(),
        })?;

        write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location,
            path: temp_path.clone(),
            source: e,
        })?;

        rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location,
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let location = ErrorLocation::from(Location::caller());
        let invalid = |field: &'static str, reason: String| ConfigError::ValidationError {
            location,
            field,
            reason,
        };

        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(invalid(
                "version",
                format!("{} (expected 1-{CONFIG_VERSION})", self.version),
            ));
        }

        if self.ports.start < MIN_BACKEND_PORT {
            return Err(invalid(
                "ports.start",
                format!("{} is below {MIN_BACKEND_PORT}", self.ports.start),
            ));
        }

        if self.ports.start >= self.ports.end {
            return Err(invalid(
                "ports.end",
                format!(
                    "range {}..{} is empty",
                    self.ports.start, self.ports.end
                ),
            ));
        }

        if self.backend.entry_script.trim().is_empty() {
            return Err(invalid("backend.entry_script", "cannot be empty".to_string()));
        }

        if let Some(interpreter) = &self.backend.interpreter
            && interpreter.trim().is_empty()
        {
            return Err(invalid(
                "backend.interpreter",
                "cannot be an empty string".to_string(),
            ));
        }

        if self.readiness.delay_ms > MAX_READINESS_DELAY_MS {
            return Err(invalid(
                "readiness.delay_ms",
                format!("{} exceeds {MAX_READINESS_DELAY_MS}", self.readiness.delay_ms),
            ));
        }

        if !self.readiness.health_path.starts_with('/') {
            return Err(invalid(
                "readiness.health_path",
                format!("'{}' must start with '/'", self.readiness.health_path),
            ));
        }

        if self.readiness.mode == ReadinessMode::HttpPoll && self.readiness.max_wait_ms == 0 {
            return Err(invalid(
                "readiness.max_wait_ms",
                "must be positive when polling".to_string(),
            ));
        }

        if self.shutdown.grace_ms > MAX_SHUTDOWN_GRACE_MS {
            return Err(invalid(
                "shutdown.grace_ms",
                format!("{} exceeds {MAX_SHUTDOWN_GRACE_MS}", self.shutdown.grace_ms),
            ));
        }

        Ok(())
    }
}
