//! Configuration module - environment variable parsing and settings loading

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::game::session::SimulationConfig;
use crate::game::settings::SettingsCatalog;
use crate::util::rate_limit::FIRE_RATE_LIMIT;
use crate::util::time::{SIMULATION_TPS, SNAPSHOT_TPS};

/// Harness configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Fixed simulation rate (Hz)
    pub sim_tick_rate: u32,
    /// Corrective snapshot rate (Hz)
    pub snapshot_rate: u32,
    /// Inbound fire invocations accepted per sender per second
    pub rpc_rate_limit: u32,

    /// JSON file with projectile and hookshot settings
    pub settings_path: Option<PathBuf>,

    /// How long the harness runs before shutting down
    pub harness_seconds: u64,
    /// Seed for the harness scene
    pub harness_seed: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            sim_tick_rate: parse_or(&lookup, "SIM_TICK_RATE", SIMULATION_TPS)?,
            snapshot_rate: parse_or(&lookup, "SNAPSHOT_RATE", SNAPSHOT_TPS)?,
            rpc_rate_limit: parse_or(&lookup, "RPC_RATE_LIMIT", FIRE_RATE_LIMIT)?,

            settings_path: lookup("PROJECTILE_SETTINGS_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            harness_seconds: parse_or(&lookup, "HARNESS_SECONDS", 5)?,
            harness_seed: parse_or(&lookup, "HARNESS_SEED", 7)?,
        })
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            tick_rate: self.sim_tick_rate,
            snapshot_rate: self.snapshot_rate,
            fire_rate_limit: self.rpc_rate_limit,
        }
    }

    /// Settings catalog from the configured file, or an empty one
    pub fn load_catalog(&self) -> Result<SettingsCatalog, SettingsError> {
        match &self.settings_path {
            Some(path) => load_catalog(path),
            None => Ok(SettingsCatalog::new()),
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(default),
    }
}

/// Read a settings catalog from JSON. A missing file is an empty catalog.
pub fn load_catalog(path: &Path) -> Result<SettingsCatalog, SettingsError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(SettingsCatalog::new());
        }
        Err(e) => return Err(SettingsError::Io(path.to_path_buf(), e)),
    };

    let catalog: SettingsCatalog =
        serde_json::from_str(&raw).map_err(|e| SettingsError::Parse(path.to_path_buf(), e))?;
    info!(path = %path.display(), entries = catalog.len(), "Loaded settings catalog");
    Ok(catalog)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

/// Settings file errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse settings file {}: {1}", .0.display())]
    Parse(PathBuf, #[source] serde_json::Error),
}
