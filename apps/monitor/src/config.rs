//! Application configuration.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::Deserialize;
use spread_alerts::TelegramConfig;
use spread_core::{Exchange, Symbol};
use spread_engine::DetectorConfig;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Application configuration, loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Exchanges to poll.
    pub exchanges: Vec<Exchange>,
    /// Symbols to scan. Empty means every symbol listed on at least two
    /// exchanges.
    pub symbols: Vec<Symbol>,
    /// Spread filters and quality weights.
    pub spread: DetectorConfig,
    pub cooldown: CooldownSettings,
    pub telegram: TelegramConfig,
    pub monitoring: MonitoringSettings,
    pub blacklist: BlacklistSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exchanges: Exchange::all().to_vec(),
            symbols: Vec::new(),
            spread: DetectorConfig::default(),
            cooldown: CooldownSettings::default(),
            telegram: TelegramConfig::default(),
            monitoring: MonitoringSettings::default(),
            blacklist: BlacklistSettings::default(),
        }
    }
}

/// Alert deduplication settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CooldownSettings {
    /// Minimum seconds between alerts for the same symbol and exchange pair.
    pub window_secs: u64,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self { window_secs: 300 }
    }
}

impl CooldownSettings {
    pub fn window(&self) -> Duration {
        // chrono caps durations at i64::MAX milliseconds
        let max_secs = (i64::MAX / 1000) as u64;
        Duration::seconds(self.window_secs.min(max_secs) as i64)
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
    /// Target seconds between cycle starts.
    #[serde(alias = "scan_interval_seconds")]
    pub scan_interval_secs: u64,
    /// HTTP timeout for exchange and Telegram requests.
    pub request_timeout_secs: u64,
    /// Prune cooldowns and log stats every this many cycles.
    pub stats_every_cycles: u64,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            scan_interval_secs: 30,
            request_timeout_secs: 10,
            stats_every_cycles: 30,
        }
    }
}

impl MonitoringSettings {
    pub fn scan_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scan_interval_secs)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

/// Blacklist file settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlacklistSettings {
    pub path: PathBuf,
    /// Symbols added at every startup.
    pub initial: Vec<Symbol>,
}

impl Default for BlacklistSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("blacklist.json"),
            initial: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read `path`, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&raw)?;
        config.telegram.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // an empty file deserializes as null
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Configured exchanges with duplicates removed, in first-seen order.
    pub fn unique_exchanges(&self) -> Vec<Exchange> {
        let mut seen = BTreeSet::new();
        self.exchanges
            .iter()
            .copied()
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// Checks that hold for every mode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unique_exchanges().len() < 2 {
            return Err(ConfigError::Invalid(
                "at least two distinct exchanges are required".to_string(),
            ));
        }
        if self.spread.min_spread_percent <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "spread.min_percent must be positive".to_string(),
            ));
        }
        if self.spread.high_spread_percent < self.spread.min_spread_percent {
            return Err(ConfigError::Invalid(
                "spread.high_spread_percent must not be below spread.min_percent".to_string(),
            ));
        }
        if self.monitoring.scan_interval_secs == 0 || self.monitoring.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "monitoring intervals must be at least one second".to_string(),
            ));
        }
        if self.monitoring.stats_every_cycles == 0 {
            return Err(ConfigError::Invalid(
                "monitoring.stats_every_cycles must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks for modes that talk to Telegram.
    pub fn require_telegram(&self) -> Result<(), ConfigError> {
        if !self.telegram.is_configured() {
            return Err(ConfigError::Invalid(format!(
                "telegram.bot_token and telegram.chat_id are required (or {} / {})",
                TelegramConfig::TOKEN_ENV,
                TelegramConfig::CHAT_ID_ENV
            )));
        }
        Ok(())
    }
}
