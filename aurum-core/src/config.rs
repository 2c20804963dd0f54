//! TOML configuration for the signal core and its collaborators.
//!
//! Every section has defaults, so an empty file is a valid config. `validate`
//! runs on every load: an invalid configuration is rejected before any
//! evaluation cycle starts.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::BarInterval;
use crate::error::SignalError;
use crate::indicators::Smoothing;
use crate::signal::{ClassifierThresholds, ExhaustionBands};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] SignalError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub indicators: IndicatorConfig,
    pub thresholds: ClassifierThresholds,
    pub exhaustion: ExhaustionBands,
    pub market: MarketConfig,
    pub instruments: Instruments,
    pub monitor: MonitorConfig,
    pub telegram: TelegramConfig,
    #[serde(rename = "macro")]
    pub macro_context: MacroConfig,
}

/// EMA spans, ADR period and smoothing convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub fast_span: usize,
    pub slow_span: usize,
    pub adr_period: usize,
    pub smoothing: Smoothing,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_span: 5,
            slow_span: 15,
            adr_period: 14,
            smoothing: Smoothing::Recursive,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.fast_span == 0 {
            return Err(SignalError::config("fast_span must be >= 1"));
        }
        if self.fast_span >= self.slow_span {
            return Err(SignalError::config(format!(
                "fast_span ({}) must be smaller than slow_span ({})",
                self.fast_span, self.slow_span
            )));
        }
        if self.adr_period == 0 {
            return Err(SignalError::config("adr_period must be >= 1"));
        }
        Ok(())
    }
}

/// Data windows and bucket alignment. The daily ADR lookback is independent
/// of the intraday lookback used for the EMAs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub bucket_hours: u32,
    /// IANA zone whose wall clock the buckets align on.
    pub timezone: Tz,
    pub intraday_interval: BarInterval,
    pub intraday_lookback_days: u32,
    pub daily_lookback_days: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            bucket_hours: 4,
            timezone: chrono_tz::America::New_York,
            intraday_interval: BarInterval::OneHour,
            intraday_lookback_days: 60,
            daily_lookback_days: 92,
        }
    }
}

impl MarketConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.bucket_hours == 0 {
            return Err(SignalError::config("bucket_hours must be >= 1"));
        }
        if self.intraday_lookback_days == 0 {
            return Err(SignalError::config("intraday_lookback_days must be >= 1"));
        }
        if self.daily_lookback_days < 2 {
            return Err(SignalError::config(
                "daily_lookback_days must be >= 2 for an ADR estimate",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub label: String,
}

/// Monitored instruments; gold and silver futures by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instruments(pub Vec<InstrumentConfig>);

impl Default for Instruments {
    fn default() -> Self {
        Self(vec![
            InstrumentConfig {
                symbol: "GC=F".into(),
                label: "Gold".into(),
            },
            InstrumentConfig {
                symbol: "SI=F".into(),
                label: "Silver".into(),
            },
        ])
    }
}

impl Instruments {
    pub fn iter(&self) -> impl Iterator<Item = &InstrumentConfig> {
        self.0.iter()
    }

    /// Display label for a symbol, falling back to the symbol itself.
    pub fn label_for<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.0
            .iter()
            .find(|i| i.symbol == symbol)
            .map(|i| i.label.as_str())
            .unwrap_or(symbol)
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if self.0.is_empty() {
            return Err(SignalError::config("at least one instrument is required"));
        }
        check_symbols(&self.0)
    }
}

fn check_symbols(entries: &[InstrumentConfig]) -> Result<(), SignalError> {
    let mut seen = HashSet::new();
    for inst in entries {
        if inst.symbol.trim().is_empty() {
            return Err(SignalError::config("instrument symbol must not be empty"));
        }
        if !seen.insert(inst.symbol.as_str()) {
            return Err(SignalError::config(format!(
                "duplicate instrument symbol '{}'",
                inst.symbol
            )));
        }
    }
    Ok(())
}

/// Macro backdrop quoted beside the metals: dollar index, 10-year yield,
/// the metals themselves and the S&P 500, over roughly six months of
/// daily bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroConfig {
    pub lookback_days: u32,
    pub symbols: Vec<InstrumentConfig>,
}

impl Default for MacroConfig {
    fn default() -> Self {
        let entry = |symbol: &str, label: &str| InstrumentConfig {
            symbol: symbol.into(),
            label: label.into(),
        };
        Self {
            lookback_days: 183,
            symbols: vec![
                entry("DX-Y.NYB", "DXY"),
                entry("^TNX", "US10Y"),
                entry("GC=F", "Gold"),
                entry("SI=F", "Silver"),
                entry("^GSPC", "S&P 500"),
            ],
        }
    }
}

impl MacroConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.lookback_days < 2 {
            return Err(SignalError::config(
                "macro.lookback_days must be >= 2 to measure a change",
            ));
        }
        check_symbols(&self.symbols)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub refresh_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { refresh_secs: 60 }
    }
}

/// Telegram delivery of crossover alerts. The bot token is read from the
/// environment variable named by `token_env`, never from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub chat_id: String,
    pub token_env: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            chat_id: String::new(),
            token_env: "AURUM_TELEGRAM_TOKEN".into(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        self.indicators.validate()?;
        self.thresholds.validate()?;
        self.exhaustion.validate()?;
        self.market.validate()?;
        self.instruments.validate()?;
        self.macro_context.validate()?;
        if self.monitor.refresh_secs == 0 {
            return Err(SignalError::config("refresh_secs must be >= 1"));
        }
        if self.telegram.enabled && self.telegram.chat_id.trim().is_empty() {
            return Err(SignalError::config(
                "telegram.chat_id is required when telegram is enabled",
            ));
        }
        Ok(())
    }
}
