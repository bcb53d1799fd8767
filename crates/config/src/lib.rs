//! Node configuration, read from a TOML file and overridden by environment variables.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

use core::fmt;
use core::str::FromStr;
use std::path::Path;

use serde::{Deserialize, Serialize};

mod utils;

use utils::from_anything;

/// Prefix of the environment variables overriding the configuration file.
pub const DEFAULT_ENV_PREFIX: &str = "ANCHOR";

/// Node configuration options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// A custom human-readable name for this node
    pub moniker: String,

    /// Log configuration options
    pub logging: LoggingConfig,

    /// Side-channel configuration options
    pub side_channel: SideChannelConfig,

    /// Fee top-up configuration options
    pub topup: TopupConfig,

    /// Metrics configuration options
    pub metrics: MetricsConfig,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plaintext" => Ok(Self::Plaintext),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideChannelConfig {
    /// Blocks between the commit of a side transaction and the replay of its post handler.
    /// Votes on a transaction committed at `H` are complete when `H + tx_delay` begins.
    #[serde(deserialize_with = "from_anything")]
    pub tx_delay: u64,

    /// Remove a height's validator snapshot once its side transactions have been replayed
    #[serde(deserialize_with = "from_anything")]
    pub prune_validator_snapshots: bool,
}

impl Default for SideChannelConfig {
    fn default() -> Self {
        Self {
            tx_delay: 2,
            prune_validator_snapshots: true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopupConfig {
    /// Confirmations a deposit needs on the external chain before validators vote on it
    #[serde(deserialize_with = "from_anything")]
    pub tx_confirmations: u64,

    /// Fee paid by a credited validator to the relayer of its deposit, in the smallest unit
    #[serde(deserialize_with = "from_anything")]
    pub fee_per_tx: u64,

    /// Multiplier of the block number in a deposit's replay sequence
    #[serde(deserialize_with = "from_anything")]
    pub log_index_unit: u64,
}

impl Default for TopupConfig {
    fn default() -> Self {
        Self {
            tx_confirmations: 6,
            fee_per_tx: 1_000_000_000_000_000,
            log_index_unit: 100_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Register the node's metrics in the shared registry
    #[serde(deserialize_with = "from_anything")]
    pub enabled: bool,

    /// Prefix of every metric name
    pub prefix: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "anchor".to_string(),
        }
    }
}

impl Config {
    /// Rejects settings the node cannot run with.
    pub fn validate(&self) -> eyre::Result<()> {
        eyre::ensure!(
            self.side_channel.tx_delay >= 1,
            "side_channel.tx_delay must be at least 1, got {}",
            self.side_channel.tx_delay
        );

        Ok(())
    }
}

/// Parses the environment variables and loads the provided config file path
/// to create a [`Config`].
///
/// Variables are named `{PREFIX}__{SECTION}__{KEY}`, e.g. `ANCHOR__SIDE_CHANNEL__TX_DELAY`.
pub fn load_config(path: impl AsRef<Path>, prefix: Option<&str>) -> eyre::Result<Config> {
    let config: Config = ::config::Config::builder()
        .add_source(::config::File::from(path.as_ref()))
        .add_source(
            ::config::Environment::with_prefix(prefix.unwrap_or(DEFAULT_ENV_PREFIX))
                .separator("__"),
        )
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}
