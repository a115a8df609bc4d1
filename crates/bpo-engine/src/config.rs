//! Oracle configuration.
//!
//! Protocol constants and host limits. Defaults match the production
//! deployment; override via environment variables, a YAML file loaded by the
//! CLI, or explicit construction in tests.

use bpo_core::{TimeUnit, U256};
use serde::{Deserialize, Serialize};

/// Engine-wide settings shared by every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Fixed-point scale of reported prices.
    pub price_scale: u64,
    /// Denominator of `fee_rate` and `protocol_fee_rate`.
    pub rate_precision: u64,
    /// A creation payment must strictly exceed this.
    pub min_creation_value: u64,
    /// Grace period after the settlement duration for seconds-based reports.
    pub settlement_window_seconds: u64,
    /// Grace period after the settlement duration for tick-based reports.
    pub settlement_window_ticks: u64,
    /// Budget consumed by the dispatcher around a callback invocation.
    pub callback_overhead_gas: u64,
    /// Upper bound on a creator-requested callback budget.
    pub max_callback_gas: u64,
    /// Budget assumed for calls that do not state one.
    pub default_call_gas: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            price_scale: 1_000_000_000_000_000_000,
            rate_precision: 10_000_000,
            min_creation_value: 100,
            settlement_window_seconds: 60,
            settlement_window_ticks: 5,
            callback_overhead_gas: 10_000,
            max_callback_gas: 5_000_000,
            default_call_gas: 30_000_000,
        }
    }
}

impl OracleConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// Variables:
    /// - `BPO_PRICE_SCALE` (default: 1e18)
    /// - `BPO_RATE_PRECISION` (default: 1e7)
    /// - `BPO_MIN_CREATION_VALUE` (default: 100)
    /// - `BPO_SETTLEMENT_WINDOW_SECONDS` (default: 60)
    /// - `BPO_SETTLEMENT_WINDOW_TICKS` (default: 5)
    /// - `BPO_CALLBACK_OVERHEAD_GAS` (default: 10000)
    /// - `BPO_MAX_CALLBACK_GAS` (default: 5000000)
    /// - `BPO_DEFAULT_CALL_GAS` (default: 30000000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();
        let config = Self {
            price_scale: env_u64("BPO_PRICE_SCALE", d.price_scale)?,
            rate_precision: env_u64("BPO_RATE_PRECISION", d.rate_precision)?,
            min_creation_value: env_u64("BPO_MIN_CREATION_VALUE", d.min_creation_value)?,
            settlement_window_seconds: env_u64(
                "BPO_SETTLEMENT_WINDOW_SECONDS",
                d.settlement_window_seconds,
            )?,
            settlement_window_ticks: env_u64(
                "BPO_SETTLEMENT_WINDOW_TICKS",
                d.settlement_window_ticks,
            )?,
            callback_overhead_gas: env_u64("BPO_CALLBACK_OVERHEAD_GAS", d.callback_overhead_gas)?,
            max_callback_gas: env_u64("BPO_MAX_CALLBACK_GAS", d.max_callback_gas)?,
            default_call_gas: env_u64("BPO_DEFAULT_CALL_GAS", d.default_call_gas)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.price_scale == 0 {
            return Err(ConfigError::Zero("price_scale"));
        }
        if self.rate_precision == 0 {
            return Err(ConfigError::Zero("rate_precision"));
        }
        Ok(())
    }

    /// Settlement window length for a report measured in `unit`.
    pub fn settlement_window(&self, unit: TimeUnit) -> u64 {
        match unit {
            TimeUnit::Seconds => self.settlement_window_seconds,
            TimeUnit::Ticks => self.settlement_window_ticks,
        }
    }

    pub fn price_scale(&self) -> U256 {
        U256::from(self.price_scale)
    }

    pub fn rate_precision(&self) -> U256 {
        U256::from(self.rate_precision)
    }
}

fn env_u64(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .replace('_', "")
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
    #[error("{0} must be non-zero")]
    Zero(&'static str),
}
