use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level settings. Every section falls back to its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub ledger: LedgerConfig,
    pub breaker: BreakerConfig,
    pub sampler: SamplerConfig,
    pub stream: StreamConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Upper bound for any single ledger port call.
    pub call_ceiling_ms: u64,
}

impl LedgerConfig {
    pub fn call_ceiling(&self) -> Duration {
        Duration::from_millis(self.call_ceiling_ms)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            call_ceiling_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Cool-down before an open circuit moves to half-open.
    pub recovery_time_ms: u64,
    /// Successes in half-open needed to close the circuit.
    pub half_open_max_requests: u32,
    pub call_timeout_ms: u64,
}

impl BreakerConfig {
    pub fn recovery_time(&self) -> Duration {
        Duration::from_millis(self.recovery_time_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_time_ms: 10_000,
            half_open_max_requests: 2,
            call_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub interval_secs: u64,
    /// How long a freshly sampled rate is marked valid for.
    pub validity_secs: u64,
    /// Largest absolute change applied to a rate in one tick.
    pub max_step: Decimal,
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.validity_secs as i64)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            validity_secs: 30,
            max_step: dec!(2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Delay between two exchange-rate snapshots on a stream.
    pub exchange_interval_ms: u64,
}

impl StreamConfig {
    pub fn exchange_interval(&self) -> Duration {
        Duration::from_millis(self.exchange_interval_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            exchange_interval_ms: 5_000,
        }
    }
}
