//! Configuration loading and engine-wide settings.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, Result};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.workers",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.engine.measurement_retention == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.measurement_retention",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

/// Tunable engine defaults.
///
/// These are named configuration values rather than process-wide constants
/// so tests and embedders can override them; the `Default` impl carries the
/// conventional fallbacks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Retry period for a metric whose last measurement errored and which
    /// has no interval of its own.
    #[serde(with = "humantime_serde")]
    pub error_retry_interval: Duration,

    /// Consecutive errored measurements tolerated before a metric errors,
    /// for metrics that do not set their own limit.
    pub consecutive_error_limit: i32,

    /// Measurements retained per metric; older entries are garbage-collected.
    pub measurement_retention: usize,

    /// Bounded timeout applied to time-series query requests.
    #[serde(with = "humantime_serde")]
    pub query_timeout: Duration,

    /// Default timeout for web provider requests.
    #[serde(with = "humantime_serde")]
    pub web_timeout: Duration,

    /// Reconciling workers in the pool.
    pub workers: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            error_retry_interval: Duration::from_secs(10),
            consecutive_error_limit: 4,
            measurement_retention: 10,
            query_timeout: Duration::from_secs(30),
            web_timeout: Duration::from_secs(10),
            workers: num_cpus::get(),
        }
    }
}

impl EngineSettings {
    /// The consecutive-error limit in effect for a metric.
    pub fn consecutive_error_limit_for(&self, metric: &crate::domain::Metric) -> i32 {
        metric
            .consecutive_error_limit
            .unwrap_or(self.consecutive_error_limit)
    }
}
