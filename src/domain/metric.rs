//! Metric specifications: the immutable description of one check.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A run-level argument substitutable into provider configuration strings
/// via `{{args.NAME}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Resolved number of measurements a metric should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveCount {
    /// Take exactly this many measurements.
    Finite(i32),
    /// Repeat on the interval until terminated or a limit trips.
    Unbounded,
}

impl EffectiveCount {
    /// True if `taken` measurements satisfy this count.
    pub fn reached(self, taken: i32) -> bool {
        match self {
            EffectiveCount::Finite(n) => taken >= n,
            EffectiveCount::Unbounded => false,
        }
    }
}

/// One named check with a provider, limits, and scheduling parameters.
///
/// Metrics are immutable once the run is created. Durations are humantime
/// strings (`"30s"`, `"5m"`); the validator rejects unparseable values
/// before any measurement is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    /// Unique name within the run.
    pub name: String,

    /// Repeat period between measurements. Absent means run once, unless
    /// an error retry forces another attempt.
    #[serde(default)]
    pub interval: Option<String>,

    /// Delay before the first measurement, counted from the run's start.
    #[serde(default)]
    pub initial_delay: Option<String>,

    /// Desired number of measurements. Defaults per [`Metric::effective_count`].
    #[serde(default)]
    pub count: Option<i32>,

    /// Boolean expression over `result` that marks a measurement successful.
    #[serde(default)]
    pub success_condition: Option<String>,

    /// Boolean expression over `result` that marks a measurement failed.
    #[serde(default)]
    pub failure_condition: Option<String>,

    /// Failed measurements tolerated before the metric fails.
    #[serde(default)]
    pub failure_limit: i32,

    /// Successful measurements required to pass early, when positive.
    #[serde(default)]
    pub successful_limit: i32,

    /// Inconclusive measurements tolerated before the metric is inconclusive.
    #[serde(default)]
    pub inconclusive_limit: i32,

    /// Consecutive errored measurements tolerated before the metric errors.
    /// Defaults to the engine-wide setting (4) when unset.
    #[serde(default)]
    pub consecutive_error_limit: Option<i32>,

    /// Consecutive successful measurements required to pass early, when set.
    #[serde(default)]
    pub consecutive_successful_limit: Option<i32>,

    /// Exactly one provider variant must be configured.
    pub provider: ProviderSpec,
}

impl Metric {
    /// Parse the repeat interval, if configured.
    pub fn interval(&self) -> Result<Option<Duration>, ValidationError> {
        parse_duration_field(&self.name, "interval", self.interval.as_deref())
    }

    /// Parse the initial delay, if configured.
    pub fn initial_delay(&self) -> Result<Option<Duration>, ValidationError> {
        parse_duration_field(&self.name, "initialDelay", self.initial_delay.as_deref())
    }

    /// The resolved measurement count: explicit `count` wins; with neither
    /// count nor interval the metric runs once; with only an interval it
    /// runs until something else stops it.
    pub fn effective_count(&self) -> EffectiveCount {
        match (self.count, &self.interval) {
            (Some(n), _) => EffectiveCount::Finite(n),
            (None, None) => EffectiveCount::Finite(1),
            (None, Some(_)) => EffectiveCount::Unbounded,
        }
    }
}

fn parse_duration_field(
    metric: &str,
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<Duration>, ValidationError> {
    match value {
        None => Ok(None),
        Some(raw) => humantime::parse_duration(raw).map(Some).map_err(|e| {
            ValidationError::InvalidDuration {
                name: metric.to_string(),
                field,
                reason: e.to_string(),
            }
        }),
    }
}

/// Provider configuration attached to a metric.
///
/// Exactly one variant must be set; the validator enforces this and the
/// factory dispatches on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Probe an HTTP endpoint and evaluate its (optionally JSON) body.
    #[serde(default)]
    pub web: Option<WebProviderSpec>,

    /// Query a metrics time-series store.
    #[serde(default)]
    pub query: Option<QueryProviderSpec>,

    /// Inspect resource state in a cluster control plane.
    #[serde(default)]
    pub resource: Option<ResourceProviderSpec>,
}

impl ProviderSpec {
    /// Number of configured variants. Valid specs have exactly one.
    pub fn variant_count(&self) -> usize {
        usize::from(self.web.is_some())
            + usize::from(self.query.is_some())
            + usize::from(self.resource.is_some())
    }
}

/// HTTP endpoint provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebProviderSpec {
    /// Target URL; supports `{{args.NAME}}` placeholders.
    pub url: String,

    /// Additional request headers.
    #[serde(default)]
    pub headers: Vec<WebHeader>,

    /// Dot-separated path into the JSON response body; the whole body is
    /// used as the result value when unset.
    #[serde(default)]
    pub json_path: Option<String>,

    /// Request timeout as a humantime string. Defaults to the engine setting.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// A single HTTP header for the web provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHeader {
    pub key: String,
    pub value: String,
}

/// Time-series query provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryProviderSpec {
    /// Base address of the time-series store, e.g. `http://prometheus:9090`.
    pub address: String,

    /// Query expression; supports `{{args.NAME}}` placeholders.
    pub query: String,
}

/// Cluster-resource inspection provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceProviderSpec {
    /// Base address of the control-plane API.
    pub address: String,

    /// Resource kind, lowercase plural (e.g. `deployments`).
    pub kind: String,

    /// Resource name; supports `{{args.NAME}}` placeholders.
    pub name: String,

    /// Namespace the resource lives in.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Dot-separated path to the observed value. Defaults to `status.phase`.
    #[serde(default)]
    pub status_path: Option<String>,
}
