//! Provider contract and factory.
//!
//! A provider knows how to take one measurement for one metric kind, resume
//! an in-flight one, terminate one, and garbage-collect its own side
//! effects. The engine is agnostic to which variant a metric uses.

pub mod eval;
pub mod query;
pub mod resource;
pub mod template;
pub mod web;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::EngineSettings;
use crate::domain::{AnalysisRun, Measurement, Metric, Phase};
use crate::error::ProviderError;

pub use query::QueryProvider;
pub use resource::ResourceProvider;
pub use web::WebProvider;

/// Capability interface implemented by every measurement backend.
///
/// Calls may block on network I/O; implementations must bound their own
/// request timeouts. Failures are reported as Error-phase measurements with
/// a message, not as panics, so one metric's trouble never takes down the
/// cycle.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Take a fresh measurement. Sets `started_at`; synchronous providers
    /// also set `finished_at` and a terminal phase before returning.
    async fn run(&self, run: &AnalysisRun, metric: &Metric) -> Measurement;

    /// Advance or complete an in-flight measurement. Providers whose work
    /// is synchronous within `run` return the input unchanged.
    async fn resume(
        &self,
        run: &AnalysisRun,
        metric: &Metric,
        in_flight: Measurement,
    ) -> Measurement;

    /// Force-complete an in-flight measurement when the run is stopping early.
    async fn terminate(
        &self,
        run: &AnalysisRun,
        metric: &Metric,
        in_flight: Measurement,
    ) -> Measurement;

    /// Release resources tied to measurements about to be trimmed. A no-op
    /// for stateless providers.
    async fn garbage_collect(
        &self,
        run: &AnalysisRun,
        metric: &Metric,
        retain: usize,
    ) -> Result<(), ProviderError>;

    /// Provider kind for logging and events.
    fn name(&self) -> &'static str;
}

/// Creates the provider matching a metric's configuration.
///
/// Instantiation failure produces an Error-phase measurement in the
/// executor without the provider ever being called.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, metric: &Metric) -> Result<Arc<dyn Provider>, ProviderError>;
}

/// Factory dispatching on whichever provider variant is configured.
///
/// The validator guarantees exactly one variant per metric before any
/// measurement is attempted.
pub struct DefaultProviderFactory {
    client: reqwest::Client,
    settings: EngineSettings,
}

impl DefaultProviderFactory {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn create(&self, metric: &Metric) -> Result<Arc<dyn Provider>, ProviderError> {
        if let Some(spec) = &metric.provider.web {
            return Ok(Arc::new(WebProvider::new(
                self.client.clone(),
                spec.clone(),
                self.settings.web_timeout,
            )));
        }
        if let Some(spec) = &metric.provider.query {
            return Ok(Arc::new(QueryProvider::new(
                self.client.clone(),
                spec.clone(),
                self.settings.query_timeout,
            )));
        }
        if let Some(spec) = &metric.provider.resource {
            return Ok(Arc::new(ResourceProvider::new(
                self.client.clone(),
                spec.clone(),
                self.settings.web_timeout,
            )));
        }
        Err(ProviderError::MissingVariant {
            metric: metric.name.clone(),
        })
    }
}

/// Classify an observed value against a metric's conditions.
///
/// Tie rules: with only one condition present the other defaults to its
/// negation; with both absent every measurement is successful; with both
/// present and neither matching the measurement is inconclusive. Evaluation
/// errors yield an Error phase with the evaluator's message.
pub fn assess_value(metric: &Metric, value: &str) -> (Phase, Option<String>) {
    let success = metric
        .success_condition
        .as_deref()
        .map(|expr| eval::evaluate(expr, value));
    let failure = metric
        .failure_condition
        .as_deref()
        .map(|expr| eval::evaluate(expr, value));

    match (success, failure) {
        (None, None) => (Phase::Successful, None),
        (Some(Err(e)), _) | (_, Some(Err(e))) => (Phase::Error, Some(e.to_string())),
        (Some(Ok(s)), None) => {
            if s {
                (Phase::Successful, None)
            } else {
                (Phase::Failed, None)
            }
        }
        (None, Some(Ok(f))) => {
            if f {
                (Phase::Failed, None)
            } else {
                (Phase::Successful, None)
            }
        }
        (Some(Ok(s)), Some(Ok(f))) => {
            if f {
                (Phase::Failed, None)
            } else if s {
                (Phase::Successful, None)
            } else {
                (Phase::Inconclusive, None)
            }
        }
    }
}

/// Default `resume` for providers that finish their work inside `run`.
pub(crate) fn resume_synchronous(name: &str, in_flight: Measurement) -> Measurement {
    tracing::debug!(provider = name, "Resume called on synchronous provider, returning as-is");
    in_flight
}

/// Default `terminate` for synchronous providers: complete the in-flight
/// measurement as successful so nothing is left dangling.
pub(crate) fn terminate_synchronous(name: &str, mut in_flight: Measurement) -> Measurement {
    tracing::warn!(provider = name, "Terminating in-flight measurement");
    in_flight.phase = Phase::Successful;
    if in_flight.finished_at.is_none() {
        in_flight.finished_at = Some(Utc::now());
    }
    in_flight.message = Some("measurement terminated".into());
    in_flight
}

/// Walk a dot-separated path into a JSON document, rendering the leaf as a
/// bare string so condition expressions see `0.5` rather than `"0.5"`.
pub(crate) fn json_path_value(
    body: &serde_json::Value,
    path: &str,
) -> Result<String, ProviderError> {
    let mut current = body;
    for segment in path.split('.') {
        current = match current {
            serde_json::Value::Object(map) => {
                map.get(segment).ok_or_else(|| ProviderError::Response {
                    reason: format!("response has no field '{segment}' (path '{path}')"),
                })?
            }
            serde_json::Value::Array(items) => {
                let index: usize =
                    segment.parse().map_err(|_| ProviderError::Response {
                        reason: format!("'{segment}' is not an array index (path '{path}')"),
                    })?;
                items.get(index).ok_or_else(|| ProviderError::Response {
                    reason: format!("index {index} out of bounds (path '{path}')"),
                })?
            }
            _ => {
                return Err(ProviderError::Response {
                    reason: format!("cannot descend into scalar at '{segment}' (path '{path}')"),
                })
            }
        };
    }
    Ok(render_scalar(current))
}

pub(crate) fn render_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
