//! Time-series query provider.
//!
//! Runs an instant query against a Prometheus-compatible HTTP API and
//! classifies the scalar sample value. Requests carry a bounded timeout so a
//! stalled store cannot stall the run's requeue clock.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::domain::{AnalysisRun, Measurement, Metric, QueryProviderSpec};
use crate::error::ProviderError;

use super::{assess_value, resume_synchronous, terminate_synchronous, Provider};

pub struct QueryProvider {
    client: reqwest::Client,
    spec: QueryProviderSpec,
    timeout: Duration,
}

impl QueryProvider {
    pub fn new(client: reqwest::Client, spec: QueryProviderSpec, timeout: Duration) -> Self {
        Self {
            client,
            spec,
            timeout,
        }
    }

    async fn query(&self, run: &AnalysisRun) -> Result<String, ProviderError> {
        let query = super::template::resolve(&self.spec.query, &run.spec.args)?;
        let mut url: url::Url = self.spec.address.parse()?;
        url.set_path("/api/v1/query");
        url.query_pairs_mut().append_pair("query", &query);

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Response {
                reason: format!("query endpoint returned {status}"),
            });
        }

        let body: serde_json::Value = response.json().await?;
        extract_sample(&body)
    }
}

/// Pull the first sample value out of an instant-query response.
fn extract_sample(body: &serde_json::Value) -> Result<String, ProviderError> {
    let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("");
    if status != "success" {
        return Err(ProviderError::Response {
            reason: format!("query status '{status}'"),
        });
    }

    let result = body
        .pointer("/data/result")
        .and_then(|r| r.as_array())
        .ok_or_else(|| ProviderError::Response {
            reason: "malformed query response: missing data.result".into(),
        })?;

    let first = result.first().ok_or_else(|| ProviderError::Response {
        reason: "query returned no data".into(),
    })?;

    // Instant vectors carry [timestamp, value]; scalars carry the pair at
    // data.result directly, which still lands here as the first element.
    let value = first
        .pointer("/value/1")
        .ok_or_else(|| ProviderError::Response {
            reason: "malformed query response: sample has no value".into(),
        })?;

    Ok(super::render_scalar(value))
}

#[async_trait]
impl Provider for QueryProvider {
    async fn run(&self, run: &AnalysisRun, metric: &Metric) -> Measurement {
        let now = Utc::now();
        match self.query(run).await {
            Ok(value) => {
                let (phase, message) = assess_value(metric, &value);
                debug!(metric = %metric.name, value = %value, phase = %phase, "Query measurement taken");
                let mut measurement = Measurement::completed(phase, now).with_value(value);
                measurement.finished_at = Some(Utc::now());
                measurement.message = message;
                measurement
            }
            Err(e) => Measurement::errored(e.to_string(), now),
        }
    }

    async fn resume(
        &self,
        _run: &AnalysisRun,
        _metric: &Metric,
        in_flight: Measurement,
    ) -> Measurement {
        resume_synchronous(self.name(), in_flight)
    }

    async fn terminate(
        &self,
        _run: &AnalysisRun,
        _metric: &Metric,
        in_flight: Measurement,
    ) -> Measurement {
        terminate_synchronous(self.name(), in_flight)
    }

    async fn garbage_collect(
        &self,
        _run: &AnalysisRun,
        _metric: &Metric,
        _retain: usize,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "query"
    }
}
