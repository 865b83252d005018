//! HTTP endpoint provider.
//!
//! Probes a URL, optionally extracts a value from the JSON body, and
//! classifies it against the metric's conditions. The whole measurement is
//! synchronous within `run`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::domain::{AnalysisRun, Measurement, Metric, WebProviderSpec};
use crate::error::ProviderError;

use super::{assess_value, resume_synchronous, terminate_synchronous, Provider};

pub struct WebProvider {
    client: reqwest::Client,
    spec: WebProviderSpec,
    default_timeout: Duration,
}

impl WebProvider {
    pub fn new(client: reqwest::Client, spec: WebProviderSpec, default_timeout: Duration) -> Self {
        Self {
            client,
            spec,
            default_timeout,
        }
    }

    fn timeout(&self) -> Result<Duration, ProviderError> {
        match &self.spec.timeout {
            None => Ok(self.default_timeout),
            Some(raw) => humantime::parse_duration(raw).map_err(|e| ProviderError::Response {
                reason: format!("invalid web provider timeout '{raw}': {e}"),
            }),
        }
    }

    async fn measure(&self, run: &AnalysisRun, metric: &Metric) -> Result<String, ProviderError> {
        let url = super::template::resolve(&self.spec.url, &run.spec.args)?;
        let url: url::Url = url.parse()?;

        let mut request = self.client.get(url).timeout(self.timeout()?);
        for header in &self.spec.headers {
            let value = super::template::resolve(&header.value, &run.spec.args)?;
            request = request.header(&header.key, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Response {
                reason: format!("endpoint returned {status}"),
            });
        }

        let body = response.text().await?;
        let value = match &self.spec.json_path {
            None => body.trim().to_string(),
            Some(path) => {
                let json: serde_json::Value =
                    serde_json::from_str(&body).map_err(|e| ProviderError::Response {
                        reason: format!("response is not JSON: {e}"),
                    })?;
                super::json_path_value(&json, path)?
            }
        };

        debug!(metric = %metric.name, value = %value, "Web measurement taken");
        Ok(value)
    }
}

#[async_trait]
impl Provider for WebProvider {
    async fn run(&self, run: &AnalysisRun, metric: &Metric) -> Measurement {
        let now = Utc::now();
        match self.measure(run, metric).await {
            Ok(value) => {
                let (phase, message) = assess_value(metric, &value);
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
        // Stateless: nothing to release.
        Ok(())
    }

    fn name(&self) -> &'static str {
        "web"
    }
}
