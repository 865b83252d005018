//! Cluster-resource inspection provider.
//!
//! Fetches a resource from a control-plane API and classifies a field of
//! its status. Patch mechanics and watch machinery live outside this crate;
//! this adapter only satisfies the common provider contract.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::domain::{AnalysisRun, Measurement, Metric, ResourceProviderSpec};
use crate::error::ProviderError;

use super::{assess_value, resume_synchronous, terminate_synchronous, Provider};

const DEFAULT_STATUS_PATH: &str = "status.phase";

pub struct ResourceProvider {
    client: reqwest::Client,
    spec: ResourceProviderSpec,
    timeout: Duration,
}

impl ResourceProvider {
    pub fn new(client: reqwest::Client, spec: ResourceProviderSpec, timeout: Duration) -> Self {
        Self {
            client,
            spec,
            timeout,
        }
    }

    async fn inspect(&self, run: &AnalysisRun) -> Result<String, ProviderError> {
        let name = super::template::resolve(&self.spec.name, &run.spec.args)?;
        let mut url: url::Url = self.spec.address.parse()?;
        let path = match &self.spec.namespace {
            Some(ns) => format!("/apis/{}/namespaces/{}/{}", self.spec.kind, ns, name),
            None => format!("/apis/{}/{}", self.spec.kind, name),
        };
        url.set_path(&path);

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Response {
                reason: format!("control plane returned {status} for {path}"),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let status_path = self
            .spec
            .status_path
            .as_deref()
            .unwrap_or(DEFAULT_STATUS_PATH);
        super::json_path_value(&body, status_path)
    }
}

#[async_trait]
impl Provider for ResourceProvider {
    async fn run(&self, run: &AnalysisRun, metric: &Metric) -> Measurement {
        let now = Utc::now();
        match self.inspect(run).await {
            Ok(value) => {
                let (phase, message) = assess_value(metric, &value);
                debug!(metric = %metric.name, value = %value, "Resource state inspected");
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
        "resource"
    }
}
