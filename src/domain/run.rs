//! Analysis runs: one execution of a set of metric checks gating a
//! deployment step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::measurement::MetricResult;
use super::metric::{Argument, Metric};
use super::phase::Phase;

/// How metrics are dispatched within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionPolicy {
    /// All due metrics are measured concurrently each cycle.
    #[default]
    Parallel,
    /// Metrics complete strictly in spec order; a metric is not started
    /// until every earlier one has a terminal result.
    Ordered,
}

/// Immutable specification of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    /// The checks to perform. Never empty in a valid run.
    pub metrics: Vec<Metric>,

    /// Arguments substitutable into provider configuration.
    #[serde(default)]
    pub args: Vec<Argument>,

    /// Operator-requested early stop.
    #[serde(default)]
    pub terminate: bool,

    #[serde(default)]
    pub policy: ExecutionPolicy,
}

/// Mutable status of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub phase: Phase,

    /// The most recent human-readable explanation for the current phase.
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub metric_results: Vec<MetricResult>,

    /// Stamped on the first status assessment.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// The unit of work: a named run specification plus its mutable status.
///
/// The enclosing controller owns the stored object; the engine receives a
/// deep copy, mutates it, and hands it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub name: String,
    pub spec: RunSpec,
    #[serde(default)]
    pub status: RunStatus,
}

impl AnalysisRun {
    pub fn result_for(&self, metric_name: &str) -> Option<&MetricResult> {
        self.status
            .metric_results
            .iter()
            .find(|r| r.name == metric_name)
    }

    pub fn result_for_mut(&mut self, metric_name: &str) -> Option<&mut MetricResult> {
        self.status
            .metric_results
            .iter_mut()
            .find(|r| r.name == metric_name)
    }

    /// Fetch or create the result slot for a metric.
    pub fn result_for_or_default(&mut self, metric_name: &str) -> &mut MetricResult {
        let pos = self
            .status
            .metric_results
            .iter()
            .position(|r| r.name == metric_name);
        match pos {
            Some(i) => &mut self.status.metric_results[i],
            None => {
                self.status
                    .metric_results
                    .push(MetricResult::new(metric_name));
                self.status
                    .metric_results
                    .last_mut()
                    .expect("just pushed")
            }
        }
    }

    /// True when the run is winding down: either the operator set the
    /// terminate flag, or some metric already reached a failing terminal
    /// phase and the remaining metrics only need to be drained.
    pub fn is_terminating(&self) -> bool {
        if self.spec.terminate {
            return true;
        }
        self.status.metric_results.iter().any(|r| {
            matches!(r.phase, Phase::Failed | Phase::Error | Phase::Inconclusive)
        })
    }

    /// Look up an argument value by name.
    pub fn arg_value(&self, name: &str) -> Option<&str> {
        self.spec
            .args
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }
}
