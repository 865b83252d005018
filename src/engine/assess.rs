//! Status assessment: per-metric phases and the aggregate run verdict.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::EngineSettings;
use crate::domain::{AnalysisRun, Metric, MetricResult, Phase};

use super::event::{EventLevel, EventRecorder};

/// Derive a metric's phase from its measurement history and limits.
///
/// Evaluated against the freshest counters each cycle; a phase that is
/// already terminal is kept as-is. The checks apply in a fixed precedence
/// and the first match wins.
pub fn assess_metric_status(
    metric: &Metric,
    result: &MetricResult,
    terminating: bool,
    settings: &EngineSettings,
) -> Phase {
    if result.phase.is_completed() {
        return result.phase;
    }

    let Some(last) = result.last_measurement() else {
        // Nothing measured. A terminating run has nothing left to measure,
        // so the metric passes vacuously.
        return if terminating {
            Phase::Successful
        } else {
            Phase::Pending
        };
    };

    if !last.is_completed() {
        return Phase::Running;
    }

    if result.failed > metric.failure_limit {
        return Phase::Failed;
    }
    if metric.successful_limit > 0 && result.successful >= metric.successful_limit {
        return Phase::Successful;
    }
    if result.inconclusive > metric.inconclusive_limit {
        return Phase::Inconclusive;
    }
    if result.consecutive_error > settings.consecutive_error_limit_for(metric) {
        return Phase::Error;
    }
    if let Some(limit) = metric.consecutive_successful_limit {
        if result.consecutive_successful >= limit {
            return Phase::Successful;
        }
    }
    if metric.effective_count().reached(result.count) {
        return Phase::Successful;
    }
    if terminating {
        return Phase::Successful;
    }

    Phase::Running
}

/// Recompute every metric's phase and fold them into the run's overall
/// phase under the worst-status rule.
///
/// Stamps `started_at` on the first assessment. Metric transitions into a
/// terminal phase each emit one event. The run stays `Running` until every
/// metric has a terminal result.
pub fn assess_run_status(
    run: &mut AnalysisRun,
    settings: &EngineSettings,
    events: &dyn EventRecorder,
    now: DateTime<Utc>,
) -> Phase {
    if run.status.started_at.is_none() {
        run.status.started_at = Some(now);
    }

    let terminating = run.is_terminating();
    let mut worst = Phase::Successful;
    let mut worst_message: Option<String> = None;
    let mut everything_completed = true;

    for metric in run.spec.metrics.clone() {
        let result = run.result_for_or_default(&metric.name);
        let previous = result.phase;
        let assessed = assess_metric_status(&metric, result, terminating, settings);

        if assessed != previous {
            result.phase = assessed;
            if assessed.is_completed() {
                info!(
                    metric = %metric.name,
                    from = %previous,
                    to = %assessed,
                    "Metric completed"
                );
                let name = run.name.clone();
                events.record(
                    &name,
                    EventLevel::for_phase(assessed),
                    "MetricAssessed",
                    &format!("metric '{}' completed {assessed}", metric.name),
                );
            }
        }

        let result = run
            .result_for(&metric.name)
            .expect("result slot just ensured");
        if !result.is_completed() {
            everything_completed = false;
        } else if result.phase.worst(worst) != worst {
            worst = result.phase;
            worst_message = result
                .message
                .clone()
                .or_else(|| result.last_measurement().and_then(|m| m.message.clone()));
        }
    }

    if !everything_completed {
        return Phase::Running;
    }

    if worst.is_completed() {
        run.status.message = worst_message;
    }
    worst
}
