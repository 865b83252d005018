//! Task planning: deciding which metrics need a fresh measurement now.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::debug;

use crate::config::EngineSettings;
use crate::domain::{AnalysisRun, ExecutionPolicy, Measurement, Metric};

/// The unit of work handed to the measurement executor: one metric, plus
/// the in-flight measurement to resume or terminate, if any.
#[derive(Debug, Clone)]
pub struct MetricTask {
    pub metric: Metric,
    pub in_flight: Option<Measurement>,
}

/// Inspect current run state and decide, per metric in spec order, whether
/// to do nothing, resume/terminate an in-flight measurement, or start a
/// fresh one.
///
/// The planner produces at most one task per metric per cycle, which is
/// what guarantees a metric never has two in-flight measurements.
pub fn generate_tasks(
    run: &AnalysisRun,
    now: DateTime<Utc>,
    settings: &EngineSettings,
) -> Vec<MetricTask> {
    let terminating = run.is_terminating();
    let ordered = run.spec.policy == ExecutionPolicy::Ordered;
    let mut tasks = Vec::new();

    for metric in &run.spec.metrics {
        let result = run.result_for(&metric.name);

        // Under the ordered policy metrics run strictly in sequence: stop
        // planning at the first metric that has not completed yet, after
        // deciding its own task.
        let gate_here = ordered && !result.map(|r| r.is_completed()).unwrap_or(false);

        if let Some(task) = plan_metric(run, metric, now, terminating, settings) {
            tasks.push(task);
        }

        if gate_here {
            break;
        }
    }

    tasks
}

fn plan_metric(
    run: &AnalysisRun,
    metric: &Metric,
    now: DateTime<Utc>,
    terminating: bool,
    settings: &EngineSettings,
) -> Option<MetricTask> {
    let result = run.result_for(&metric.name);

    // Completed metrics need no further work.
    if result.map(|r| r.is_completed()).unwrap_or(false) {
        return None;
    }

    let last = result.and_then(|r| r.last_measurement());

    if let Some(last) = last {
        if !last.is_completed() {
            // In-flight: not due yet if the provider asked to be re-polled
            // later.
            if let Some(resume_at) = last.resume_at {
                if resume_at > now {
                    debug!(metric = %metric.name, resume_at = %resume_at, "Not due for resume yet");
                    return None;
                }
            }
            return Some(MetricTask {
                metric: metric.clone(),
                in_flight: Some(last.clone()),
            });
        }
    }

    // A terminating run takes no new measurements; metrics without in-flight
    // work are left for the assessor to finalize.
    if terminating {
        debug!(metric = %metric.name, "Run terminating, skipping new measurement");
        return None;
    }

    match last {
        None => {
            // First measurement: honor the initial delay, counted from the
            // run's start. A run that has not started yet takes nothing.
            // Durations were checked by the validator.
            if let Some(delay) = metric.initial_delay().ok().flatten() {
                let Some(started_at) = run.status.started_at else {
                    return None;
                };
                let due = started_at + chrono_duration(delay);
                if now < due {
                    debug!(metric = %metric.name, due = %due, "Waiting out initial delay");
                    return None;
                }
            }
            Some(MetricTask {
                metric: metric.clone(),
                in_flight: None,
            })
        }
        Some(last) => {
            // Prior measurement finished: stop at the desired count, and
            // otherwise wait out the interval. Metrics without an interval
            // fall back to the error-retry period, which is what re-runs a
            // metric whose only measurement errored.
            let taken = result.map(|r| r.count).unwrap_or(0);
            if metric.effective_count().reached(taken) {
                return None;
            }

            let interval = metric
                .interval()
                .ok()
                .flatten()
                .unwrap_or(settings.error_retry_interval);
            let finished_at = last.finished_at.unwrap_or(now);
            if now <= finished_at + chrono_duration(interval) {
                return None;
            }
            Some(MetricTask {
                metric: metric.clone(),
                in_flight: None,
            })
        }
    }
}

pub(crate) fn chrono_duration(d: std::time::Duration) -> ChronoDuration {
    ChronoDuration::from_std(d).unwrap_or_else(|_| ChronoDuration::max_value())
}
