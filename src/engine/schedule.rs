//! Next-reconcile-time computation.
//!
//! Instead of busy-polling, the enclosing worker requeues the run at the
//! earliest future instant any metric will next need attention.

use chrono::{DateTime, Utc};

use crate::config::EngineSettings;
use crate::domain::{AnalysisRun, Metric, Phase};

use super::planner::chrono_duration;

/// The earliest instant any non-completed metric next needs attention, or
/// `None` when nothing is left to schedule. Callers clamp past instants to
/// "now" before requeueing.
pub fn next_reconcile_time(
    run: &AnalysisRun,
    settings: &EngineSettings,
) -> Option<DateTime<Utc>> {
    run.spec
        .metrics
        .iter()
        .filter_map(|metric| metric_due_time(run, metric, settings))
        .min()
}

fn metric_due_time(
    run: &AnalysisRun,
    metric: &Metric,
    settings: &EngineSettings,
) -> Option<DateTime<Utc>> {
    let result = run.result_for(&metric.name);
    if result.map(|r| r.is_completed()).unwrap_or(false) {
        return None;
    }

    let last = result.and_then(|r| r.last_measurement());

    match last {
        // Never measured: the only computable time is the end of the
        // initial delay, and only once the run has started.
        None => {
            let delay = metric.initial_delay().ok().flatten()?;
            let started_at = run.status.started_at?;
            Some(started_at + chrono_duration(delay))
        }
        Some(last) if !last.is_completed() => last.resume_at,
        Some(last) => {
            let result = result.expect("measurement implies result");
            if metric.effective_count().reached(result.count) {
                return None;
            }
            let interval = match metric.interval().ok().flatten() {
                Some(interval) => interval,
                // No interval: only an errored measurement earns a retry.
                None if last.phase == Phase::Error => settings.error_retry_interval,
                None => return None,
            };
            let finished_at = last.finished_at?;
            Some(finished_at + chrono_duration(interval))
        }
    }
}

/// Convenience used by workers: the same instant, clamped to now.
pub fn requeue_delay(
    run: &AnalysisRun,
    settings: &EngineSettings,
    now: DateTime<Utc>,
) -> Option<std::time::Duration> {
    let due = next_reconcile_time(run, settings)?;
    Some((due - now).to_std().unwrap_or(std::time::Duration::ZERO))
}
