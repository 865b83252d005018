//! Concurrent measurement execution.
//!
//! Fans out one task per planned metric, joins them all, then folds every
//! returned measurement into the run. Each spawned task owns its own result
//! slot, so the merge after the join barrier needs no locking and the
//! reconciler never observes a partially-updated result set.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::{AnalysisRun, Measurement};
use crate::provider::ProviderFactory;

use super::planner::MetricTask;

struct TaskOutcome {
    metric_name: String,
    measurement: Measurement,
    /// False when the task completed an in-flight measurement instead of
    /// starting a new one.
    fresh: bool,
}

/// Execute all planned tasks concurrently and merge their measurements into
/// the run. Returns only after every dispatched task has completed.
pub async fn run_measurements(
    run: &mut AnalysisRun,
    tasks: Vec<MetricTask>,
    factory: &dyn ProviderFactory,
    terminating: bool,
) {
    if tasks.is_empty() {
        return;
    }

    // Tasks read the run (args, spec) but never write it; writes happen
    // after the barrier below.
    let snapshot = Arc::new(run.clone());

    let handles: Vec<_> = tasks
        .into_iter()
        .map(|task| {
            let snapshot = Arc::clone(&snapshot);
            let provider = factory.create(&task.metric);
            tokio::spawn(async move {
                execute_task(snapshot, task, provider, terminating).await
            })
        })
        .collect();

    for joined in join_all(handles).await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                // A panicked task loses its measurement; nothing to merge.
                warn!(error = %e, "Measurement task aborted");
                continue;
            }
        };
        merge_outcome(run, outcome);
    }
}

async fn execute_task(
    run: Arc<AnalysisRun>,
    task: MetricTask,
    provider: Result<Arc<dyn crate::provider::Provider>, crate::error::ProviderError>,
    terminating: bool,
) -> TaskOutcome {
    let metric = task.metric;
    let fresh = task.in_flight.is_none();

    let provider = match provider {
        Ok(p) => p,
        Err(e) => {
            // Bad provider config measures nothing: surface the failure as
            // an errored measurement for this metric only.
            return TaskOutcome {
                metric_name: metric.name.clone(),
                measurement: Measurement::errored(e.to_string(), Utc::now()),
                fresh,
            };
        }
    };

    let started = std::time::Instant::now();
    let measurement = match task.in_flight {
        None => provider.run(&run, &metric).await,
        Some(in_flight) if terminating => provider.terminate(&run, &metric, in_flight).await,
        Some(in_flight) => provider.resume(&run, &metric, in_flight).await,
    };
    debug!(
        metric = %metric.name,
        provider = provider.name(),
        phase = %measurement.phase,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Measurement returned"
    );

    TaskOutcome {
        metric_name: metric.name,
        measurement,
        fresh,
    }
}

fn merge_outcome(run: &mut AnalysisRun, outcome: TaskOutcome) {
    let mut measurement = outcome.measurement;
    if measurement.is_completed() && measurement.finished_at.is_none() {
        measurement.finished_at = Some(Utc::now());
    }
    run.result_for_or_default(&outcome.metric_name)
        .record(measurement, outcome.fresh);
}
