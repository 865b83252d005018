//! The reconciliation engine.
//!
//! One reconciliation cycle flows in a single direction: validate → plan
//! tasks → execute measurements (fan-out/fan-in) → assess statuses →
//! garbage-collect → compute the next wake time. The engine receives a run
//! value, mutates a copy, and hands it back; persistence and queueing live
//! with the caller.

pub mod assess;
pub mod event;
pub mod executor;
pub mod gc;
pub mod planner;
pub mod schedule;
pub mod validate;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::domain::{AnalysisRun, Phase};
use crate::provider::ProviderFactory;

use event::{EventLevel, EventRecorder, TracingEventRecorder};

/// Result of one reconciliation cycle.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The updated run, to be persisted by the caller.
    pub run: AnalysisRun,
    /// Earliest instant the run next needs attention, if any.
    pub requeue_at: Option<DateTime<Utc>>,
}

/// Orchestrates the reconciliation steps for analysis runs.
pub struct Reconciler {
    settings: EngineSettings,
    factory: Arc<dyn ProviderFactory>,
    events: Arc<dyn EventRecorder>,
}

impl Reconciler {
    pub fn new(settings: EngineSettings, factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            settings,
            factory,
            events: Arc::new(TracingEventRecorder),
        }
    }

    /// Swap the event sink; used by embedders and tests.
    pub fn with_recorder(mut self, events: Arc<dyn EventRecorder>) -> Self {
        self.events = events;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one reconciliation cycle against a copy of the given run.
    ///
    /// A run that already reached a terminal phase is returned unchanged;
    /// terminal phases are never reassigned.
    pub async fn reconcile(&self, stored: &AnalysisRun, now: DateTime<Utc>) -> ReconcileOutcome {
        let cycle_started = std::time::Instant::now();
        let mut run = stored.clone();

        if run.status.phase.is_completed() {
            debug!(run = %run.name, phase = %run.status.phase, "Run already terminal");
            return ReconcileOutcome {
                run,
                requeue_at: None,
            };
        }

        // First pass only: a structurally invalid run takes no measurements
        // and goes straight to a terminal error.
        if run.status.metric_results.is_empty() {
            if let Err(e) = validate::validate_metrics(&run.spec.metrics) {
                warn!(run = %run.name, error = %e, "Run specification invalid");
                run.status.phase = Phase::Error;
                run.status.message = Some(e.to_string());
                self.events.record(
                    &run.name,
                    EventLevel::Warning,
                    "SpecInvalid",
                    &format!("run failed validation: {e}"),
                );
                return ReconcileOutcome {
                    run,
                    requeue_at: None,
                };
            }
        }

        let terminating = run.is_terminating();
        let tasks = planner::generate_tasks(&run, now, &self.settings);
        debug!(run = %run.name, tasks = tasks.len(), terminating, "Planned metric tasks");

        executor::run_measurements(&mut run, tasks, self.factory.as_ref(), terminating).await;

        let assessed =
            assess::assess_run_status(&mut run, &self.settings, self.events.as_ref(), now);
        if assessed != run.status.phase {
            info!(
                run = %run.name,
                from = %run.status.phase,
                to = %assessed,
                "Run phase changed"
            );
            self.events.record(
                &run.name,
                EventLevel::for_phase(assessed),
                "RunAssessed",
                &format!("run transitioned to {assessed}"),
            );
            run.status.phase = assessed;
        }

        // Retention trimming is best-effort: a failing provider must not
        // block assessment or rescheduling.
        if let Err(e) =
            gc::garbage_collect(&mut run, self.settings.measurement_retention, self.factory.as_ref())
                .await
        {
            warn!(run = %run.name, error = %e, "Measurement garbage collection failed");
        }

        let requeue_at = if run.status.phase.is_completed() {
            None
        } else {
            schedule::next_reconcile_time(&run, &self.settings)
        };

        debug!(
            run = %run.name,
            phase = %run.status.phase,
            requeue_at = ?requeue_at,
            elapsed_ms = cycle_started.elapsed().as_millis() as u64,
            "Reconciliation cycle finished"
        );

        ReconcileOutcome { run, requeue_at }
    }
}
