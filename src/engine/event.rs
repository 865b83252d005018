//! Observability boundary: phase-transition events.

use crate::domain::Phase;

/// Event classification. Failed and Error transitions are warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Normal,
    Warning,
}

impl EventLevel {
    /// The level a transition into `phase` should carry.
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Failed | Phase::Error => EventLevel::Warning,
            _ => EventLevel::Normal,
        }
    }
}

/// Sink for phase-transition events on metrics and runs.
///
/// One event is emitted per transition; downstream systems (dashboards,
/// notifications) attach here.
pub trait EventRecorder: Send + Sync {
    fn record(&self, run_name: &str, level: EventLevel, reason: &str, message: &str);
}

/// Default recorder that emits structured tracing events.
pub struct TracingEventRecorder;

impl EventRecorder for TracingEventRecorder {
    fn record(&self, run_name: &str, level: EventLevel, reason: &str, message: &str) {
        match level {
            EventLevel::Normal => {
                tracing::info!(run = %run_name, reason = reason, "{message}");
            }
            EventLevel::Warning => {
                tracing::warn!(run = %run_name, reason = reason, "{message}");
            }
        }
    }
}
