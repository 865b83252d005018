//! Measurements and per-metric aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// One concrete observation taken for a metric at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub phase: Phase,

    /// Human-readable explanation for the phase, when there is one.
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// When a provider asks to be re-polled later without starting a new
    /// measurement, this carries the earliest instant to do so.
    #[serde(default)]
    pub resume_at: Option<DateTime<Utc>>,

    /// Free-form observed value, kept for diagnostics and condition display.
    #[serde(default)]
    pub value: Option<String>,
}

impl Measurement {
    /// A measurement that just started running.
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Running,
            started_at: Some(now),
            ..Default::default()
        }
    }

    /// A measurement that completed in one shot.
    pub fn completed(phase: Phase, now: DateTime<Utc>) -> Self {
        Self {
            phase,
            started_at: Some(now),
            finished_at: Some(now),
            ..Default::default()
        }
    }

    /// An errored measurement carrying a diagnostic message.
    pub fn errored(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Error,
            message: Some(message.into()),
            started_at: Some(now),
            finished_at: Some(now),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// True once the measurement reached a terminal phase.
    pub fn is_completed(&self) -> bool {
        self.phase.is_completed()
    }
}

/// Mutable aggregate tracked per metric: phase, measurement history, and
/// running counters.
///
/// `count` only ever increases; counters never decrease. The measurement
/// list is append-only until garbage collection trims old entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub name: String,
    pub phase: Phase,

    /// Mirrors the latest measurement's message.
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub measurements: Vec<Measurement>,

    #[serde(default)]
    pub count: i32,
    #[serde(default)]
    pub successful: i32,
    #[serde(default)]
    pub failed: i32,
    #[serde(default)]
    pub inconclusive: i32,
    #[serde(default)]
    pub error: i32,

    /// Immediately-preceding errored measurements, reset by any other outcome.
    #[serde(default)]
    pub consecutive_error: i32,

    /// Immediately-preceding successful measurements, reset by any other outcome.
    #[serde(default)]
    pub consecutive_successful: i32,
}

impl MetricResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn last_measurement(&self) -> Option<&Measurement> {
        self.measurements.last()
    }

    /// True once the metric's phase is terminal.
    pub fn is_completed(&self) -> bool {
        self.phase.is_completed()
    }

    /// Fold a returned measurement into this result.
    ///
    /// Fresh measurements are appended; resumed ones overwrite the last
    /// entry. A terminal measurement bumps exactly one outcome counter and
    /// the consecutive streaks; every terminal outcome except an error also
    /// bumps `count`.
    pub fn record(&mut self, measurement: Measurement, fresh: bool) {
        if measurement.is_completed() {
            match measurement.phase {
                Phase::Successful => {
                    self.count += 1;
                    self.successful += 1;
                    self.consecutive_successful += 1;
                    self.consecutive_error = 0;
                }
                Phase::Failed => {
                    self.count += 1;
                    self.failed += 1;
                    self.consecutive_successful = 0;
                    self.consecutive_error = 0;
                }
                Phase::Inconclusive => {
                    self.count += 1;
                    self.inconclusive += 1;
                    self.consecutive_successful = 0;
                    self.consecutive_error = 0;
                }
                // Errors do not advance `count`: an errored attempt is not a
                // taken measurement, which is what lets the error-retry path
                // re-run a metric that would otherwise be at its count.
                Phase::Error => {
                    self.error += 1;
                    self.consecutive_successful = 0;
                    self.consecutive_error += 1;
                }
                Phase::Pending | Phase::Running => unreachable!("checked is_completed"),
            }
        }

        self.message = measurement.message.clone();

        if fresh {
            self.measurements.push(measurement);
        } else if let Some(last) = self.measurements.last_mut() {
            *last = measurement;
        } else {
            // A resumed measurement with no history should not happen; keep it
            // rather than lose the observation.
            self.measurements.push(measurement);
        }
    }
}
