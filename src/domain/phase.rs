//! Lifecycle phases shared by measurements, metric results, and runs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a measurement, a metric result, or a whole run.
///
/// A phase is *completed* once it leaves `Pending`/`Running`; completed
/// phases are terminal and are never reassigned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Not yet started.
    #[default]
    Pending,
    /// In progress.
    Running,
    /// Finished and passed.
    Successful,
    /// Finished and failed.
    Failed,
    /// Finished with an execution error (provider could not measure).
    Error,
    /// Finished without a conclusive outcome.
    Inconclusive,
}

impl Phase {
    /// True once the phase is terminal.
    pub fn is_completed(self) -> bool {
        !matches!(self, Phase::Pending | Phase::Running)
    }

    /// Severity rank used for worst-status aggregation.
    ///
    /// Order: Error > Failed > Inconclusive > Successful. Non-terminal
    /// phases rank below all terminal ones.
    fn severity(self) -> u8 {
        match self {
            Phase::Pending => 0,
            Phase::Running => 1,
            Phase::Successful => 2,
            Phase::Inconclusive => 3,
            Phase::Failed => 4,
            Phase::Error => 5,
        }
    }

    /// Return the worse of two phases under the fixed severity order.
    pub fn worst(self, other: Phase) -> Phase {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Successful => "Successful",
            Phase::Failed => "Failed",
            Phase::Error => "Error",
            Phase::Inconclusive => "Inconclusive",
        };
        write!(f, "{s}")
    }
}
