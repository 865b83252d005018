//! Persistence boundary for analysis runs.
//!
//! The engine never persists anything itself; workers fetch a run, hand a
//! copy to the reconciler, and write the updated status back through this
//! seam. Durable backends live outside this crate.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::AnalysisRun;
use crate::error::StoreError;

/// Store of analysis runs keyed by name.
pub trait RunStore: Send + Sync {
    fn get(&self, name: &str) -> Option<AnalysisRun>;

    fn list(&self) -> Vec<String>;

    /// Persist the run's status subtree. Returns `false` when the stored
    /// status already matches and the write was skipped; a no-op
    /// reconciliation must not produce spurious writes.
    fn update_status(&self, run: &AnalysisRun) -> Result<bool, StoreError>;
}

/// In-memory store used by the CLI and tests.
#[derive(Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<String, AnalysisRun>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a run wholesale; creation is the orchestrator's
    /// job, not the engine's.
    pub fn insert(&self, run: AnalysisRun) {
        self.runs.write().insert(run.name.clone(), run);
    }
}

impl RunStore for InMemoryRunStore {
    fn get(&self, name: &str) -> Option<AnalysisRun> {
        self.runs.read().get(name).cloned()
    }

    fn list(&self) -> Vec<String> {
        self.runs.read().keys().cloned().collect()
    }

    fn update_status(&self, run: &AnalysisRun) -> Result<bool, StoreError> {
        let mut runs = self.runs.write();
        let stored = runs.get_mut(&run.name).ok_or_else(|| StoreError::NotFound {
            name: run.name.clone(),
        })?;

        if stored.status == run.status {
            debug!(run = %run.name, "Status unchanged, skipping write");
            return Ok(false);
        }

        stored.status = run.status.clone();
        Ok(true)
    }
}
