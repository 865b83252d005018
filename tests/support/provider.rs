//! Scripted provider and factory recording every engine-to-provider call.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use gatecheck::domain::{AnalysisRun, Measurement, Metric, Phase};
use gatecheck::error::ProviderError;
use gatecheck::provider::{Provider, ProviderFactory};
use parking_lot::Mutex;

/// One observed call into a scripted provider, tagged with the metric name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Run(String),
    Resume(String),
    Terminate(String),
    Gc(String),
}

/// Factory handing out providers that replay a per-metric script of
/// measurements and log every call they receive.
///
/// Unscripted metrics always measure successfully. Scripts are shared
/// across `create` calls, so a metric keeps consuming its script over
/// multiple reconciliation cycles.
#[derive(Default)]
pub struct ScriptedFactory {
    log: Arc<Mutex<Vec<ProviderCall>>>,
    scripts: Mutex<HashMap<String, Arc<Mutex<VecDeque<Measurement>>>>>,
    create_failures: Mutex<HashSet<String>>,
    gc_failures: Mutex<HashSet<String>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the measurements `run`/`resume` will return for a metric, in order.
    pub fn script(&self, metric: &str, outcomes: Vec<Measurement>) {
        self.scripts
            .lock()
            .insert(metric.into(), Arc::new(Mutex::new(outcomes.into())));
    }

    /// Shorthand: script a sequence of terminal phases.
    pub fn script_phases(&self, metric: &str, phases: &[Phase]) {
        let outcomes = phases
            .iter()
            .map(|&p| Measurement::completed(p, Utc::now()))
            .collect();
        self.script(metric, outcomes);
    }

    /// Make `create` fail for a metric.
    pub fn fail_create(&self, metric: &str) {
        self.create_failures.lock().insert(metric.into());
    }

    /// Make `garbage_collect` fail for a metric.
    pub fn fail_gc(&self, metric: &str) {
        self.gc_failures.lock().insert(metric.into());
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.log.lock().clone()
    }

    pub fn count_calls(&self, wanted: &ProviderCall) -> usize {
        self.log.lock().iter().filter(|c| *c == wanted).count()
    }
}

impl ProviderFactory for ScriptedFactory {
    fn create(&self, metric: &Metric) -> Result<Arc<dyn Provider>, ProviderError> {
        if self.create_failures.lock().contains(&metric.name) {
            return Err(ProviderError::Response {
                reason: format!("scripted create failure for '{}'", metric.name),
            });
        }
        let outcomes = self
            .scripts
            .lock()
            .entry(metric.name.clone())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone();
        Ok(Arc::new(ScriptedProvider {
            log: Arc::clone(&self.log),
            outcomes,
            gc_fails: self.gc_failures.lock().contains(&metric.name),
        }))
    }
}

pub struct ScriptedProvider {
    log: Arc<Mutex<Vec<ProviderCall>>>,
    outcomes: Arc<Mutex<VecDeque<Measurement>>>,
    gc_fails: bool,
}

impl ScriptedProvider {
    fn next_outcome(&self) -> Option<Measurement> {
        self.outcomes.lock().pop_front()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn run(&self, _run: &AnalysisRun, metric: &Metric) -> Measurement {
        self.log.lock().push(ProviderCall::Run(metric.name.clone()));
        self.next_outcome()
            .unwrap_or_else(|| Measurement::completed(Phase::Successful, Utc::now()))
    }

    async fn resume(
        &self,
        _run: &AnalysisRun,
        metric: &Metric,
        in_flight: Measurement,
    ) -> Measurement {
        self.log
            .lock()
            .push(ProviderCall::Resume(metric.name.clone()));
        self.next_outcome().unwrap_or(in_flight)
    }

    async fn terminate(
        &self,
        _run: &AnalysisRun,
        metric: &Metric,
        mut in_flight: Measurement,
    ) -> Measurement {
        self.log
            .lock()
            .push(ProviderCall::Terminate(metric.name.clone()));
        in_flight.phase = Phase::Successful;
        in_flight.finished_at = Some(Utc::now());
        in_flight.message = Some("measurement terminated".into());
        in_flight
    }

    async fn garbage_collect(
        &self,
        _run: &AnalysisRun,
        metric: &Metric,
        _retain: usize,
    ) -> Result<(), ProviderError> {
        self.log.lock().push(ProviderCall::Gc(metric.name.clone()));
        if self.gc_fails {
            return Err(ProviderError::GarbageCollect {
                metric: metric.name.clone(),
                reason: "scripted failure".into(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
