//! Builders for runs, metrics, and measurements used across test suites.

use chrono::{DateTime, Utc};
use gatecheck::domain::{
    AnalysisRun, Argument, Measurement, Metric, Phase, ProviderSpec, RunSpec, RunStatus,
    WebProviderSpec,
};

/// A minimal valid metric with a web provider and no interval.
pub fn metric(name: &str) -> Metric {
    Metric {
        name: name.into(),
        interval: None,
        initial_delay: None,
        count: None,
        success_condition: None,
        failure_condition: None,
        failure_limit: 0,
        successful_limit: 0,
        inconclusive_limit: 0,
        consecutive_error_limit: None,
        consecutive_successful_limit: None,
        provider: web_provider(),
    }
}

pub fn web_provider() -> ProviderSpec {
    ProviderSpec {
        web: Some(WebProviderSpec {
            url: "http://svc.test/health".into(),
            headers: vec![],
            json_path: None,
            timeout: None,
        }),
        query: None,
        resource: None,
    }
}

pub fn run_named(name: &str, metrics: Vec<Metric>) -> AnalysisRun {
    AnalysisRun {
        name: name.into(),
        spec: RunSpec {
            metrics,
            args: vec![],
            terminate: false,
            policy: Default::default(),
        },
        status: RunStatus::default(),
    }
}

pub fn run_with(metrics: Vec<Metric>) -> AnalysisRun {
    run_named("run", metrics)
}

pub fn run_with_args(metrics: Vec<Metric>, args: Vec<Argument>) -> AnalysisRun {
    let mut run = run_with(metrics);
    run.spec.args = args;
    run
}

/// A terminal measurement with explicit timestamps.
pub fn completed_at(phase: Phase, at: DateTime<Utc>) -> Measurement {
    Measurement {
        phase,
        message: None,
        started_at: Some(at),
        finished_at: Some(at),
        resume_at: None,
        value: None,
    }
}

/// An in-flight measurement started at the given instant.
pub fn running_at(at: DateTime<Utc>) -> Measurement {
    Measurement {
        phase: Phase::Running,
        message: None,
        started_at: Some(at),
        finished_at: None,
        resume_at: None,
        value: None,
    }
}
