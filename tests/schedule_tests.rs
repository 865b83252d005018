//! Integration tests for next-reconcile-time computation.

mod support;

use chrono::{Duration, Utc};
use gatecheck::config::EngineSettings;
use gatecheck::domain::Phase;
use gatecheck::engine::schedule::{next_reconcile_time, requeue_delay};
use support::run::{completed_at, metric, run_with, running_at};

fn settings() -> EngineSettings {
    EngineSettings::default()
}

#[test]
fn test_interval_metric_due_after_last_finish() {
    let t0 = Utc::now();
    let mut m = metric("m");
    m.interval = Some("30s".into());
    let mut run = run_with(vec![m]);
    run.result_for_or_default("m")
        .record(completed_at(Phase::Successful, t0), true);

    assert_eq!(
        next_reconcile_time(&run, &settings()),
        Some(t0 + Duration::seconds(30))
    );
}

#[test]
fn test_errored_metric_due_after_default_retry_interval() {
    let t0 = Utc::now();
    let mut run = run_with(vec![metric("m")]);
    run.result_for_or_default("m")
        .record(completed_at(Phase::Error, t0), true);

    assert_eq!(
        next_reconcile_time(&run, &settings()),
        Some(t0 + Duration::seconds(10))
    );
}

#[test]
fn test_one_shot_success_needs_no_requeue() {
    let t0 = Utc::now();
    let mut run = run_with(vec![metric("m")]);
    run.result_for_or_default("m")
        .record(completed_at(Phase::Successful, t0), true);

    assert_eq!(next_reconcile_time(&run, &settings()), None);
}

#[test]
fn test_completed_metric_contributes_nothing() {
    let t0 = Utc::now();
    let mut m = metric("m");
    m.interval = Some("30s".into());
    let mut run = run_with(vec![m]);
    let result = run.result_for_or_default("m");
    result.record(completed_at(Phase::Successful, t0), true);
    result.phase = Phase::Successful;

    assert_eq!(next_reconcile_time(&run, &settings()), None);
}

#[test]
fn test_resume_at_drives_in_flight_metric() {
    let t0 = Utc::now();
    let resume_at = t0 + Duration::seconds(45);
    let mut run = run_with(vec![metric("m")]);
    let mut in_flight = running_at(t0);
    in_flight.resume_at = Some(resume_at);
    run.result_for_or_default("m").record(in_flight, true);

    assert_eq!(next_reconcile_time(&run, &settings()), Some(resume_at));
}

#[test]
fn test_initial_delay_counted_from_run_start() {
    let t0 = Utc::now();
    let mut m = metric("m");
    m.initial_delay = Some("2m".into());
    let mut run = run_with(vec![m]);

    // Unstarted run: nothing computable.
    assert_eq!(next_reconcile_time(&run, &settings()), None);

    run.status.started_at = Some(t0);
    assert_eq!(
        next_reconcile_time(&run, &settings()),
        Some(t0 + Duration::seconds(120))
    );
}

#[test]
fn test_never_measured_without_delay_contributes_nothing() {
    let mut run = run_with(vec![metric("m")]);
    run.status.started_at = Some(Utc::now());
    assert_eq!(next_reconcile_time(&run, &settings()), None);
}

#[test]
fn test_minimum_across_metrics_wins() {
    let t0 = Utc::now();
    let mut slow = metric("slow");
    slow.interval = Some("30s".into());
    let mut fast = metric("fast");
    fast.interval = Some("5s".into());
    let mut run = run_with(vec![slow, fast]);
    run.result_for_or_default("slow")
        .record(completed_at(Phase::Successful, t0), true);
    run.result_for_or_default("fast")
        .record(completed_at(Phase::Successful, t0), true);

    assert_eq!(
        next_reconcile_time(&run, &settings()),
        Some(t0 + Duration::seconds(5))
    );
}

#[test]
fn test_requeue_delay_clamps_past_instants_to_zero() {
    let t0 = Utc::now() - Duration::seconds(120);
    let mut m = metric("m");
    m.interval = Some("30s".into());
    let mut run = run_with(vec![m]);
    run.result_for_or_default("m")
        .record(completed_at(Phase::Successful, t0), true);

    let delay = requeue_delay(&run, &settings(), Utc::now()).unwrap();
    assert_eq!(delay, std::time::Duration::ZERO);
}
