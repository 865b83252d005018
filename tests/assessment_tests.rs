//! Integration tests for per-metric and run-level status assessment.

mod support;

use chrono::Utc;
use gatecheck::config::EngineSettings;
use gatecheck::domain::Phase;
use gatecheck::engine::assess::{assess_metric_status, assess_run_status};
use gatecheck::engine::event::EventLevel;
use support::events::RecordingEvents;
use support::run::{completed_at, metric, run_with, running_at};

fn settings() -> EngineSettings {
    EngineSettings::default()
}

#[test]
fn test_terminal_metric_phase_never_reassigned() {
    let m = metric("m");
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.phase = Phase::Failed;
    // Even with a successful history, the stored terminal phase sticks.
    result.record(completed_at(Phase::Successful, Utc::now()), true);
    result.phase = Phase::Failed;

    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Failed);
}

#[test]
fn test_unmeasured_metric_pending_unless_terminating() {
    let m = metric("m");
    let result = gatecheck::domain::MetricResult::new("m");

    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Pending);
    // Nothing left to measure in a terminating run: vacuously successful.
    assert_eq!(assess_metric_status(&m, &result, true, &settings()), Phase::Successful);
}

#[test]
fn test_in_flight_measurement_keeps_metric_running() {
    let m = metric("m");
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.record(running_at(Utc::now()), true);

    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Running);
}

#[test]
fn test_failure_limit_breach_fails_metric() {
    let mut m = metric("m");
    m.interval = Some("30s".into());
    m.failure_limit = 1;
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.record(completed_at(Phase::Failed, Utc::now()), true);
    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Running);

    result.record(completed_at(Phase::Failed, Utc::now()), true);
    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Failed);
}

#[test]
fn test_successful_limit_passes_early() {
    let mut m = metric("m");
    m.interval = Some("30s".into());
    m.successful_limit = 2;
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.record(completed_at(Phase::Successful, Utc::now()), true);
    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Running);

    result.record(completed_at(Phase::Successful, Utc::now()), true);
    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Successful);
}

#[test]
fn test_consecutive_error_escalates_with_limit_one() {
    let mut m = metric("m");
    m.consecutive_error_limit = Some(1);
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.record(completed_at(Phase::Error, Utc::now()), true);
    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Running);

    result.record(completed_at(Phase::Error, Utc::now()), true);
    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Error);
}

#[test]
fn test_success_breaks_error_streak() {
    let mut m = metric("m");
    m.consecutive_error_limit = Some(1);
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.record(completed_at(Phase::Error, Utc::now()), true);
    result.record(completed_at(Phase::Successful, Utc::now()), true);
    result.record(completed_at(Phase::Error, Utc::now()), true);

    // Streak restarted after the success; one error is within the limit.
    assert_ne!(assess_metric_status(&m, &result, false, &settings()), Phase::Error);
}

#[test]
fn test_consecutive_successful_limit_passes() {
    let mut m = metric("m");
    m.interval = Some("30s".into());
    m.consecutive_successful_limit = Some(2);
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.record(completed_at(Phase::Successful, Utc::now()), true);
    result.record(completed_at(Phase::Successful, Utc::now()), true);

    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Successful);
}

#[test]
fn test_one_shot_metric_succeeds_after_single_measurement() {
    // Neither count nor interval: effective count is one.
    let m = metric("m");
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.record(completed_at(Phase::Successful, Utc::now()), true);

    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Successful);
}

#[test]
fn test_errored_measurement_does_not_satisfy_count() {
    let m = metric("m");
    let mut result = gatecheck::domain::MetricResult::new("m");
    result.record(completed_at(Phase::Error, Utc::now()), true);

    // One errored attempt is not a taken measurement; the metric keeps running.
    assert_eq!(assess_metric_status(&m, &result, false, &settings()), Phase::Running);
}

#[test]
fn test_worst_status_aggregation() {
    let events = RecordingEvents::default();
    let now = Utc::now();

    let cases: &[(&[Phase], Phase)] = &[
        (&[Phase::Successful, Phase::Failed], Phase::Failed),
        (&[Phase::Error, Phase::Failed], Phase::Error),
        (&[Phase::Successful, Phase::Inconclusive], Phase::Inconclusive),
        (&[Phase::Inconclusive, Phase::Failed], Phase::Failed),
        (&[Phase::Successful, Phase::Successful], Phase::Successful),
    ];

    for (phases, expected) in cases {
        let metrics = (0..phases.len()).map(|i| metric(&format!("m{i}"))).collect();
        let mut run = run_with(metrics);
        for (i, &phase) in phases.iter().enumerate() {
            let result = run.result_for_or_default(&format!("m{i}"));
            result.record(completed_at(phase, now), true);
            result.phase = phase;
        }

        let assessed = assess_run_status(&mut run, &settings(), &events, now);
        assert_eq!(assessed, *expected, "phases {phases:?}");
    }
}

#[test]
fn test_run_stays_running_until_every_metric_terminal() {
    let events = RecordingEvents::default();
    let now = Utc::now();
    let mut run = run_with(vec![metric("done"), metric("pending")]);
    let result = run.result_for_or_default("done");
    result.record(completed_at(Phase::Successful, now), true);
    result.phase = Phase::Successful;

    // "pending" has no measurements and the run is not terminating, so the
    // aggregate stays Running no matter how the finished metric fared.
    assert_eq!(
        assess_run_status(&mut run, &settings(), &events, now),
        Phase::Running
    );
    assert_eq!(run.result_for("pending").unwrap().phase, Phase::Pending);
}

#[test]
fn test_started_at_stamped_once() {
    let events = RecordingEvents::default();
    let now = Utc::now();
    let mut run = run_with(vec![metric("m")]);
    assert!(run.status.started_at.is_none());

    assess_run_status(&mut run, &settings(), &events, now);
    assert_eq!(run.status.started_at, Some(now));

    let later = now + chrono::Duration::seconds(60);
    assess_run_status(&mut run, &settings(), &events, later);
    assert_eq!(run.status.started_at, Some(now));
}

#[test]
fn test_terminal_metric_transition_emits_event() {
    let events = RecordingEvents::default();
    let now = Utc::now();
    let mut run = run_with(vec![metric("m")]);
    run.result_for_or_default("m")
        .record(completed_at(Phase::Failed, now), true);
    let mut m = run.spec.metrics[0].clone();
    m.failure_limit = 0;
    run.spec.metrics[0] = m;

    assess_run_status(&mut run, &settings(), &events, now);

    assert!(events
        .captured()
        .iter()
        .any(|(_, level, reason, _)| reason == "MetricAssessed" && *level == EventLevel::Warning));
}

#[test]
fn test_run_message_carries_worst_metric_message() {
    let events = RecordingEvents::default();
    let now = Utc::now();
    let mut run = run_with(vec![metric("m")]);
    run.result_for_or_default("m").record(
        completed_at(Phase::Failed, now).with_message("latency too high"),
        true,
    );

    let assessed = assess_run_status(&mut run, &settings(), &events, now);
    assert_eq!(assessed, Phase::Failed);
    assert_eq!(run.status.message.as_deref(), Some("latency too high"));
}
