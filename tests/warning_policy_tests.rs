// Tests for the warning policy math and interview config validation.

mod common;

use common::test_defaults;
use live_interview::session::warning::{self, SentWarnings, WarningKind};
use live_interview::{InterviewConfig, SessionError};

#[test]
fn warning_offsets_use_floor_division() {
    // 15 minute interview, 66% / 83% thresholds
    let sched = warning::schedule(900, 66, 83);
    assert_eq!(sched.first_at_secs, 594);
    assert_eq!(sched.final_at_secs, 747);
}

#[test]
fn warning_offsets_are_ordered_for_valid_configs() {
    for duration in [300u64, 480, 900, 1234, 1800] {
        for (first, last) in [(1u8, 2u8), (10, 50), (66, 83), (50, 99), (98, 99)] {
            let sched = warning::schedule(duration, first, last);
            assert!(
                sched.first_at_secs < sched.final_at_secs,
                "first >= final for duration={duration} percents=({first},{last})"
            );
            assert!(
                sched.final_at_secs < duration,
                "final >= duration for duration={duration} percents=({first},{last})"
            );
        }
    }
}

#[test]
fn schedule_survives_extreme_durations() {
    // Nothing caps configured durations, so the threshold multiply must
    // not overflow even at the top of the u64 range.
    let sched = warning::schedule(u64::MAX, 66, 83);
    assert!(sched.first_at_secs < sched.final_at_secs);
    assert!(sched.final_at_secs < u64::MAX);
}

#[test]
fn due_warnings_fire_in_threshold_order() {
    let sched = warning::schedule(900, 66, 83);
    let sent = SentWarnings::default();

    // Both thresholds observed crossed in one tick: both fire, first
    // before final, never dropped.
    let due = warning::due(&sched, &sent, 800);
    assert_eq!(due, vec![WarningKind::First, WarningKind::Final]);
}

#[test]
fn due_warnings_fire_at_most_once() {
    let sched = warning::schedule(900, 66, 83);
    let mut sent = SentWarnings::default();

    let first_pass = warning::due(&sched, &sent, 600);
    assert_eq!(first_pass, vec![WarningKind::First]);
    for kind in first_pass {
        sent.mark(kind);
    }

    // Ticks keep observing the crossed threshold; nothing re-fires.
    assert!(warning::due(&sched, &sent, 601).is_empty());
    assert!(warning::due(&sched, &sent, 700).is_empty());

    let second_pass = warning::due(&sched, &sent, 750);
    assert_eq!(second_pass, vec![WarningKind::Final]);
    for kind in second_pass {
        sent.mark(kind);
    }
    assert!(warning::due(&sched, &sent, 899).is_empty());
}

#[test]
fn due_warnings_before_threshold_are_empty() {
    let sched = warning::schedule(900, 66, 83);
    let sent = SentWarnings::default();
    assert!(warning::due(&sched, &sent, 0).is_empty());
    assert!(warning::due(&sched, &sent, 593).is_empty());
}

#[test]
fn requested_duration_is_clamped_not_rejected() {
    let defaults = test_defaults();

    let low = InterviewConfig::resolve("s1", &defaults, "Role", "Desc", Some(120)).unwrap();
    assert_eq!(low.scheduled_duration_secs, 300);

    let high = InterviewConfig::resolve("s2", &defaults, "Role", "Desc", Some(7200)).unwrap();
    assert_eq!(high.scheduled_duration_secs, 1800);

    let in_range = InterviewConfig::resolve("s3", &defaults, "Role", "Desc", Some(900)).unwrap();
    assert_eq!(in_range.scheduled_duration_secs, 900);

    let unspecified = InterviewConfig::resolve("s4", &defaults, "Role", "Desc", None).unwrap();
    assert_eq!(unspecified.scheduled_duration_secs, 900);
}

#[test]
fn invalid_warning_percents_are_rejected_at_creation() {
    let mut defaults = test_defaults();
    defaults.first_warning_percent = 83;
    defaults.final_warning_percent = 66;
    let err = InterviewConfig::resolve("s", &defaults, "Role", "Desc", None).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));

    let mut defaults = test_defaults();
    defaults.first_warning_percent = 0;
    let err = InterviewConfig::resolve("s", &defaults, "Role", "Desc", None).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));

    let mut defaults = test_defaults();
    defaults.final_warning_percent = 100;
    let err = InterviewConfig::resolve("s", &defaults, "Role", "Desc", None).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));

    let mut defaults = test_defaults();
    defaults.first_warning_percent = 66;
    defaults.final_warning_percent = 66;
    let err = InterviewConfig::resolve("s", &defaults, "Role", "Desc", None).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));
}

#[test]
fn tick_interval_must_leave_a_warning_opportunity() {
    // Interval above half the minimum duration could skip a warning
    // window entirely for the shortest interview.
    let mut defaults = test_defaults();
    defaults.tick_interval_secs = 200;
    let err = InterviewConfig::resolve("s", &defaults, "Role", "Desc", None).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));

    let mut defaults = test_defaults();
    defaults.tick_interval_secs = 150; // exactly min/2 is allowed
    assert!(InterviewConfig::resolve("s", &defaults, "Role", "Desc", None).is_ok());
}

#[test]
fn degenerate_duration_bounds_are_rejected() {
    let mut defaults = test_defaults();
    defaults.min_duration_secs = 0;
    let err = InterviewConfig::resolve("s", &defaults, "Role", "Desc", None).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));

    let mut defaults = test_defaults();
    defaults.min_duration_secs = 2000;
    defaults.max_duration_secs = 1800;
    let err = InterviewConfig::resolve("s", &defaults, "Role", "Desc", None).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));
}
