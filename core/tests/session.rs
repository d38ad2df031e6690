use slotspire_core::{
    config::SlotConfig,
    error::SlotError,
    event::SlotEvent,
    machine::SlotMachine,
    port::SharedEventLog,
    reel::{ReelPhase, StopProfile},
    runtime::build_runtime,
    session::{SessionStatus, StopOutcome},
};

// ── Test helpers ────────────────────────────────────────────────────────────

const FRAME_MS: f64 = 10.0;

fn make_machine(seed: &str) -> (SlotMachine, SharedEventLog) {
    make_machine_with_duration(seed, 4_000.0)
}

fn make_machine_with_duration(seed: &str, duration_ms: f64) -> (SlotMachine, SharedEventLog) {
    let mut config = SlotConfig::default_test();
    config.machines[0].spin_duration_ms = duration_ms;
    let runtime = build_runtime(&config.machines[0], &config.icons, &config.patterns);
    let events = SharedEventLog::new();
    let machine =
        SlotMachine::new(runtime, config.motion, seed).with_diagnostics(Box::new(events.clone()));
    (machine, events)
}

/// Tick until `col` settles. Panics if it takes longer than the session
/// could possibly run.
fn tick_until_settled(machine: &mut SlotMachine, col: usize) {
    for _ in 0..2_000 {
        if machine.update(FRAME_MS).contains(&col) {
            return;
        }
    }
    panic!("column {col} never settled");
}

fn event_types(events: &SharedEventLog) -> Vec<&'static str> {
    events.events().iter().map(|e| e.event_type()).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Stopping left to right, confirming each column as it settles, scores
/// exactly what the reels show.
#[test]
fn stop_confirm_complete_in_order() {
    // Long enough that three manual stops finish before the deadline.
    let (mut machine, events) = make_machine_with_duration("in-order", 20_000.0);
    let spin_id = machine.start_session().unwrap().spin_id;
    assert_eq!(spin_id, 1);

    for col in 0..3 {
        assert_eq!(machine.request_stop_next_reel(), StopOutcome::Stopping(col));
        tick_until_settled(&mut machine, col);
        machine.confirm_reel_stopped(col).unwrap();
    }

    let session = machine.session().unwrap();
    assert_eq!(session.status, SessionStatus::Stopped);
    assert!(session.is_finished());
    let finals: Vec<usize> = session.reels.iter().map(|r| r.final_index.unwrap()).collect();
    let shown = machine.visible_grid();

    let result = machine.complete().unwrap();
    assert!(machine.session().is_none());
    assert_eq!(machine.positions(), finals.as_slice());
    assert_eq!(result.grid, shown);
    assert_eq!(machine.visible_grid(), result.grid);
    assert_eq!(machine.last_result(), Some(&result));

    let types = event_types(&events);
    assert_eq!(types.first(), Some(&"reels_regenerated"));
    assert_eq!(types[1], "session_started");
    assert_eq!(types.last(), Some(&"spin_completed"));
    assert_eq!(types.iter().filter(|t| **t == "reel_settled").count(), 3);
}

/// Only one player stop may be settling at a time.
#[test]
fn second_stop_is_busy_until_the_first_settles() {
    let (mut machine, _) = make_machine("busy");
    machine.start_session().unwrap();

    assert_eq!(machine.request_stop_next_reel(), StopOutcome::Stopping(0));
    assert_eq!(machine.request_stop_next_reel(), StopOutcome::Busy(0));
    tick_until_settled(&mut machine, 0);
    assert_eq!(machine.request_stop_next_reel(), StopOutcome::Stopping(1));
}

#[test]
fn stop_without_session_reports_none_remaining() {
    let (mut machine, _) = make_machine("idle");
    assert_eq!(machine.request_stop_next_reel(), StopOutcome::NoneRemaining);
    assert!(machine.update(FRAME_MS).is_empty());
}

#[test]
fn second_session_is_rejected() {
    let (mut machine, _) = make_machine("double");
    machine.start_session().unwrap();
    assert!(matches!(
        machine.start_session(),
        Err(SlotError::SessionAlreadyActive { spin_id: 1 })
    ));
    assert!(matches!(machine.spin(), Err(SlotError::SessionAlreadyActive { .. })));
    assert!(matches!(
        machine.regenerate_reels(None),
        Err(SlotError::SessionAlreadyActive { .. })
    ));
}

#[test]
fn confirm_and_complete_guard_their_inputs() {
    let (mut machine, _) = make_machine("guards");
    assert!(matches!(machine.confirm_reel_stopped(0), Err(SlotError::NoActiveSession)));
    assert!(matches!(machine.complete(), Err(SlotError::NoActiveSession)));

    machine.start_session().unwrap();
    assert!(matches!(
        machine.confirm_reel_stopped(5),
        Err(SlotError::ColumnOutOfRange { column: 5, columns: 3 })
    ));
    assert!(matches!(
        machine.confirm_reel_stopped(0),
        Err(SlotError::ReelNotStopped { column: 0 })
    ));
    assert!(matches!(
        machine.complete(),
        Err(SlotError::SessionNotFinished { stopped: 0, total: 3 })
    ));

    machine.request_stop_next_reel();
    tick_until_settled(&mut machine, 0);
    machine.confirm_reel_stopped(0).unwrap();
    // Confirming twice is harmless.
    machine.confirm_reel_stopped(0).unwrap();
    assert_eq!(machine.session().unwrap().confirmed_count(), 1);
    assert!(matches!(
        machine.complete(),
        Err(SlotError::SessionNotFinished { stopped: 1, total: 3 })
    ));
}

/// With no player input the deadline forces every column onto the forced
/// profile, and the result is marked as timed out.
#[test]
fn deadline_forces_every_spinning_column() {
    let (mut machine, events) = make_machine("timeout");
    let deadline = machine.start_session().unwrap().deadline;
    assert_eq!(deadline, 4_000.0);

    while machine.clock().now_ms < deadline - FRAME_MS {
        assert!(machine.update(FRAME_MS).is_empty());
    }
    assert!(!machine.session().unwrap().timed_out);
    machine.update(FRAME_MS);

    let session = machine.session().unwrap();
    assert!(session.timed_out);
    assert_eq!(session.time_remaining, 0.0);
    assert!(session
        .reels
        .iter()
        .all(|r| r.stop_profile == Some(StopProfile::Forced)));

    for col in 0..3 {
        if machine.session().unwrap().reels[col].phase != ReelPhase::Stopped {
            tick_until_settled(&mut machine, col);
        }
        machine.confirm_reel_stopped(col).unwrap();
    }
    assert_eq!(machine.session().unwrap().status, SessionStatus::TimedOut);
    machine.complete().unwrap();

    let forced = events
        .events()
        .into_iter()
        .find_map(|e| match e {
            SlotEvent::TimeoutForced { at, columns, .. } => Some((at, columns)),
            _ => None,
        })
        .expect("timeout event");
    assert_eq!(forced, (4_000.0, vec![0, 1, 2]));

    let completed = events.events().into_iter().any(|e| {
        matches!(e, SlotEvent::SpinCompleted { timed_out: true, .. })
    });
    assert!(completed);
}

/// A column already braking on the manual profile keeps it through the
/// timeout. The timeout check runs before motion on the deadline tick.
#[test]
fn timeout_leaves_a_manual_stop_alone() {
    let (mut machine, events) = make_machine("late-stop");
    machine.start_session().unwrap();
    while machine.clock().now_ms < 3_990.0 {
        machine.update(FRAME_MS);
    }
    assert_eq!(machine.request_stop_next_reel(), StopOutcome::Stopping(0));
    machine.update(FRAME_MS);

    let session = machine.session().unwrap();
    assert!(session.timed_out);
    assert_eq!(session.reels[0].stop_profile, Some(StopProfile::Manual));
    assert_eq!(session.reels[1].stop_profile, Some(StopProfile::Forced));
    assert_eq!(session.reels[2].stop_profile, Some(StopProfile::Forced));

    let columns = events.events().into_iter().find_map(|e| match e {
        SlotEvent::TimeoutForced { columns, .. } => Some(columns),
        _ => None,
    });
    assert_eq!(columns, Some(vec![1, 2]));

    // A forced timeout happens once; calling it again is a no-op.
    let before = events.len();
    machine.force_timeout_stop();
    assert_eq!(events.len(), before);
}

/// Aborting freezes every reel where it is; those positions become the
/// machine's resting positions.
#[test]
fn abort_keeps_frozen_positions() {
    let (mut machine, events) = make_machine("abort");
    machine.start_session().unwrap();
    for _ in 0..37 {
        machine.update(FRAME_MS);
    }
    let live: Vec<usize> = machine
        .session()
        .unwrap()
        .reels
        .iter()
        .map(|r| r.position)
        .collect();

    assert!(machine.abort_session());
    assert!(machine.session().is_none());
    assert_eq!(machine.positions(), live.as_slice());
    assert!(!machine.abort_session());
    assert!(matches!(events.events().last(), Some(SlotEvent::SessionAborted { spin_id: 1, .. })));

    // A new session gets the next spin id.
    assert_eq!(machine.start_session().unwrap().spin_id, 2);
}

#[test]
fn settled_reels_wait_for_confirmation() {
    let (mut machine, _) = make_machine("await");
    machine.start_session().unwrap();
    machine.request_stop_next_reel();
    tick_until_settled(&mut machine, 0);

    let session = machine.session().unwrap();
    assert_eq!(session.awaiting_confirmation(), vec![0]);
    assert_eq!(session.status, SessionStatus::Stopping);
    assert!(!session.is_finished());
}
