use serde_json::json;
use slotspire_core::{
    clock::ClockSpeed,
    command::{execute, CommandReply, PlayerCommand},
    config::SlotConfig,
    error::SlotError,
    machine::SlotMachine,
    runtime::build_runtime,
    session::StopOutcome,
};

fn make_machine() -> SlotMachine {
    let config = SlotConfig::default_test();
    let runtime = build_runtime(&config.machines[0], &config.icons, &config.patterns);
    SlotMachine::new(runtime, config.motion, "ipc")
}

fn send(machine: &mut SlotMachine, line: serde_json::Value) -> CommandReply {
    let cmd: PlayerCommand = serde_json::from_value(line).expect("parse command");
    execute(machine, cmd).expect("execute command")
}

#[test]
fn commands_parse_from_tagged_json() {
    let cmd: PlayerCommand = serde_json::from_value(json!({ "cmd": "tick", "dt_ms": 16.0 })).unwrap();
    assert!(matches!(cmd, PlayerCommand::Tick { dt_ms } if dt_ms == 16.0));
    let cmd: PlayerCommand =
        serde_json::from_value(json!({ "cmd": "set_speed", "speed": "fast_forward" })).unwrap();
    assert!(matches!(cmd, PlayerCommand::SetSpeed { speed: ClockSpeed::FastForward }));
    let cmd: PlayerCommand = serde_json::from_value(json!({ "cmd": "regenerate" })).unwrap();
    assert!(matches!(cmd, PlayerCommand::Regenerate { seed: None }));
    assert!(serde_json::from_value::<PlayerCommand>(json!({ "cmd": "jackpot" })).is_err());
}

/// A whole manual spin driven through commands, the way the IPC loop
/// drives it.
#[test]
fn full_session_over_commands() {
    let mut machine = make_machine();
    match send(&mut machine, json!({ "cmd": "start_spin" })) {
        CommandReply::Started { spin_id, deadline } => {
            assert_eq!(spin_id, 1);
            assert_eq!(deadline, 4_000.0);
        }
        other => panic!("unexpected reply {other:?}"),
    }

    let mut confirmed = 0;
    for _ in 0..5_000 {
        // Once every column is braking the request answers NoneRemaining.
        send(&mut machine, json!({ "cmd": "stop_next_reel" }));
        let CommandReply::Ticked { settled, .. } =
            send(&mut machine, json!({ "cmd": "tick", "dt_ms": 16.0 }))
        else {
            panic!("tick must reply with ticked");
        };
        for column in settled {
            send(&mut machine, json!({ "cmd": "confirm_reel", "column": column }));
            confirmed += 1;
        }
        if confirmed == 3 {
            break;
        }
    }
    assert_eq!(confirmed, 3);

    let CommandReply::Completed { result } = send(&mut machine, json!({ "cmd": "complete" })) else {
        panic!("complete must reply with the result");
    };
    let CommandReply::Grid { grid } = send(&mut machine, json!({ "cmd": "grid" })) else {
        panic!("grid must reply with the grid");
    };
    assert_eq!(grid, result.grid);
}

#[test]
fn errors_surface_as_slot_errors() {
    let mut machine = make_machine();
    assert!(matches!(execute(&mut machine, PlayerCommand::Complete), Err(SlotError::NoActiveSession)));
    execute(&mut machine, PlayerCommand::StartSpin).unwrap();
    assert!(matches!(
        execute(&mut machine, PlayerCommand::StartSpin),
        Err(SlotError::SessionAlreadyActive { .. })
    ));
    assert!(matches!(
        execute(&mut machine, PlayerCommand::Abort).unwrap(),
        CommandReply::Aborted { had_session: true }
    ));
}

#[test]
fn replies_serialise_with_a_reply_tag() {
    let reply = CommandReply::Stop { outcome: StopOutcome::Busy(2) };
    let value = serde_json::to_value(&reply).unwrap();
    assert_eq!(value, json!({ "reply": "stop", "outcome": { "outcome": "busy", "column": 2 } }));

    let value = serde_json::to_value(CommandReply::Ok).unwrap();
    assert_eq!(value, json!({ "reply": "ok" }));
}

#[test]
fn pause_stops_the_clock() {
    let mut machine = make_machine();
    send(&mut machine, json!({ "cmd": "pause" }));
    let CommandReply::Ticked { now_ms, status, .. } =
        send(&mut machine, json!({ "cmd": "tick", "dt_ms": 50.0 }))
    else {
        panic!("tick must reply with ticked");
    };
    assert_eq!(now_ms, 0.0);
    assert!(status.is_none());
    send(&mut machine, json!({ "cmd": "resume" }));
    let CommandReply::Ticked { now_ms, .. } =
        send(&mut machine, json!({ "cmd": "tick", "dt_ms": 50.0 }))
    else {
        panic!("tick must reply with ticked");
    };
    assert_eq!(now_ms, 50.0);
}
