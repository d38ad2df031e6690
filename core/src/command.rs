use crate::clock::ClockSpeed;
use crate::error::SlotResult;
use crate::evaluator::SpinResult;
use crate::machine::SlotMachine;
use crate::rng::RngSeed;
use crate::session::{SessionStatus, StopOutcome};
use crate::types::{Grid, IconId, Millis, SpinId};
use serde::{Deserialize, Serialize};

/// Commands a host sends to drive one machine.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetSpeed { speed: ClockSpeed },

    // ── Manual session ────────────────────────────
    StartSpin,
    StopNextReel,
    Tick { dt_ms: Millis },
    ConfirmReel { column: usize },
    Complete,
    Abort,

    // ── Machine ───────────────────────────────────
    Regenerate {
        #[serde(default)]
        seed: Option<RngSeed>,
    },
    Grid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum CommandReply {
    Ok,
    Started { spin_id: SpinId, deadline: Millis },
    Stop { outcome: StopOutcome },
    Ticked {
        now_ms: Millis,
        settled: Vec<usize>,
        status: Option<SessionStatus>,
        time_remaining: Option<Millis>,
    },
    Completed { result: SpinResult },
    Aborted { had_session: bool },
    Grid { grid: Grid<IconId> },
}

/// Apply one command to `machine`.
pub fn execute(machine: &mut SlotMachine, command: PlayerCommand) -> SlotResult<CommandReply> {
    let reply = match command {
        PlayerCommand::Pause => {
            machine.clock_mut().pause();
            CommandReply::Ok
        }
        PlayerCommand::Resume => {
            machine.clock_mut().resume();
            CommandReply::Ok
        }
        PlayerCommand::SetSpeed { speed } => {
            machine.clock_mut().set_speed(speed);
            CommandReply::Ok
        }
        PlayerCommand::StartSpin => {
            let session = machine.start_session()?;
            CommandReply::Started { spin_id: session.spin_id, deadline: session.deadline }
        }
        PlayerCommand::StopNextReel => CommandReply::Stop {
            outcome: machine.request_stop_next_reel(),
        },
        PlayerCommand::Tick { dt_ms } => {
            let settled = machine.update(dt_ms);
            let session = machine.session();
            CommandReply::Ticked {
                now_ms: machine.clock().now_ms,
                settled,
                status: session.map(|s| s.status),
                time_remaining: session.map(|s| s.time_remaining),
            }
        }
        PlayerCommand::ConfirmReel { column } => {
            machine.confirm_reel_stopped(column)?;
            CommandReply::Ok
        }
        PlayerCommand::Complete => CommandReply::Completed { result: machine.complete()? },
        PlayerCommand::Abort => CommandReply::Aborted { had_session: machine.abort_session() },
        PlayerCommand::Regenerate { seed } => {
            machine.regenerate_reels(seed)?;
            CommandReply::Ok
        }
        PlayerCommand::Grid => CommandReply::Grid { grid: machine.visible_grid() },
    };
    Ok(reply)
}
