//! spin-runner: headless runner for the Slotspire simulation core.
//!
//! Usage:
//!   spin-runner --seed lucky --machine classic --db run.db
//!   spin-runner --seed 42 --manual --stop-interval 250
//!   spin-runner --seed 42 --ipc-mode

use anyhow::Result;
use slotspire_core::{
    command::{execute, PlayerCommand},
    config::SlotConfig,
    event::EventLogEntry,
    fight::{FightManager, FightOutcome},
    heat::{HeatSystem, HeatTier},
    machine::SlotMachine,
    port::{ProgressStore, SharedEventLog},
    rng::RngSeed,
    run::{GameState, RunManager, ShopAction},
    runtime::build_runtime,
    store::SlotStore,
    timer::{ManualPlay, SpinTimer},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Serialize)]
struct RunSummary<'a> {
    run_id: &'a str,
    seed: String,
    machine: &'a str,
    days: u32,
    nodes: u32,
    tickets: u32,
    total_credits: f64,
    health: f64,
    heat: f64,
    won: Option<bool>,
    spins_logged: i64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = str_arg(&args, "--seed").unwrap_or("42");
    let machine_id = str_arg(&args, "--machine");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let manual = args.iter().any(|a| a == "--manual");
    let stop_interval = parse_arg(&args, "--stop-interval", 300.0f64);

    // Same reading as a JSON seed: numbers stay numbers, anything else is text.
    let seed = serde_json::from_str::<RngSeed>(seed)
        .ok()
        .filter(|s| !matches!(s, RngSeed::Text(_)))
        .unwrap_or_else(|| RngSeed::Text(seed.to_string()));

    let config = SlotConfig::load(data_dir)?;
    let spec = match machine_id {
        Some(id) => config
            .machine(id)
            .ok_or_else(|| anyhow::anyhow!("Unknown machine \"{id}\" in {data_dir}"))?,
        None => config
            .machines
            .first()
            .ok_or_else(|| anyhow::anyhow!("No machines defined in {data_dir}"))?,
    };
    let runtime = build_runtime(spec, &config.icons, &config.patterns);

    if !ipc_mode {
        println!("Slotspire spin-runner");
        println!("  seed:      {seed}");
        println!("  machine:   {}", spec.id);
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!("  play:      {}", if manual { "manual sessions" } else { "instant spins" });
        println!();
    }

    let store = SlotStore::open(db)?;
    store.migrate()?;

    let events = SharedEventLog::new();
    let mut machine = SlotMachine::new(runtime, config.motion, seed.clone())
        .with_diagnostics(Box::new(events.clone()));

    if ipc_mode {
        let run_id = format!("ipc-{}", chrono::Utc::now().timestamp());
        return run_ipc_loop(&mut machine, &store, &events, &run_id);
    }

    let heat = HeatSystem::new(spec.heat, config.heat);
    let mut run = RunManager::new(config.run, heat, store);
    run.new_run(seed)?;
    let run_id = run.progress().run_id.clone();

    loop {
        match run.state() {
            GameState::End => break,
            GameState::Start | GameState::Encounter => {
                let start_heat = run.progress().machine.heat;
                let outcome =
                    play_fight(&mut machine, &config, heat, start_heat, manual, stop_interval)?;
                flush_events(run.store(), &events, &run_id)?;
                println!(
                    "  day {:>2} fight: credits {:>6.1} heat {:>5.1} tickets +{} damage {:.1}",
                    run.progress().day,
                    outcome.total_credits,
                    outcome.heat_end,
                    outcome.tickets_earned,
                    outcome.damage_taken
                );
                run.resolve_encounter(&outcome)?;
                if run.state() != GameState::End {
                    run.advance_node()?;
                }
            }
            GameState::Shop => {
                let progress = run.progress();
                let action = if heat.tier(progress.machine.heat) >= HeatTier::OnFire {
                    ShopAction::ReduceHeat
                } else {
                    ShopAction::Heal
                };
                if run.apply_shop_action(action)? {
                    println!("  shop: {action:?}");
                }
                run.advance_node()?;
            }
        }
    }
    let won = run.progress().health > 0.0;
    run.end_run(won)?;

    print_summary(&run, &spec.id)?;
    Ok(())
}

fn play_fight(
    machine: &mut SlotMachine,
    config: &SlotConfig,
    heat: HeatSystem,
    initial_heat: f64,
    manual: bool,
    stop_interval: f64,
) -> Result<FightOutcome> {
    machine.apply_heat_tier(heat.tier(initial_heat));
    machine.regenerate_reels(None)?;
    machine.begin_round();

    let mut fight = FightManager::new(heat);
    fight.start(config.fight.clone(), initial_heat);
    let outcome = if manual {
        let mut port = ManualPlay::new(machine, SpinTimer::new(stop_interval));
        fight.play(&mut port)?
    } else {
        fight.play(machine)?
    };
    Ok(outcome)
}

fn flush_events(store: &SlotStore, events: &SharedEventLog, run_id: &str) -> Result<()> {
    for event in events.drain() {
        store.append_event(&EventLogEntry::from_event(run_id, &event)?)?;
    }
    Ok(())
}

fn run_ipc_loop(
    machine: &mut SlotMachine,
    store: &SlotStore,
    events: &SharedEventLog,
    run_id: &str,
) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(&buffer) {
            Ok(v) => v,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };
        if value.get("cmd").and_then(|c| c.as_str()) == Some("quit") {
            break;
        }

        let reply = serde_json::from_value::<PlayerCommand>(value)
            .map_err(anyhow::Error::from)
            .and_then(|cmd| execute(machine, cmd).map_err(anyhow::Error::from));
        match reply {
            Ok(reply) => writeln!(stdout, "{}", serde_json::to_string(&reply)?)?,
            Err(e) => writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?,
        }
        stdout.flush()?;
        flush_events(store, events, run_id)?;
    }
    Ok(())
}

fn print_summary(run: &RunManager<SlotStore>, machine: &str) -> Result<()> {
    let progress = run.progress();
    let spins_logged = run.store().event_count(&progress.run_id, "spin_completed")?;
    let saved = run.store().load()?;

    let summary = RunSummary {
        run_id: &progress.run_id,
        seed: progress.seed.to_string(),
        machine,
        days: progress.day,
        nodes: progress.node_index,
        tickets: progress.tickets,
        total_credits: progress.total_credits,
        health: progress.health,
        heat: progress.machine.heat,
        won: run.won(),
        spins_logged,
    };

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", summary.run_id);
    println!("  seed:           {}", summary.seed);
    println!("  machine:        {}", summary.machine);
    println!("  days:           {}", summary.days);
    println!("  nodes:          {}", summary.nodes);
    println!("  tickets:        {}", summary.tickets);
    println!("  total credits:  {:.1}", summary.total_credits);
    println!("  health:         {:.1}", summary.health);
    println!("  heat:           {:.1}", summary.heat);
    println!("  result:         {}", match summary.won {
        Some(true) => "win",
        Some(false) => "loss",
        None => "unfinished",
    });
    println!("  spins logged:   {}", summary.spins_logged);
    println!("  saved:          {}", if saved.is_some() { "yes" } else { "no" });
    log::debug!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
