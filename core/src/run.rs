//! Run manager: the node-by-node loop of encounters and shops.
//!
//! RULE: every transition that changes `RunProgress` saves it before
//! returning. A save failure is returned to the caller; the in-memory
//! progress keeps the change.

use crate::config::RunConfig;
use crate::error::SlotResult;
use crate::fight::FightOutcome;
use crate::heat::HeatSystem;
use crate::port::ProgressStore;
use crate::rng::RngSeed;
use crate::snapshot::{EnemySnapshot, RunProgress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Start,
    Encounter,
    Shop,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopAction {
    ReduceHeat,
    Heal,
}

pub struct RunManager<S: ProgressStore> {
    config: RunConfig,
    heat: HeatSystem,
    store: S,
    state: GameState,
    progress: RunProgress,
    won: Option<bool>,
}

impl<S: ProgressStore> RunManager<S> {
    pub fn new(config: RunConfig, heat: HeatSystem, store: S) -> Self {
        let progress = RunProgress::fresh(
            String::new(),
            RngSeed::Number(0),
            config.starting_health,
            config.enemy_base_hp,
        );
        Self { config, heat, store, state: GameState::Start, progress, won: None }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `Some(win)` once the run has ended through `end_run`.
    pub fn won(&self) -> Option<bool> {
        self.won
    }

    fn save(&mut self) -> SlotResult<()> {
        self.store.save(&self.progress)
    }

    fn enemy_for_tier(&self, tier: u32) -> EnemySnapshot {
        let hp = self.config.enemy_base_hp
            + self.config.enemy_hp_per_tier * f64::from(tier.saturating_sub(1));
        EnemySnapshot { tier, hp }
    }

    pub fn new_run(&mut self, seed: RngSeed) -> SlotResult<()> {
        let run_id = Uuid::new_v4().to_string();
        self.progress = RunProgress::fresh(
            run_id,
            seed,
            self.config.starting_health,
            self.config.enemy_base_hp,
        );
        self.progress.enemy = self.enemy_for_tier(1);
        self.state = GameState::Encounter;
        self.won = None;
        log::info!("New run {} (seed {})", self.progress.run_id, self.progress.seed);
        self.save()
    }

    /// Resume from the store. Returns false when nothing was saved.
    pub fn continue_run(&mut self) -> SlotResult<bool> {
        let Some(progress) = self.store.load()? else {
            return Ok(false);
        };
        self.state = if progress.health <= 0.0 || progress.node_index >= self.config.path_length {
            GameState::End
        } else if progress.node_index == 1 {
            GameState::Shop
        } else {
            GameState::Encounter
        };
        log::info!(
            "Continuing run {} at node {} ({:?})",
            progress.run_id, progress.node_index, self.state
        );
        self.progress = progress;
        Ok(true)
    }

    pub fn enter_encounter(&mut self) {
        self.state = GameState::Encounter;
    }

    pub fn enter_shop(&mut self) {
        self.state = GameState::Shop;
    }

    /// Fold a fight into the run. Player damage comes off health, credits
    /// come off the enemy. Health reaching 0 ends the run.
    pub fn resolve_encounter(&mut self, outcome: &FightOutcome) -> SlotResult<()> {
        let p = &mut self.progress;
        p.total_credits += outcome.total_credits;
        p.machine.heat = outcome.heat_end.max(0.0);
        p.machine.last_payout = outcome.total_credits;
        p.tickets += outcome.tickets_earned;
        p.health = (p.health - outcome.damage_taken).max(0.0);
        p.enemy.hp = (p.enemy.hp - outcome.total_credits).max(0.0);
        p.day += 1;

        log::info!(
            "Encounter resolved: credits {} tickets {} health {} enemy hp {}",
            outcome.total_credits, p.tickets, p.health, p.enemy.hp
        );

        if p.health <= 0.0 {
            return self.end_run(false);
        }
        self.state = GameState::Shop;
        self.save()
    }

    /// Spend tickets. Returns false (and changes nothing) when the player
    /// cannot afford the action.
    pub fn apply_shop_action(&mut self, action: ShopAction) -> SlotResult<bool> {
        let cost = self.config.shop_action_cost;
        if self.progress.tickets < cost {
            return Ok(false);
        }
        self.progress.tickets -= cost;
        match action {
            ShopAction::ReduceHeat => {
                self.progress.machine.heat =
                    (self.progress.machine.heat - self.config.shop_heat_reduction).max(0.0);
            }
            ShopAction::Heal => {
                self.progress.health = (self.progress.health + self.config.shop_heal)
                    .min(self.config.starting_health);
            }
        }
        log::info!("Shop action {action:?}: {} tickets left", self.progress.tickets);
        self.save()?;
        Ok(true)
    }

    /// Step along the path: heat bleeds off between nodes and a defeated
    /// enemy is replaced by the next tier.
    pub fn advance_node(&mut self) -> SlotResult<()> {
        self.progress.node_index += 1;
        self.progress.machine.heat = self.heat.on_between_nodes(self.progress.machine.heat);
        if self.progress.enemy.hp <= 0.0 {
            self.progress.enemy = self.enemy_for_tier(self.progress.enemy.tier + 1);
        }

        self.state = if self.progress.node_index >= self.config.path_length {
            GameState::End
        } else if self.progress.node_index == 1 {
            GameState::Shop
        } else {
            GameState::Encounter
        };
        log::info!("Advanced to node {} ({:?})", self.progress.node_index, self.state);
        self.save()
    }

    pub fn end_run(&mut self, win: bool) -> SlotResult<()> {
        self.state = GameState::End;
        self.won = Some(win);
        log::info!("Run {} ended ({})", self.progress.run_id, if win { "win" } else { "loss" });
        self.save()
    }
}
