//! Drives one scenario from setup to the end of battle.

use std::fmt;
use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use battle_content::ContentFactory;
use battle_core::action::best_auto_action;
use battle_core::{
    BattleEndRoute, BattleEnv, BattleHost, BattleManager, BattleOutcome, BattleSnapshot,
    GameVariables, InputError, PcgRng, Phase, Rewards, UseContext,
};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::host::ConsoleHost;

/// What a finished (or abandoned) run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleReport {
    pub scenario: String,
    pub outcome: Option<BattleOutcome>,
    pub route: Option<BattleEndRoute>,
    pub phase: Phase,
    pub turns: u32,
    pub ticks: u32,
    pub rewards: Rewards,
    /// Lines printed by the host.
    pub lines: usize,
}

impl BattleReport {
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }
}

impl fmt::Display for BattleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Some(outcome) => write!(f, "{}: {}", self.scenario, outcome)?,
            None => write!(f, "{}: unfinished ({})", self.scenario, self.phase)?,
        }
        write!(f, " after {} turns, {} ticks", self.turns, self.ticks)?;
        if self.outcome == Some(BattleOutcome::Victory) {
            write!(f, "; {} exp, {} gold", self.rewards.exp, self.rewards.gold)?;
            if !self.rewards.items.is_empty() {
                write!(f, ", {} drops", self.rewards.items.len())?;
            }
            for level_up in &self.rewards.level_ups {
                write!(f, "; actor {} reached level {}", level_up.actor_id, level_up.level)?;
            }
        }
        Ok(())
    }
}

/// Loads content, runs the configured scenario and prints its log to `out`.
///
/// Player commands are filled in the way auto battle would choose them,
/// falling back to a plain attack. The run stops when the battle finishes
/// or after `config.max_ticks` controller ticks.
pub fn run_scenario<W: Write>(factory: &ContentFactory, config: &SimConfig, out: W) -> Result<BattleReport> {
    let database = factory.load_database()?;
    let battle_config = factory.load_config()?;
    let scenario = factory.load_scenario(&config.scenario)?;

    let rng = PcgRng::new(config.seed);
    let variables = GameVariables::new();
    let env = BattleEnv::new(&database, &rng, &variables, &battle_config);

    let mut manager = scenario
        .setup_battle(&env)
        .with_context(|| format!("Failed to set up scenario {}", scenario.name))?;
    info!(
        scenario = %scenario.name,
        troop_id = scenario.troop_id,
        seed = config.seed,
        preemptive = manager.is_preemptive(),
        surprise = manager.is_surprise(),
        "battle starting"
    );

    let mut host = ConsoleHost::new(out);
    manager.start_battle(&env, &mut host);
    let mut ticks = 0;
    while ticks < config.max_ticks && !manager.is_finished() {
        if manager.is_input_phase() {
            input_commands(&env, &mut manager, &mut host)?;
        }
        manager.update(&env, &mut host);
        ticks += 1;
    }
    if !manager.is_finished() {
        warn!(ticks, phase = %manager.phase(), "battle did not finish within the tick limit");
    }

    if let Some(path) = &config.snapshot_path {
        let bytes = BattleSnapshot::capture(&manager).to_bytes()?;
        fs::write(path, bytes)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        debug!(path = %path.display(), "snapshot written");
    }

    let lines = host.lines();
    host.finish().context("Failed to write battle log")?;
    Ok(BattleReport {
        scenario: scenario.name,
        outcome: manager.outcome(),
        route: manager.route(),
        phase: manager.phase(),
        turns: manager.turn_count(),
        ticks,
        rewards: manager.rewards().clone(),
        lines,
    })
}

/// Fills every remaining command slot of the party and confirms it.
fn input_commands(
    env: &BattleEnv<'_>,
    manager: &mut BattleManager,
    host: &mut dyn BattleHost,
) -> Result<(), InputError> {
    while manager.is_input_phase() {
        let choice = manager.actor().map(|actor| {
            let units = manager.combatants();
            let ctx = UseContext::battle(units.party.inventory(), manager.can_escape());
            best_auto_action(env, units, actor, &ctx)
        });
        if let (Some(choice), Some(slot)) = (choice, manager.inputting_action_mut()) {
            match choice {
                Some(action) => *slot = action,
                None => slot.set_attack(),
            }
        }
        manager.select_next_command(env, host)?;
    }
    Ok(())
}
