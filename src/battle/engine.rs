//! Battle engine: injected tables and config, strategy dispatch
//!
//! The engine owns no per-battle state. Each run creates its own RNG and
//! unit array, so independent battles can be resolved in parallel.

use rayon::prelude::*;
use tracing::debug;

use crate::battle::duel::run_duel;
use crate::battle::mass::run_mass;
use crate::battle::narration::Narrator;
use crate::battle::report::BattleResult;
use crate::battle::setup::{BattleConfig, SchedulerMode};
use crate::battle::unit_type::{Rulebook, ScenarioTables};
use crate::core::config::EngineConfig;
use crate::core::rng::BattleRng;

/// Read-only collaborators a scheduler needs for one run
#[derive(Debug, Clone, Copy)]
pub struct RunEnv<'a> {
    pub tables: &'a ScenarioTables,
    pub config: &'a EngineConfig,
    pub narrator: &'a Narrator,
}

#[derive(Debug, Clone, Default)]
pub struct BattleEngine {
    rulebook: Rulebook,
    config: EngineConfig,
    narrator: Narrator,
}

impl BattleEngine {
    pub fn new(rulebook: Rulebook, config: EngineConfig) -> Self {
        Self {
            rulebook,
            config,
            narrator: Narrator::default(),
        }
    }

    /// Replace the narrator (e.g. with another particle picker)
    pub fn with_narrator(mut self, narrator: Narrator) -> Self {
        self.narrator = narrator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rulebook(&self) -> &Rulebook {
        &self.rulebook
    }

    fn env(&self, battle: &BattleConfig) -> RunEnv<'_> {
        RunEnv {
            tables: self.rulebook.tables(battle.scenario),
            config: &self.config,
            narrator: &self.narrator,
        }
    }

    /// Resolve a battle with the scheduler its `mode` selects, seeded from its `seed`
    pub fn run(&self, battle: &BattleConfig) -> BattleResult {
        let mut rng = BattleRng::new(&battle.seed);
        self.run_with_rng(battle, &mut rng)
    }

    pub fn run_with_rng(&self, battle: &BattleConfig, rng: &mut BattleRng) -> BattleResult {
        debug!(mode = ?battle.mode, kind = ?battle.kind, scenario = battle.scenario, "dispatching battle");
        match battle.mode {
            SchedulerMode::Mass => self.run_mass_with_rng(battle, rng),
            SchedulerMode::Duel => self.run_duel_with_rng(battle, rng),
        }
    }

    pub fn run_mass(&self, battle: &BattleConfig) -> BattleResult {
        self.run_mass_with_rng(battle, &mut BattleRng::new(&battle.seed))
    }

    pub fn run_mass_with_rng(&self, battle: &BattleConfig, rng: &mut BattleRng) -> BattleResult {
        run_mass(battle, &self.env(battle), rng)
    }

    pub fn run_duel(&self, battle: &BattleConfig) -> BattleResult {
        self.run_duel_with_rng(battle, &mut BattleRng::new(&battle.seed))
    }

    pub fn run_duel_with_rng(&self, battle: &BattleConfig, rng: &mut BattleRng) -> BattleResult {
        run_duel(battle, &self.env(battle), rng)
    }

    /// Resolve independent battles in parallel; results keep input order
    pub fn run_many(&self, battles: &[BattleConfig]) -> Vec<BattleResult> {
        battles.par_iter().map(|battle| self.run(battle)).collect()
    }
}
