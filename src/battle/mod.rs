//! Battle resolution - war power, modifiers and the two schedulers
//!
//! A battle is built from a [`BattleConfig`], resolved by [`BattleEngine`]
//! with either the mass scheduler (everyone fights every turn) or the duel
//! scheduler (one principal against a queue), and reported as a
//! [`BattleResult`].

pub mod constants;
pub mod duel;
pub mod engine;
pub mod mass;
pub mod modifiers;
pub mod morale;
pub mod narration;
pub mod report;
pub mod resolution;
pub mod setup;
pub mod terrain;
pub mod unit_type;
pub mod units;
pub mod weather;

// Re-exports for convenient access
pub use constants::*;
pub use duel::run_duel;
pub use engine::{BattleEngine, RunEnv};
pub use mass::run_mass;
pub use modifiers::{collect_modifiers, unit_multipliers, Adjustment, ModifierKind, ModifierSet, Multipliers, Targets};
pub use morale::{check_stop, roll_pursuit, PursuitOutcome, StopReason};
pub use narration::{KoreanParticles, Narrator, ParticlePicker};
pub use report::{
    BattleLog, BattleResult, BattleSummary, ConquestReward, ExchangeKind, ExchangeRecord, OutcomeKind,
    SideSummary, UnitReport, Winner,
};
pub use resolution::{arbitrate, duel_damage, mass_damage, war_power, BlowRoll};
pub use setup::{
    BattleConfig, BattleContext, BattleKind, BattlePhase, CityConfig, CommanderInput, DexInput,
    InheritedBuffs, NationConfig, SchedulerMode, SideConfig,
};
pub use terrain::Terrain;
pub use unit_type::{AdvantageTable, ArmCategory, Rulebook, ScenarioTables, TroopTable, TroopType};
pub use units::{CombatState, CombatUnit, SupplyStock, UnitKind, UnitRef, UnitStance, UnitStatus};
pub use weather::Weather;
