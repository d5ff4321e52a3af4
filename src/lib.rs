//! Sanguo Battle - deterministic combat resolution for a turn-based war game

pub mod battle;
pub mod core;

pub use battle::{BattleConfig, BattleEngine, BattleResult, Rulebook, SchedulerMode};
pub use core::{BattleError, BattleRng, BattleSeed, EngineConfig, Result};
