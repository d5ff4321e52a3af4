//! Withdrawal checks and pursuit/retreat resolution
//!
//! A duel participant stops when it dies, starves or uses up its
//! engagement window. The loser of a duel then takes retreat losses, and
//! a winner with enough morale may pursue.

use serde::{Deserialize, Serialize};

use crate::battle::unit_type::ArmCategory;
use crate::battle::units::{CombatUnit, UnitStatus};
use crate::core::config::EngineConfig;
use crate::core::rng::BattleRng;
use crate::core::types::Phase;

/// Why a unit left the fight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Dead,
    Starved,
    Exhausted,
}

impl StopReason {
    pub fn status(&self) -> UnitStatus {
        match self {
            StopReason::Dead => UnitStatus::Dead,
            StopReason::Starved => UnitStatus::Routed,
            StopReason::Exhausted => UnitStatus::Retreated,
        }
    }
}

/// First stop condition that holds, checked in severity order
pub fn check_stop(unit: &CombatUnit, phase_cap: Option<Phase>) -> Option<StopReason> {
    if unit.state.hp == 0 {
        return Some(StopReason::Dead);
    }
    if unit.state.is_starving() {
        return Some(StopReason::Starved);
    }
    match phase_cap {
        Some(cap) if unit.state.phase >= cap => Some(StopReason::Exhausted),
        _ => None,
    }
}

/// Mark a unit as withdrawn for `reason`
pub fn apply_stop(unit: &mut CombatUnit, reason: StopReason) {
    unit.state.finish(reason.status());
}

/// Morale a winner needs before it may chase a beaten opponent
pub fn pursuit_threshold(arm: ArmCategory, config: &EngineConfig) -> f64 {
    match arm {
        ArmCategory::Cavalry => config.pursuit_morale_cavalry,
        ArmCategory::Archer | ArmCategory::Wizard => config.pursuit_morale_archer,
        _ => config.pursuit_morale_other,
    }
}

pub fn can_pursue(winner: &CombatUnit, config: &EngineConfig) -> bool {
    !winner.is_fortification()
        && winner.state.hp > 0
        && winner.state.atmos > pursuit_threshold(winner.arm(), config)
}

/// Losses inflicted after a duel is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PursuitOutcome {
    /// Extra losses from the disorderly retreat
    pub retreat_losses: u32,
    /// Extra losses from a successful pursuit
    pub pursuit_losses: u32,
    pub pursued: bool,
}

impl PursuitOutcome {
    pub fn total(&self) -> u32 {
        self.retreat_losses + self.pursuit_losses
    }
}

/// Roll retreat and pursuit losses for `loser`, capped at its remaining hp.
///
/// The loser is not mutated; the caller applies the losses.
pub fn roll_pursuit(
    winner: &CombatUnit,
    loser: &CombatUnit,
    config: &EngineConfig,
    rng: &mut BattleRng,
) -> PursuitOutcome {
    let mut outcome = PursuitOutcome::default();
    let mut remaining = loser.state.hp;
    if remaining == 0 {
        return outcome;
    }

    let share = rng.range(config.retreat_loss_min, config.retreat_loss_max);
    let retreat = (f64::from(loser.state.duel_deaths) * share).round() as u32;
    outcome.retreat_losses = retreat.min(remaining);
    remaining -= outcome.retreat_losses;

    if remaining > 0 && can_pursue(winner, config) {
        let chance = rng.range(config.pursuit_chance_min, config.pursuit_chance_max);
        if rng.next_bool(chance) {
            let share = rng.range(config.pursuit_damage_min, config.pursuit_damage_max);
            let extra = (winner.state.last_war_power * share).round().max(0.0) as u32;
            outcome.pursuit_losses = extra.min(remaining);
            outcome.pursued = true;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::setup::{CommanderInput, SideConfig};
    use crate::battle::unit_type::ScenarioTables;
    use crate::core::types::Side;

    fn unit(crew_type: u32, crew: u32) -> CombatUnit {
        let tables = ScenarioTables::standard(0);
        CombatUnit::from_commander(
            &CommanderInput::new(1, "장수", crew, crew_type),
            Side::Attacker,
            &SideConfig::default(),
            &tables.troops,
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_stop_order() {
        let mut u = unit(1100, 1000);
        assert_eq!(check_stop(&u, Some(7)), None);
        u.state.phase = 7;
        assert_eq!(check_stop(&u, Some(7)), Some(StopReason::Exhausted));
        assert_eq!(check_stop(&u, None), None);
        u.state.supply = crate::battle::units::SupplyStock::Limited(1.0);
        assert_eq!(check_stop(&u, Some(7)), Some(StopReason::Starved));
        u.state.take_damage(1000);
        assert_eq!(check_stop(&u, Some(7)), Some(StopReason::Dead));
    }

    #[test]
    fn test_apply_stop_marks_finished() {
        let mut u = unit(1100, 1000);
        apply_stop(&mut u, StopReason::Starved);
        assert!(u.state.finished);
        assert_eq!(u.state.status, UnitStatus::Routed);
        assert!(!u.is_valid_target());
    }

    #[test]
    fn test_pursuit_thresholds_by_arm() {
        let config = EngineConfig::default();
        assert_eq!(pursuit_threshold(ArmCategory::Cavalry, &config), 50.0);
        assert_eq!(pursuit_threshold(ArmCategory::Archer, &config), 60.0);
        assert_eq!(pursuit_threshold(ArmCategory::Footman, &config), 80.0);

        let mut foot = unit(1100, 100);
        foot.state.atmos = 70.0;
        assert!(!can_pursue(&foot, &config));
        let mut cav = unit(1300, 100);
        cav.state.atmos = 70.0;
        assert!(can_pursue(&cav, &config));
    }

    #[test]
    fn test_pinned_pursuit_losses() {
        let config = EngineConfig::default();
        let mut rng = BattleRng::pinned(1.0);
        let mut winner = unit(1300, 1000);
        winner.state.last_war_power = 500.0;
        let mut loser = unit(1100, 5000);
        loser.state.take_damage(1000);

        // retreat share pins to 0.3, pursuit chance to 0.6 (fails: next() ≥ 0.6)
        let outcome = roll_pursuit(&winner, &loser, &config, &mut rng);
        assert_eq!(outcome.retreat_losses, 300);
        assert!(!outcome.pursued);
        assert_eq!(outcome.total(), 300);
    }

    #[test]
    fn test_pursuit_capped_at_remaining_hp() {
        let config = EngineConfig::default();
        let mut rng = BattleRng::pinned(0.0);
        let mut winner = unit(1300, 1000);
        winner.state.last_war_power = 10_000.0;
        let mut loser = unit(1100, 1000);
        loser.state.take_damage(990);

        // share pins to 0.1 → 99 retreat losses, capped at the 10 left
        let outcome = roll_pursuit(&winner, &loser, &config, &mut rng);
        assert_eq!(outcome.retreat_losses, 10);
        assert_eq!(outcome.pursuit_losses, 0);
        assert!(outcome.total() <= loser.state.hp);
    }

    #[test]
    fn test_annihilated_loser_takes_nothing() {
        let config = EngineConfig::default();
        let mut rng = BattleRng::from_u64(1);
        let winner = unit(1300, 1000);
        let mut loser = unit(1100, 100);
        loser.state.take_damage(100);
        assert_eq!(roll_pursuit(&winner, &loser, &config, &mut rng), PursuitOutcome::default());
    }
}
