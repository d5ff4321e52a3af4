//! War power, damage and simultaneous-death arbitration
//!
//! Two damage formulas coexist and are deliberately kept apart:
//! `duel_damage` scales the phase war power, `mass_damage` is the
//! crew-driven formula of the round-robin scheduler.

use serde::{Deserialize, Serialize};

use crate::battle::modifiers::Multipliers;
use crate::battle::unit_type::AdvantageTable;
use crate::battle::units::CombatUnit;
use crate::core::config::EngineConfig;
use crate::core::rng::BattleRng;

/// Attacker's offensive rating: troop attack plus commander contribution
pub fn attack_power(unit: &CombatUnit) -> f64 {
    unit.troop.attack + unit.leadership() / 10.0 + unit.fighting_stat() / 10.0
}

/// Share of full defense a troop block reaches at `hp` troops
pub fn crew_coefficient(hp: u32, config: &EngineConfig) -> f64 {
    (f64::from(hp) / config.crew_coef_divisor + config.crew_coef_base)
        .clamp(config.crew_coef_base, config.crew_coef_max)
        / 100.0
}

pub fn defense_power(unit: &CombatUnit, config: &EngineConfig) -> f64 {
    unit.troop.defense * crew_coefficient(unit.state.hp, config)
}

/// Proficiency ratio term, 1.0 when neither side is trained in its arm
pub fn dex_term(attacker: &CombatUnit, defender: &CombatUnit, config: &EngineConfig) -> f64 {
    let atk = attacker.own_dex();
    let def = defender.own_dex();
    if atk < config.dex_negligible && def < config.dex_negligible {
        return 1.0;
    }
    let ratio = if def <= 0.0 { 2.0 } else { (atk / def).clamp(0.5, 2.0) };
    0.8 + ratio * 0.2
}

/// Troop advantage: attack coefficient over the defender's resistance
pub fn advantage(attacker: &CombatUnit, defender: &CombatUnit, table: &AdvantageTable) -> f64 {
    let attack = table.attack_coef(attacker.troop.id, defender.arm());
    let resist = table.defense_coef(defender.troop.id, attacker.arm());
    if resist <= 0.0 {
        return attack;
    }
    attack / resist
}

/// War power of `attacker` striking `defender` in one duel phase
pub fn war_power(
    attacker: &CombatUnit,
    defender: &CombatUnit,
    att_mult: &Multipliers,
    def_mult: &Multipliers,
    table: &AdvantageTable,
    config: &EngineConfig,
    rng: &mut BattleRng,
) -> f64 {
    let mut raw = config.arm_per_phase + attack_power(attacker) - defense_power(defender, config);
    if raw < config.raw_power_floor {
        let avg = (raw.max(0.0) + config.raw_power_floor) / 2.0;
        raw = rng.next_range_int(avg.floor() as i64, config.raw_power_floor as i64) as f64;
    }

    let atmos = config.clamp_stat(attacker.state.atmos * att_mult.morale);
    let train = defender.state.train.max(config.train_floor);

    let mut power = raw;
    power *= atmos / 100.0;
    power /= train / 100.0;
    power *= dex_term(attacker, defender, config);
    power *= advantage(attacker, defender, table);
    power *= att_mult.attack;
    if def_mult.defense > 0.0 {
        power /= def_mult.defense;
    }
    power.max(0.0)
}

pub fn injury_penalty(injury: f64, config: &EngineConfig) -> f64 {
    1.0 - injury.clamp(0.0, config.duel_injury_cap) / config.duel_injury_divisor
}

/// Critical / avoid outcome of one blow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlowRoll {
    pub critical: bool,
    pub avoided: bool,
}

impl BlowRoll {
    pub fn multiplier(&self, config: &EngineConfig) -> f64 {
        let mut value = 1.0;
        if self.critical {
            value *= config.critical_multiplier;
        }
        if self.avoided {
            value *= config.avoid_multiplier;
        }
        value
    }
}

pub fn roll_blow(striker: &CombatUnit, receiver: &CombatUnit, rng: &mut BattleRng) -> BlowRoll {
    BlowRoll {
        critical: rng.next_bool(striker.troop.critical / 100.0),
        avoided: rng.next_bool(receiver.troop.avoid / 100.0),
    }
}

/// Duel damage of one blow, at least 1.
///
/// Not capped at the receiver's hp: `arbitrate` needs the overkill to decide
/// which side of a simultaneous exchange falls.
pub fn duel_damage(
    war_power: f64,
    multiply: f64,
    striker_injury: f64,
    config: &EngineConfig,
    rng: &mut BattleRng,
) -> u32 {
    let spread = rng.range(config.damage_random_min, config.damage_random_max);
    let raw = war_power * multiply * spread * injury_penalty(striker_injury, config);
    let damage = raw.round().max(1.0);
    damage.min(f64::from(u32::MAX)) as u32
}

/// Mass-mode damage: crew-driven, divided by the defense rating
pub fn mass_damage(
    attacker: &CombatUnit,
    defender: &CombatUnit,
    att_mult: &Multipliers,
    def_mult: &Multipliers,
    table: &AdvantageTable,
    config: &EngineConfig,
    rng: &mut BattleRng,
) -> u32 {
    let crew = f64::from(attacker.state.max_hp).sqrt();
    let attack = attacker.troop.attack / 100.0;
    let leadership = 0.5 + attacker.leadership() / 100.0;
    let strength = 0.75 + attacker.fighting_stat() / 200.0;
    let train = attacker.state.train / 100.0;
    let atk_atmos = config.clamp_stat(attacker.state.atmos * att_mult.morale);
    let def_atmos = config.clamp_stat(defender.state.atmos * def_mult.morale);
    let spread = rng.range(config.damage_random_min, config.damage_random_max);

    let defense_rating = (defender.troop.defense * def_mult.defense / config.mass_defense_base).max(f64::EPSILON);
    let morale_swing = (1.0 + (atk_atmos - def_atmos) / 100.0 * config.mass_morale_weight).max(0.0);

    let raw = crew
        * attack
        * leadership
        * strength
        * train
        * (atk_atmos / 100.0)
        * advantage(attacker, defender, table)
        * dex_term(attacker, defender, config)
        * injury_penalty(attacker.injury(), config)
        * spread
        * att_mult.attack
        / defense_rating
        * morale_swing;

    // Nudge past float noise so exact products do not floor one short
    let damage = (raw + 1e-6).floor().max(1.0);
    (damage.min(f64::from(u32::MAX)) as u32).min(defender.state.hp)
}

/// Walls strike back in proportion to the assaulting commander's leadership
pub fn fortification_retaliation(attacker: &CombatUnit, config: &EngineConfig, rng: &mut BattleRng) -> u32 {
    let spread = rng.range(config.damage_random_min, config.damage_random_max);
    let raw = attacker.leadership() * config.city_retaliation_per_leadership * spread;
    raw.round().max(1.0).min(f64::from(u32::MAX)) as u32
}

/// Scale a simultaneous exchange so that at most one side reaches 0 hp.
///
/// Returns `(damage_to_a, damage_to_b)`. When a blow would overkill, the side
/// with the higher damage/hp ratio is clipped to exactly its hp and the other
/// blow shrinks by the same factor. Only an exact tie lets both die.
pub fn arbitrate(damage_to_a: u32, hp_a: u32, damage_to_b: u32, hp_b: u32) -> (u32, u32) {
    let ratio = |damage: u32, hp: u32| {
        if hp == 0 {
            f64::INFINITY
        } else {
            f64::from(damage) / f64::from(hp)
        }
    };
    let ratio_a = ratio(damage_to_a, hp_a);
    let ratio_b = ratio(damage_to_b, hp_b);
    let worst = ratio_a.max(ratio_b);
    if worst <= 1.0 {
        return (damage_to_a, damage_to_b);
    }

    let shrink = |damage: u32| (f64::from(damage) / worst).floor() as u32;
    if ratio_a > ratio_b {
        (hp_a, shrink(damage_to_b).min(hp_b.saturating_sub(1)))
    } else if ratio_b > ratio_a {
        (shrink(damage_to_a).min(hp_a.saturating_sub(1)), hp_b)
    } else {
        (hp_a, hp_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::setup::{CommanderInput, NationConfig, SideConfig};
    use crate::battle::unit_type::{ScenarioTables, TroopTable, TroopType};
    use crate::core::types::Side;

    fn plain_troops() -> TroopTable {
        let mut troops = TroopTable::new();
        troops.insert(TroopType::baseline(1));
        troops
    }

    fn commander(side: Side, hp: u32) -> CombatUnit {
        let input = CommanderInput::new(1, "병사", hp, 1).with_stats(50.0, 50.0, 50.0);
        let side_config = SideConfig::new(NationConfig::new(1, "한"), Vec::new());
        CombatUnit::from_commander(&input, side, &side_config, &plain_troops(), &EngineConfig::default())
    }

    #[test]
    fn test_worked_duel_example() {
        let config = EngineConfig::default();
        let mut rng = BattleRng::pinned(1.0);
        let a = commander(Side::Attacker, 10_000);
        let d = commander(Side::Defender, 10_000);
        assert_eq!(attack_power(&a), 110.0);
        assert_eq!(defense_power(&d, &config), 100.0);

        let wp = war_power(&a, &d, &Multipliers::NEUTRAL, &Multipliers::NEUTRAL, &AdvantageTable::new(), &config, &mut rng);
        assert!((wp - 510.0).abs() < 1e-9);
        assert_eq!(duel_damage(wp, 1.0, 0.0, &config, &mut rng), 510);
    }

    #[test]
    fn test_worked_mass_example() {
        let config = EngineConfig::default();
        let mut rng = BattleRng::pinned(1.0);
        let a = commander(Side::Attacker, 10_000);
        let d = commander(Side::Defender, 10_000);
        let dmg = mass_damage(&a, &d, &Multipliers::NEUTRAL, &Multipliers::NEUTRAL, &AdvantageTable::new(), &config, &mut rng);
        assert_eq!(dmg, 120);
    }

    #[test]
    fn test_small_crew_weakens_defense() {
        let config = EngineConfig::default();
        let d = commander(Side::Defender, 100);
        assert!((crew_coefficient(100, &config) - 0.70).abs() < 0.01);
        assert!(defense_power(&d, &config) < 71.0);
        assert_eq!(crew_coefficient(50_000, &config), 1.0);
    }

    #[test]
    fn test_low_raw_power_rerolled_into_floor_band() {
        let config = EngineConfig::default();
        let mut a = commander(Side::Attacker, 10_000);
        let mut d = commander(Side::Defender, 10_000);
        a.troop.attack = 0.0;
        d.troop.defense = 1000.0;
        // raw = 500 + 10 - 1000 < 0 → floor 0, avg 50, roll in [50, 100]
        let mut rng = BattleRng::from_u64(3);
        for _ in 0..200 {
            let wp = war_power(&a, &d, &Multipliers::NEUTRAL, &Multipliers::NEUTRAL, &AdvantageTable::new(), &config, &mut rng);
            assert!((50.0..=100.0).contains(&wp), "war power {wp} outside floor band");
        }
    }

    #[test]
    fn test_dex_term() {
        let config = EngineConfig::default();
        let mut a = commander(Side::Attacker, 100);
        let mut d = commander(Side::Defender, 100);
        assert_eq!(dex_term(&a, &d, &config), 1.0);
        if let crate::battle::units::UnitKind::Commander(p) = &mut a.kind {
            p.dex[0] = 400.0;
        }
        if let crate::battle::units::UnitKind::Commander(p) = &mut d.kind {
            p.dex[0] = 100.0;
        }
        assert!((dex_term(&a, &d, &config) - 1.2).abs() < 1e-12);
        assert!((dex_term(&d, &a, &config) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_advantage_from_standard_table() {
        let config = EngineConfig::default();
        let tables = ScenarioTables::standard(0);
        let side_config = SideConfig::default();
        let cav = CombatUnit::from_commander(&CommanderInput::new(1, "기", 100, 1300), Side::Attacker, &side_config, &tables.troops, &config);
        let foot = CombatUnit::from_commander(&CommanderInput::new(2, "보", 100, 1100), Side::Defender, &side_config, &tables.troops, &config);
        // cavalry strikes footmen at 1.2, footmen resist cavalry at 0.9
        assert!((advantage(&cav, &foot, &tables.advantages) - 1.2 / 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_damage_floor_and_overkill() {
        let config = EngineConfig::default();
        let mut rng = BattleRng::pinned(1.0);
        assert_eq!(duel_damage(0.0, 1.0, 0.0, &config, &mut rng), 1);
        // overkill is kept for arbitration
        assert_eq!(duel_damage(10_000.0, 1.0, 0.0, &config, &mut rng), 10_000);
    }

    #[test]
    fn test_injury_reduces_damage() {
        let config = EngineConfig::default();
        let mut rng = BattleRng::pinned(1.0);
        assert_eq!(duel_damage(600.0, 1.0, 60.0, &config, &mut rng), 300);
        assert!((injury_penalty(200.0, &config) - (1.0 - 80.0 / 120.0)).abs() < 1e-12);
    }

    #[test]
    fn test_blow_multiplier() {
        let config = EngineConfig::default();
        let both = BlowRoll { critical: true, avoided: true };
        assert!((both.multiplier(&config) - 0.75).abs() < 1e-12);
        assert_eq!(BlowRoll::default().multiplier(&config), 1.0);
    }

    #[test]
    fn test_arbitrate_no_overkill_untouched() {
        assert_eq!(arbitrate(100, 500, 200, 500), (100, 200));
    }

    #[test]
    fn test_arbitrate_clips_worse_side() {
        // b would take 3x its hp, a would take 2x → b dies, a survives
        let (to_a, to_b) = arbitrate(200, 100, 300, 100);
        assert_eq!(to_b, 100);
        assert!(to_a < 100);
        assert_eq!(to_a, 66);
    }

    #[test]
    fn test_arbitrate_tie_kills_both() {
        assert_eq!(arbitrate(200, 100, 400, 200), (100, 200));
    }

    #[test]
    fn test_fortification_retaliation_scales_with_leadership() {
        let config = EngineConfig::default();
        let mut rng = BattleRng::pinned(1.0);
        let a = commander(Side::Attacker, 10_000);
        assert_eq!(fortification_retaliation(&a, &config, &mut rng), 250);
    }
}
