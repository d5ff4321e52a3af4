//! Mass combat: round-based many-vs-many resolution
//!
//! Each turn every living unit strikes a uniformly random living enemy, in
//! a shuffled order that interleaves both sides. Stops the moment one side
//! has nobody left, or at the turn budget.

use tracing::{debug, trace};

use crate::battle::constants::is_known_skill;
use crate::battle::engine::RunEnv;
use crate::battle::modifiers::unit_multipliers;
use crate::battle::narration;
use crate::battle::report::{
    apply_aftermath, winner_by_survivors, BattleLog, BattleResult, BattleSummary, ConquestReward,
    ExchangeKind, ExchangeRecord, OutcomeKind, Winner,
};
use crate::battle::resolution::{fortification_retaliation, mass_damage};
use crate::battle::setup::{BattleConfig, BattleContext, BattlePhase};
use crate::battle::units::{CombatUnit, UnitKind};
use crate::core::rng::BattleRng;
use crate::core::types::{Phase, Side};

/// Resolve `battle` with the mass scheduler
pub fn run_mass(battle: &BattleConfig, env: &RunEnv<'_>, rng: &mut BattleRng) -> BattleResult {
    if battle.attacker.commanders.is_empty() {
        debug!("mass battle with no attackers, returning empty result");
        return BattleResult::empty();
    }

    let mut ctx = BattleContext::new(battle, env.config);
    let mut units = CombatUnit::roster(&battle.attacker, Side::Attacker, &env.tables.troops, env.config);
    units.extend(CombatUnit::roster(&battle.defender, Side::Defender, &env.tables.troops, env.config));
    let city = battle.city.as_ref().filter(|_| ctx.is_siege());
    if let Some(city) = city {
        units.push(CombatUnit::fortification(city, &battle.defender.nation, &env.tables.troops));
    }

    // Every known skill is in effect for the whole battle
    for unit in &mut units {
        let skills: Vec<String> = unit
            .commander()
            .map(|c| c.skills.iter().filter(|s| is_known_skill(s)).cloned().collect())
            .unwrap_or_default();
        unit.state.active_skills = skills;
    }

    let mut log = BattleLog::new();
    log.narrate(env.narrator.line(
        narration::BATTLE_START,
        &[
            ("attacker", side_label(battle, Side::Attacker)),
            ("defender", side_label(battle, Side::Defender)),
            ("terrain", ctx.terrain.label().to_string()),
            ("weather", ctx.weather.label().to_string()),
        ],
    ));
    debug!(units = units.len(), max_turns = ctx.max_turns, "mass battle started");

    ctx.phase = BattlePhase::Combat;
    let mut turns: Phase = 0;
    for turn in 1..=ctx.max_turns {
        if !side_alive(&units, Side::Attacker) || !side_alive(&units, Side::Defender) {
            break;
        }
        ctx.turn = turn;
        turns = turn;

        for striker in exchange_order(&units, rng) {
            if !units[striker].is_valid_target() {
                continue;
            }
            let enemy = units[striker].side.opponent();
            let targets: Vec<usize> = living(&units, enemy);
            let Some(&target) = rng.pick(&targets) else {
                break;
            };
            strike(&mut units, striker, target, &ctx, env, rng, &mut log);
        }
    }

    ctx.phase = BattlePhase::Result;
    let walls_fell = units.iter().any(|u| u.is_fortification() && u.state.hp == 0);
    let mut winner = winner_by_survivors(&units);
    let outcome = if walls_fell && side_alive(&units, Side::Attacker) {
        winner = Winner::Attacker;
        OutcomeKind::CityConquered
    } else if !side_alive(&units, Side::Attacker) || !side_alive(&units, Side::Defender) {
        OutcomeKind::Decisive
    } else {
        OutcomeKind::TurnLimit
    };

    let conquest = match (outcome, city) {
        (OutcomeKind::CityConquered, Some(city)) => units
            .iter()
            .filter(|u| u.side == Side::Attacker && u.is_valid_target())
            .find_map(|u| u.commander())
            .map(|c| ConquestReward::new(city, c.id, env.config)),
        _ => None,
    };
    if let Some(reward) = &conquest {
        log.narrate(env.narrator.line(narration::CITY_FALL, &[("city", city_label(battle))]));
        for unit in units.iter_mut() {
            if let UnitKind::Commander(profile) = &mut unit.kind {
                if profile.id == reward.conqueror {
                    profile.experience += reward.experience;
                }
            }
        }
    }

    log.narrate(result_line(battle, winner, env));
    debug!(?winner, ?outcome, turns, "mass battle finished");

    let reports = apply_aftermath(&mut units, winner, None, env.config, rng);
    BattleResult {
        summary: BattleSummary::from_units(&units, winner, outcome, turns),
        log,
        reports,
        conquest,
        units,
    }
}

fn living(units: &[CombatUnit], side: Side) -> Vec<usize> {
    units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.side == side && u.is_valid_target())
        .map(|(idx, _)| idx)
        .collect()
}

fn side_alive(units: &[CombatUnit], side: Side) -> bool {
    units.iter().any(|u| u.side == side && u.is_valid_target())
}

/// Shuffle each side, then alternate starting from a random side
fn exchange_order(units: &[CombatUnit], rng: &mut BattleRng) -> Vec<usize> {
    let mut attackers = living(units, Side::Attacker);
    let mut defenders = living(units, Side::Defender);
    rng.shuffle(&mut attackers);
    rng.shuffle(&mut defenders);

    let (first, second) = if rng.next_bool(0.5) {
        (attackers, defenders)
    } else {
        (defenders, attackers)
    };
    let mut order = Vec::with_capacity(first.len() + second.len());
    let mut a = first.into_iter();
    let mut b = second.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => break,
            (x, y) => order.extend(x.into_iter().chain(y)),
        }
    }
    order
}

fn strike(
    units: &mut [CombatUnit],
    striker: usize,
    target: usize,
    ctx: &BattleContext,
    env: &RunEnv<'_>,
    rng: &mut BattleRng,
    log: &mut BattleLog,
) {
    let (damage, kind) = {
        let att = &units[striker];
        let def = &units[target];
        if att.is_fortification() {
            (fortification_retaliation(def, env.config, rng), ExchangeKind::Retaliation)
        } else {
            let att_mult = unit_multipliers(att, ctx, ctx.turn, env.config);
            let def_mult = unit_multipliers(def, ctx, ctx.turn, env.config);
            let dmg = mass_damage(att, def, &att_mult, &def_mult, &env.tables.advantages, env.config, rng);
            (dmg, ExchangeKind::Strike)
        }
    };

    let applied = units[target].state.take_damage(damage);
    let cost = units[striker].troop.supply_cost;
    units[striker].state.record_kills(applied);
    units[striker]
        .state
        .consume_supply(f64::from(applied) / 100.0 * env.config.supply_rate * cost);

    let remaining = units[target].state.hp;
    trace!(
        turn = ctx.turn,
        unit = units[striker].name(),
        target = units[target].name(),
        damage = applied,
        remaining,
        "mass strike"
    );
    log.record(ExchangeRecord {
        turn: ctx.turn,
        phase: ctx.turn,
        kind,
        attacker: units[striker].unit_ref(),
        defender: units[target].unit_ref(),
        damage: applied,
        remaining_hp: remaining,
        critical: false,
        avoided: false,
    });
    log.narrate(env.narrator.strike(
        ctx.turn,
        units[striker].name(),
        units[target].name(),
        applied,
        remaining,
        false,
        false,
    ));
    if remaining == 0 {
        log.narrate(env.narrator.unit_event(narration::DEAD, units[target].name()));
    }
}

pub(crate) fn side_label(battle: &BattleConfig, side: Side) -> String {
    let config = match side {
        Side::Attacker => &battle.attacker,
        Side::Defender => &battle.defender,
    };
    if !config.nation.name.is_empty() {
        return config.nation.name.clone();
    }
    config
        .commanders
        .first()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| match side {
            Side::Attacker => "공격군".to_string(),
            Side::Defender => "수비군".to_string(),
        })
}

pub(crate) fn city_label(battle: &BattleConfig) -> String {
    battle
        .city
        .as_ref()
        .map(|c| c.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "성".to_string())
}

pub(crate) fn result_line(battle: &BattleConfig, winner: Winner, env: &RunEnv<'_>) -> String {
    match winner.side() {
        Some(side) => env
            .narrator
            .line(narration::VICTORY, &[("side", side_label(battle, side))]),
        None => env.narrator.line(narration::DRAW, &[]),
    }
}
