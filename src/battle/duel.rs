//! Duel combat: one principal against a queue of opponents
//!
//! Field and siege battles put the first attacker against the queued
//! defenders; a defense battle mirrors that. A siege ends at the city
//! walls once the queue is exhausted (or the defenders' stores have already
//! collapsed).
//!
//! Approach → Combat ⇄ Pursuit/Retreat → Result. Only the principal's phase
//! counter advances; the battle ends when the principal falls, withdraws, or
//! runs out of opponents, or when the phase budget is spent.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::battle::constants::*;
use crate::battle::engine::RunEnv;
use crate::battle::modifiers::unit_multipliers;
use crate::battle::morale::{apply_stop, check_stop, roll_pursuit, StopReason};
use crate::battle::narration;
use crate::battle::mass::{city_label, result_line, side_label};
use crate::battle::report::{
    apply_aftermath, BattleLog, BattleResult, BattleSummary, ConquestReward, ExchangeKind,
    ExchangeRecord, OutcomeKind, Winner,
};
use crate::battle::resolution::{arbitrate, duel_damage, fortification_retaliation, roll_blow, war_power, BlowRoll};
use crate::battle::setup::{BattleConfig, BattleContext, BattleKind, BattlePhase};
use crate::battle::unit_type::ArmCategory;
use crate::battle::units::{CombatUnit, UnitKind, UnitStatus};
use crate::core::rng::BattleRng;
use crate::core::types::{Phase, Side, UnitIndex};

/// Resolve `battle` with the duel scheduler
pub fn run_duel(battle: &BattleConfig, env: &RunEnv<'_>, rng: &mut BattleRng) -> BattleResult {
    if battle.attacker.commanders.is_empty() {
        debug!("duel battle with no attackers, returning empty result");
        return BattleResult::empty();
    }
    match battle.kind {
        BattleKind::Defense if battle.defender.commanders.is_empty() => {
            debug!("defense battle with no defender to hold, returning empty result");
            return BattleResult::empty();
        }
        BattleKind::Siege if battle.defender.commanders.is_empty() && battle.city.is_none() => {
            debug!("siege with neither defenders nor city, returning empty result");
            return BattleResult::empty();
        }
        _ => {}
    }

    DuelRun::new(battle, *env).resolve(rng)
}

/// How the principal's battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    PrincipalWon(OutcomeKind),
    PrincipalLost(OutcomeKind),
    Stalemate(OutcomeKind),
}

/// State of one duel battle run
struct DuelRun<'a> {
    battle: &'a BattleConfig,
    env: RunEnv<'a>,
    ctx: BattleContext,
    units: Vec<CombatUnit>,
    principal: usize,
    queue: VecDeque<usize>,
    walls: Option<usize>,
    log: BattleLog,
}

impl<'a> DuelRun<'a> {
    fn new(battle: &'a BattleConfig, env: RunEnv<'a>) -> Self {
        let ctx = BattleContext::new(battle, env.config);
        let troops = &env.tables.troops;

        let mut units = CombatUnit::roster(&battle.attacker, Side::Attacker, troops, env.config);
        let attackers = units.len();
        units.extend(CombatUnit::roster(&battle.defender, Side::Defender, troops, env.config));

        let (principal, queue): (usize, VecDeque<usize>) = match ctx.kind {
            BattleKind::Defense => (attackers, (0..attackers).collect()),
            BattleKind::Siege if battle.defender.nation.supply_collapsed => {
                debug!("defender stores collapsed, skipping to the walls");
                (0, VecDeque::new())
            }
            BattleKind::Field | BattleKind::Siege => (0, (attackers..units.len()).collect()),
        };

        let walls = match (&battle.city, ctx.kind) {
            (Some(city), BattleKind::Siege) => {
                units.push(CombatUnit::fortification(city, &battle.defender.nation, troops));
                Some(units.len() - 1)
            }
            _ => None,
        };

        Self {
            battle,
            env,
            ctx,
            units,
            principal,
            queue,
            walls,
            log: BattleLog::new(),
        }
    }

    fn resolve(mut self, rng: &mut BattleRng) -> BattleResult {
        self.log.narrate(self.env.narrator.line(
            narration::BATTLE_START,
            &[
                ("attacker", side_label(self.battle, Side::Attacker)),
                ("defender", side_label(self.battle, Side::Defender)),
                ("terrain", self.ctx.terrain.label().to_string()),
                ("weather", self.ctx.weather.label().to_string()),
            ],
        ));
        debug!(
            kind = ?self.ctx.kind,
            principal = self.units[self.principal].name(),
            queue = self.queue.len(),
            walls = self.walls.is_some(),
            "duel battle started"
        );

        self.approach(rng);
        let verdict = self.fight(rng);
        self.finish(verdict, rng)
    }

    // === APPROACH ===

    fn approach(&mut self, rng: &mut BattleRng) {
        self.ctx.phase = BattlePhase::Approach;
        let participants: Vec<usize> = std::iter::once(self.principal)
            .chain(self.queue.iter().copied())
            .collect();

        let gain = self.env.config.approach_train_gain;
        for &idx in &participants {
            let state = &mut self.units[idx].state;
            state.train = self.env.config.clamp_stat(state.train + gain);
        }

        for &idx in &participants {
            self.roll_skills(idx, rng);
        }

        let first = self.peek_opponent();
        if let Some(opp) = first {
            self.volley(self.principal, opp, rng);
            self.volley(opp, self.principal, rng);
        }
    }

    fn roll_skills(&mut self, idx: usize, rng: &mut BattleRng) {
        let skills: Vec<String> = match self.units[idx].commander() {
            Some(profile) => profile.skills.iter().filter(|s| is_known_skill(s)).cloned().collect(),
            None => return,
        };
        for skill in skills {
            if !rng.next_bool(SKILL_ACTIVATION_PCT / 100.0) {
                continue;
            }
            let unit = &mut self.units[idx];
            if skill == SKILL_CHARGE {
                unit.state.bonus_phase += CHARGE_BONUS_PHASES;
            }
            debug!(unit = unit.name(), skill = skill.as_str(), "skill activated");
            let line = self.env.narrator.line(
                narration::SKILL,
                &[
                    ("unit", unit.name().to_string()),
                    ("skill", narration::skill_label(&skill).to_string()),
                ],
            );
            unit.state.active_skills.push(skill);
            self.log.narrate(line);
        }
    }

    fn can_volley(unit: &CombatUnit) -> bool {
        !unit.is_fortification()
            && unit.is_valid_target()
            && (unit.arm().is_ranged() || unit.has_active_skill(SKILL_VOLLEY))
    }

    /// Pre-emptive strike at a fraction of a normal blow
    fn volley(&mut self, shooter: usize, target: usize, rng: &mut BattleRng) {
        if !Self::can_volley(&self.units[shooter]) || !self.units[target].is_valid_target() {
            return;
        }
        let config = self.env.config;
        let damage = {
            let s = &self.units[shooter];
            let t = &self.units[target];
            let sm = unit_multipliers(s, &self.ctx, 0, config);
            let tm = unit_multipliers(t, &self.ctx, 0, config);
            let wp = war_power(s, t, &sm, &tm, &self.env.tables.advantages, config, rng) * config.preemptive_ratio;
            duel_damage(wp, 1.0, s.injury(), config, rng)
        };

        let applied = self.units[target].state.take_damage(damage);
        self.credit(shooter, applied);
        trace!(unit = self.units[shooter].name(), damage = applied, "volley");
        self.record(ExchangeKind::Volley, shooter, target, applied, BlowRoll::default());
        let line = self.env.narrator.line(
            narration::VOLLEY,
            &[
                ("attacker", self.units[shooter].name().to_string()),
                ("defender", self.units[target].name().to_string()),
                ("damage", applied.to_string()),
            ],
        );
        self.log.narrate(line);
        if self.units[target].state.hp == 0 {
            self.stop(target, StopReason::Dead);
        }
    }

    // === COMBAT ===

    fn phase_cap(&self) -> Option<Phase> {
        let unit = &self.units[self.principal];
        let speed = unit_multipliers(unit, &self.ctx, self.ctx.turn, self.env.config).speed;
        unit.phase_cap(speed)
    }

    fn fight(&mut self, rng: &mut BattleRng) -> Verdict {
        if let Some(reason) = check_stop(&self.units[self.principal], self.phase_cap()) {
            // a volley kill has already been announced
            if self.units[self.principal].state.status == UnitStatus::Active {
                self.stop(self.principal, reason);
            }
            return Self::principal_fell(reason);
        }

        loop {
            let Some(opp) = self.current_opponent() else {
                return Verdict::PrincipalWon(self.cleared_outcome());
            };
            if self.ctx.turn >= self.ctx.max_turns {
                debug!(turns = self.ctx.turn, "phase budget exhausted");
                return Verdict::Stalemate(OutcomeKind::TurnLimit);
            }
            self.ctx.turn += 1;
            self.ctx.phase = BattlePhase::Combat;
            self.exchange(opp, rng);

            let principal_stop = check_stop(&self.units[self.principal], self.phase_cap());
            let opponent_stop = check_stop(&self.units[opp], None);

            match (principal_stop, opponent_stop) {
                (Some(reason @ (StopReason::Dead | StopReason::Starved)), other) => {
                    self.stop(self.principal, reason);
                    match other {
                        Some(opp_reason) => self.stop(opp, opp_reason),
                        None => self.pursue(opp, self.principal, rng),
                    }
                    self.end_duel(opp);
                    return Self::principal_fell(reason);
                }
                (exhausted, Some(reason)) => {
                    self.stop(opp, reason);
                    if Some(opp) == self.walls {
                        return Verdict::PrincipalWon(OutcomeKind::CityConquered);
                    }
                    self.pursue(self.principal, opp, rng);
                    self.end_duel(opp);
                    if let Some(reason) = exhausted {
                        self.stop(self.principal, reason);
                        return if self.peek_opponent().is_some() {
                            Verdict::Stalemate(OutcomeKind::Stalemate)
                        } else {
                            Verdict::PrincipalWon(self.cleared_outcome())
                        };
                    }
                }
                (Some(reason), None) => {
                    self.stop(self.principal, reason);
                    self.end_duel(opp);
                    return Verdict::Stalemate(OutcomeKind::Stalemate);
                }
                (None, None) => {}
            }
        }
    }

    fn principal_fell(reason: StopReason) -> Verdict {
        match reason {
            StopReason::Starved => Verdict::PrincipalLost(OutcomeKind::Routed),
            _ => Verdict::PrincipalLost(OutcomeKind::Decisive),
        }
    }

    fn cleared_outcome(&self) -> OutcomeKind {
        match self.ctx.kind {
            BattleKind::Field => OutcomeKind::QueueCleared,
            BattleKind::Defense => OutcomeKind::DefenseHeld,
            BattleKind::Siege if self.walls.is_some() => OutcomeKind::CityConquered,
            BattleKind::Siege => OutcomeKind::QueueCleared,
        }
    }

    /// Next opponent without starting a duel: queue first, then the walls
    fn peek_opponent(&self) -> Option<usize> {
        self.queue
            .iter()
            .copied()
            .find(|&idx| self.units[idx].is_valid_target())
            .or_else(|| self.walls.filter(|&w| self.units[w].is_valid_target()))
    }

    /// The principal's current opponent, starting a new duel if needed
    fn current_opponent(&mut self) -> Option<usize> {
        if let Some(UnitIndex(idx)) = self.units[self.principal].state.opponent {
            if self.units[idx].is_valid_target() {
                return Some(idx);
            }
        }
        while let Some(idx) = self.queue.pop_front() {
            if self.units[idx].is_valid_target() {
                self.start_duel(idx);
                return Some(idx);
            }
        }
        let walls = self.walls.filter(|&w| self.units[w].is_valid_target())?;
        self.start_duel(walls);
        Some(walls)
    }

    fn start_duel(&mut self, opp: usize) {
        let principal = self.principal;
        self.units[principal].state.opponent = Some(UnitIndex(opp));
        self.units[opp].state.opponent = Some(UnitIndex(principal));

        let line = if self.units[opp].is_fortification() {
            self.env.narrator.line(
                narration::CITY_ASSAULT,
                &[
                    ("attacker", self.units[principal].name().to_string()),
                    ("city", city_label(self.battle)),
                ],
            )
        } else {
            self.env.narrator.line(
                narration::DUEL_START,
                &[
                    ("attacker", self.units[principal].name().to_string()),
                    ("defender", self.units[opp].name().to_string()),
                ],
            )
        };
        self.log.narrate(line);
        debug!(
            principal = self.units[principal].name(),
            opponent = self.units[opp].name(),
            turn = self.ctx.turn,
            "duel started"
        );

        self.intimidate(principal, opp);
        self.intimidate(opp, principal);
    }

    fn intimidate(&mut self, source: usize, target: usize) {
        if !self.units[source].has_active_skill(SKILL_INTIMIDATE) || self.units[target].is_fortification() {
            return;
        }
        let config = self.env.config;
        let state = &mut self.units[target].state;
        state.atmos = config.clamp_stat(state.atmos - config.intimidate_morale_drop);
        let line = self
            .env
            .narrator
            .unit_event(narration::INTIMIDATED, self.units[target].name());
        self.log.narrate(line);
    }

    fn end_duel(&mut self, opp: usize) {
        debug!(
            principal = self.units[self.principal].name(),
            opponent = self.units[opp].name(),
            "duel ended"
        );
        self.units[self.principal].state.end_duel();
        self.units[opp].state.end_duel();
    }

    /// One simultaneous exchange between the principal and `opp`
    fn exchange(&mut self, opp: usize, rng: &mut BattleRng) {
        let config = self.env.config;
        let p = self.principal;

        let (to_opp, roll_p, wp_p, mult_p, to_p, roll_o, wp_o, mult_o) = {
            let pu = &self.units[p];
            let ou = &self.units[opp];
            let pm = unit_multipliers(pu, &self.ctx, self.ctx.turn, config);
            let om = unit_multipliers(ou, &self.ctx, self.ctx.turn, config);
            let table = &self.env.tables.advantages;

            let wp_p = war_power(pu, ou, &pm, &om, table, config, rng);
            let roll_p = roll_blow(pu, ou, rng);
            let mut mult_p = roll_p.multiplier(config);
            if ou.is_fortification() && pu.arm() == ArmCategory::Siege {
                mult_p *= config.siege_damage_bonus;
            }
            let to_opp = duel_damage(wp_p, mult_p, pu.injury(), config, rng);

            let (to_p, roll_o, wp_o, mult_o) = if ou.is_fortification() {
                let dmg = fortification_retaliation(pu, config, rng);
                (dmg, BlowRoll::default(), f64::from(dmg), 1.0)
            } else {
                let wp_o = war_power(ou, pu, &om, &pm, table, config, rng);
                let roll_o = roll_blow(ou, pu, rng);
                let mult_o = roll_o.multiplier(config);
                let dmg = duel_damage(wp_o, mult_o, ou.injury(), config, rng);
                (dmg, roll_o, wp_o, mult_o)
            };
            (to_opp, roll_p, wp_p, mult_p, to_p, roll_o, wp_o, mult_o)
        };

        let (to_p, to_opp) = arbitrate(to_p, self.units[p].state.hp, to_opp, self.units[opp].state.hp);

        {
            let state = &mut self.units[p].state;
            state.last_war_power = wp_p;
            state.war_power_multiply = mult_p;
            state.phase += 1;
        }
        {
            let state = &mut self.units[opp].state;
            state.last_war_power = wp_o;
            state.war_power_multiply = mult_o;
        }

        let dealt_to_opp = self.units[opp].state.take_damage(to_opp);
        self.credit(p, dealt_to_opp);
        let dealt_to_p = self.units[p].state.take_damage(to_p);
        self.credit(opp, dealt_to_p);

        trace!(
            phase = self.units[p].state.phase,
            unit = self.units[p].name(),
            damage = dealt_to_opp,
            taken = dealt_to_p,
            "duel exchange"
        );

        self.record(ExchangeKind::Duel, p, opp, dealt_to_opp, roll_p);
        let opp_kind = if self.units[opp].is_fortification() {
            ExchangeKind::Retaliation
        } else {
            ExchangeKind::Duel
        };
        self.record(opp_kind, opp, p, dealt_to_p, roll_o);
    }

    /// Kill credit and the supply spent dealing it
    fn credit(&mut self, striker: usize, dealt: u32) {
        let config = self.env.config;
        let unit = &mut self.units[striker];
        let cost = unit.troop.supply_cost;
        unit.state.record_kills(dealt);
        unit.state
            .consume_supply(f64::from(dealt) / 100.0 * config.supply_rate * cost);
    }

    fn record(&mut self, kind: ExchangeKind, striker: usize, target: usize, damage: u32, roll: BlowRoll) {
        let remaining = self.units[target].state.hp;
        self.log.record(ExchangeRecord {
            turn: self.ctx.turn,
            phase: self.units[self.principal].state.phase,
            kind,
            attacker: self.units[striker].unit_ref(),
            defender: self.units[target].unit_ref(),
            damage,
            remaining_hp: remaining,
            critical: roll.critical,
            avoided: roll.avoided,
        });
        if matches!(kind, ExchangeKind::Duel | ExchangeKind::Retaliation) {
            let line = self.env.narrator.strike(
                self.ctx.turn,
                self.units[striker].name(),
                self.units[target].name(),
                damage,
                remaining,
                roll.critical,
                roll.avoided,
            );
            self.log.narrate(line);
        }
    }

    fn stop(&mut self, idx: usize, reason: StopReason) {
        apply_stop(&mut self.units[idx], reason);
        let template = match reason {
            StopReason::Dead => narration::DEAD,
            StopReason::Starved => narration::STARVED,
            StopReason::Exhausted => narration::EXHAUSTED,
        };
        let line = self.env.narrator.unit_event(template, self.units[idx].name());
        self.log.narrate(line);
        debug!(unit = self.units[idx].name(), ?reason, "unit withdrew");
    }

    // === PURSUIT / RETREAT ===

    fn pursue(&mut self, winner: usize, loser: usize, rng: &mut BattleRng) {
        self.ctx.phase = BattlePhase::PursuitRetreat;
        let outcome = roll_pursuit(&self.units[winner], &self.units[loser], self.env.config, rng);

        if outcome.retreat_losses > 0 {
            let applied = self.units[loser].state.take_damage(outcome.retreat_losses);
            self.record(ExchangeKind::Retreat, winner, loser, applied, BlowRoll::default());
            let line = self
                .env
                .narrator
                .losses(narration::RETREAT, self.units[loser].name(), applied);
            self.log.narrate(line);
        }
        if outcome.pursuit_losses > 0 {
            let applied = self.units[loser].state.take_damage(outcome.pursuit_losses);
            self.units[winner].state.record_kills(applied);
            self.record(ExchangeKind::Pursuit, winner, loser, applied, BlowRoll::default());
            let line = self
                .env
                .narrator
                .losses(narration::PURSUIT, self.units[winner].name(), applied);
            self.log.narrate(line);
        }
        trace!(
            retreat = outcome.retreat_losses,
            pursuit = outcome.pursuit_losses,
            "pursuit resolved"
        );
    }

    // === RESULT ===

    fn finish(mut self, verdict: Verdict, rng: &mut BattleRng) -> BattleResult {
        self.ctx.phase = BattlePhase::Result;
        for unit in &mut self.units {
            unit.state.opponent = None;
        }

        let principal_side = self.units[self.principal].side;
        let (winner, outcome) = match verdict {
            Verdict::PrincipalWon(outcome) => (Winner::from_side(principal_side), outcome),
            Verdict::PrincipalLost(outcome) => {
                let other = principal_side.opponent();
                let standing = self.units.iter().any(|u| u.side == other && u.state.hp > 0);
                let winner = if standing { Winner::from_side(other) } else { Winner::Draw };
                (winner, outcome)
            }
            Verdict::Stalemate(outcome) => (Winner::Draw, outcome),
        };

        let config = self.env.config;
        let conquest = match (outcome, &self.battle.city) {
            (OutcomeKind::CityConquered, Some(city)) => {
                let unit = &mut self.units[self.principal];
                match &mut unit.kind {
                    UnitKind::Commander(profile) => {
                        let reward = ConquestReward::new(city, profile.id, config);
                        profile.experience += reward.experience;
                        Some(reward)
                    }
                    UnitKind::Fortification(_) => None,
                }
            }
            _ => None,
        };
        if conquest.is_some() {
            let line = self
                .env
                .narrator
                .line(narration::CITY_FALL, &[("city", city_label(self.battle))]);
            self.log.narrate(line);
        }

        let held_by = (outcome == OutcomeKind::DefenseHeld).then_some(UnitIndex(self.principal));
        if held_by.is_some() {
            let line = self
                .env
                .narrator
                .unit_event(narration::DEFENSE_HELD, self.units[self.principal].name());
            self.log.narrate(line);
        }

        self.log.narrate(result_line(self.battle, winner, &self.env));
        debug!(?winner, ?outcome, turns = self.ctx.turn, "duel battle finished");

        let reports = apply_aftermath(&mut self.units, winner, held_by, config, rng);
        BattleResult {
            summary: BattleSummary::from_units(&self.units, winner, outcome, self.ctx.turn),
            log: self.log,
            reports,
            conquest,
            units: self.units,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::narration::Narrator;
    use crate::battle::setup::{CityConfig, CommanderInput, NationConfig, SideConfig};
    use crate::battle::unit_type::{ScenarioTables, TroopType};
    use crate::core::config::EngineConfig;

    const ARCHERS: u32 = 2;

    fn tables() -> ScenarioTables {
        let mut tables = ScenarioTables::new(0);
        tables.troops.insert(TroopType::baseline(1));
        tables.troops.insert(TroopType {
            arm: ArmCategory::Archer,
            ..TroopType::baseline(ARCHERS)
        });
        tables
    }

    /// Baseline commander; train 99 so the approach drill brings it to 100
    fn commander(id: u32, crew: u32) -> CommanderInput {
        CommanderInput::new(id, &format!("장수{id}"), crew, 1)
            .with_stats(50.0, 50.0, 50.0)
            .with_condition(99.0, 100.0)
    }

    fn side(commanders: Vec<CommanderInput>) -> SideConfig {
        SideConfig::new(NationConfig::default(), commanders)
    }

    fn run(battle: &BattleConfig, rng: &mut BattleRng) -> BattleResult {
        let t = tables();
        let config = EngineConfig::default();
        let narrator = Narrator::default();
        let env = RunEnv { tables: &t, config: &config, narrator: &narrator };
        run_duel(battle, &env, rng)
    }

    #[test]
    fn test_pinned_duel_deals_510_until_exhausted() {
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 10_000)]),
            side(vec![commander(2, 10_000)]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));

        let duel: Vec<_> = result.log.records.iter().filter(|r| r.kind == ExchangeKind::Duel).collect();
        assert_eq!(duel.len(), 14);
        assert!(duel.iter().all(|r| r.damage == 510));
        assert_eq!(result.summary.turns, 7);
        assert_eq!(result.summary.outcome, OutcomeKind::Stalemate);
        assert_eq!(result.summary.winner, Winner::Draw);
        assert_eq!(result.units[0].state.phase, 7);
    }

    #[test]
    fn test_principal_clears_weak_queue() {
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 10_000)]),
            side(vec![commander(2, 500), commander(3, 500)]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));
        assert_eq!(result.summary.winner, Winner::Attacker);
        assert_eq!(result.summary.outcome, OutcomeKind::QueueCleared);
        assert_eq!(result.summary.defender.remaining_hp, 0);
        // one phase per defender, each killed outright
        assert_eq!(result.summary.turns, 2);
    }

    #[test]
    fn test_defense_mirrors_queue() {
        let battle = BattleConfig::new(
            BattleKind::Defense,
            side(vec![commander(1, 500), commander(2, 500)]),
            side(vec![commander(3, 10_000)]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));
        assert_eq!(result.summary.winner, Winner::Defender);
        assert_eq!(result.summary.outcome, OutcomeKind::DefenseHeld);
        let holder = result.reports.iter().find(|r| r.general.0 == 3).unwrap();
        // approach +1, victory +1, hold +2
        assert_eq!(holder.train_delta, 4.0);
    }

    #[test]
    fn test_overkill_decides_simultaneous_exchange() {
        // 540 against 544 into 100 troops each: the harder hit side falls
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 100)]),
            side(vec![commander(2, 100).with_stats(90.0, 50.0, 50.0)]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));

        let first = &result.log.records[0];
        let second = &result.log.records[1];
        assert_eq!((first.kind, second.kind), (ExchangeKind::Duel, ExchangeKind::Duel));
        assert!(first.remaining_hp > 0);
        assert_eq!(second.remaining_hp, 0);
        assert_eq!(result.summary.winner, Winner::Defender);
        assert_eq!(result.summary.outcome, OutcomeKind::Decisive);
        assert!(result.summary.defender.remaining_hp > 0);
        assert_eq!(result.summary.attacker.remaining_hp, 0);
    }

    #[test]
    fn test_even_exchange_kills_both() {
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 100)]),
            side(vec![commander(2, 100)]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));
        assert_eq!(result.summary.winner, Winner::Draw);
        assert_eq!(result.summary.attacker.remaining_hp, 0);
        assert_eq!(result.summary.defender.remaining_hp, 0);
    }

    #[test]
    fn test_volley_kill_is_announced() {
        let mut archer = commander(1, 10_000);
        archer.crew_type = ARCHERS;
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![archer]),
            side(vec![commander(2, 10)]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));

        assert_eq!(result.log.records.len(), 1);
        assert_eq!(result.log.records[0].kind, ExchangeKind::Volley);
        assert_eq!(result.units[1].state.status, UnitStatus::Dead);
        let dead = Narrator::default().unit_event(narration::DEAD, "장수2");
        assert_eq!(result.log.lines.iter().filter(|l| **l == dead).count(), 1);
        assert_eq!(result.summary.winner, Winner::Attacker);
        assert_eq!(result.summary.outcome, OutcomeKind::QueueCleared);
        assert_eq!(result.summary.turns, 0);
    }

    #[test]
    fn test_principal_shot_down_is_announced_once() {
        let mut archer = commander(2, 10_000);
        archer.crew_type = ARCHERS;
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 10)]),
            side(vec![archer]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));

        let dead = Narrator::default().unit_event(narration::DEAD, "장수1");
        assert_eq!(result.log.lines.iter().filter(|l| **l == dead).count(), 1);
        assert_eq!(result.summary.winner, Winner::Defender);
        assert_eq!(result.summary.outcome, OutcomeKind::Decisive);
    }

    #[test]
    fn test_principal_death_loses() {
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 500)]),
            side(vec![commander(2, 10_000)]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));
        assert_eq!(result.summary.winner, Winner::Defender);
        assert_eq!(result.summary.outcome, OutcomeKind::Decisive);
        assert_eq!(result.summary.attacker.remaining_hp, 0);
    }

    #[test]
    fn test_siege_without_defenders_takes_walls() {
        let battle = BattleConfig::new(BattleKind::Siege, side(vec![commander(1, 10_000)]), side(Vec::new()))
            .with_city(CityConfig::new(5, "완", 1000, 0.0))
            .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));
        assert_eq!(result.summary.outcome, OutcomeKind::CityConquered);
        assert_eq!(result.summary.winner, Winner::Attacker);
        assert_eq!(result.summary.city_hp, Some(0));
        assert!(result.log.records.iter().any(|r| r.kind == ExchangeKind::Retaliation));
        assert_eq!(result.conquest.as_ref().map(|c| c.city.0), Some(5));
    }

    #[test]
    fn test_collapsed_supply_skips_to_walls() {
        let mut defenders = side(vec![commander(2, 10_000)]);
        defenders.nation.supply_collapsed = true;
        let battle = BattleConfig::new(BattleKind::Siege, side(vec![commander(1, 10_000)]), defenders)
            .with_city(CityConfig::new(5, "완", 1000, 0.0))
            .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));
        assert_eq!(result.summary.outcome, OutcomeKind::CityConquered);
        assert_eq!(result.summary.defender.casualties, 0);
    }

    #[test]
    fn test_siege_without_city_or_defenders_is_empty() {
        let battle = BattleConfig::new(BattleKind::Siege, side(vec![commander(1, 100)]), side(Vec::new()));
        let result = run(&battle, &mut BattleRng::from_u64(1));
        assert_eq!(result.summary.outcome, OutcomeKind::Empty);
        assert!(result.log.is_empty());
    }

    #[test]
    fn test_starving_principal_routs() {
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 10_000).with_rice(50.0)]),
            side(vec![commander(2, 10_000)]),
        )
        .without_modifiers();
        let result = run(&battle, &mut BattleRng::pinned(1.0));
        // 50 rice cannot feed 10,000 troops: routed before the first exchange
        assert_eq!(result.summary.outcome, OutcomeKind::Routed);
        assert_eq!(result.summary.winner, Winner::Defender);
        assert_eq!(result.summary.turns, 0);
        assert_eq!(result.units[0].state.status, UnitStatus::Routed);
    }

    #[test]
    fn test_phase_budget_bounds_run() {
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 10_000)]),
            side(vec![commander(2, 10_000)]),
        )
        .without_modifiers()
        .with_max_turns(3);
        let result = run(&battle, &mut BattleRng::pinned(1.0));
        assert_eq!(result.summary.turns, 3);
        assert_eq!(result.summary.outcome, OutcomeKind::TurnLimit);
    }

    #[test]
    fn test_opponent_relation_cleared() {
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![commander(1, 10_000)]),
            side(vec![commander(2, 10_000)]),
        )
        .with_seed(9u64);
        let result = run(&battle, &mut BattleRng::from_u64(9));
        assert!(result.units.iter().all(|u| u.state.opponent.is_none()));
    }
}
