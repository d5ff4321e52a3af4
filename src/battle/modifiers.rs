//! Modifier stack: named adjustments folded into attack/defense/speed/morale
//!
//! `collect_modifiers` is pure: it reads a unit and the battle context and
//! returns a `ModifierSet`. The set is reduced into `Multipliers` by a fixed
//! assignment table; the multipliers feed the war-power formula.

use serde::{Deserialize, Serialize};

use crate::battle::constants::*;
use crate::battle::setup::BattleContext;
use crate::battle::units::{CombatUnit, SupplyStock};
use crate::battle::unit_type::ArmCategory;
use crate::battle::terrain::Terrain;
use crate::core::config::EngineConfig;
use crate::core::types::Side;

/// Source of an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Terrain,
    Weather,
    Morale,
    Supply,
    Training,
    Injury,
    Fatigue,
    Siege,
    Skill,
    Nation,
}

/// Which aggregates an adjustment feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Targets {
    pub attack: bool,
    pub defense: bool,
    pub speed: bool,
    pub morale: bool,
}

impl Targets {
    pub const ATTACK: Targets = Targets { attack: true, defense: false, speed: false, morale: false };
    pub const DEFENSE: Targets = Targets { attack: false, defense: true, speed: false, morale: false };
    pub const MORALE: Targets = Targets { attack: false, defense: false, speed: false, morale: true };
    pub const COMBAT: Targets = Targets { attack: true, defense: true, speed: false, morale: false };
    pub const CONDITION: Targets = Targets { attack: true, defense: true, speed: true, morale: false };
    pub const DRILL: Targets = Targets { attack: false, defense: true, speed: false, morale: true };
}

impl ModifierKind {
    /// Assignment table: the aggregates each kind feeds by default
    pub fn targets(&self) -> Targets {
        match self {
            ModifierKind::Terrain | ModifierKind::Weather | ModifierKind::Siege => Targets::COMBAT,
            ModifierKind::Supply | ModifierKind::Fatigue | ModifierKind::Injury => Targets::CONDITION,
            ModifierKind::Training => Targets::DRILL,
            ModifierKind::Morale => Targets::MORALE,
            ModifierKind::Skill | ModifierKind::Nation => Targets::ATTACK,
        }
    }
}

/// One named multiplicative adjustment (1.0 = neutral)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub kind: ModifierKind,
    pub value: f64,
    pub targets: Targets,
}

impl Adjustment {
    pub fn new(kind: ModifierKind, value: f64) -> Self {
        Self {
            kind,
            value,
            targets: kind.targets(),
        }
    }

    /// Adjustment that overrides the assignment table
    pub fn targeting(kind: ModifierKind, value: f64, targets: Targets) -> Self {
        Self { kind, value, targets }
    }
}

/// Aggregate multipliers handed to the war-power formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub attack: f64,
    pub defense: f64,
    pub speed: f64,
    pub morale: f64,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Multipliers {
    pub const NEUTRAL: Multipliers = Multipliers { attack: 1.0, defense: 1.0, speed: 1.0, morale: 1.0 };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierSet {
    pub adjustments: Vec<Adjustment>,
}

impl ModifierSet {
    pub fn push(&mut self, adjustment: Adjustment) {
        self.adjustments.push(adjustment);
    }

    pub fn get(&self, kind: ModifierKind) -> Option<f64> {
        self.adjustments
            .iter()
            .filter(|a| a.kind == kind)
            .map(|a| a.value)
            .reduce(|acc, v| acc * v)
    }

    pub fn multipliers(&self) -> Multipliers {
        self.adjustments.iter().fold(Multipliers::NEUTRAL, |mut acc, adj| {
            if adj.targets.attack {
                acc.attack *= adj.value;
            }
            if adj.targets.defense {
                acc.defense *= adj.value;
            }
            if adj.targets.speed {
                acc.speed *= adj.value;
            }
            if adj.targets.morale {
                acc.morale *= adj.value;
            }
            acc
        })
    }
}

/// Terrain effect for a unit fighting on `terrain` for `side`
pub fn terrain_modifier(terrain: Terrain, arm: ArmCategory, side: Side, config: &EngineConfig) -> f64 {
    let mut value = terrain.arm_modifier(arm);
    if side == Side::Defender && terrain.is_fortified() {
        value *= 1.0 + config.wall_defense_bonus;
    }
    if side == Side::Attacker && terrain == Terrain::Plain && arm.is_mounted() {
        value *= 1.0 + config.plain_cavalry_bonus;
    }
    value
}

/// Supply tier multiplier; a cut-off supply line drops one tier
pub fn supply_modifier(unit: &CombatUnit, connected: bool) -> f64 {
    let remaining = match unit.state.supply {
        SupplyStock::Unlimited => return 1.0,
        SupplyStock::Limited(amount) => amount,
    };
    if unit.state.hp == 0 {
        return 1.0;
    }
    let ratio = remaining / (f64::from(unit.state.hp) / 100.0);
    let tier = SUPPLY_TIERS
        .iter()
        .position(|(threshold, _)| ratio >= *threshold)
        .unwrap_or(SUPPLY_TIERS.len());
    let tier = if connected { tier } else { tier + 1 };
    SUPPLY_TIERS.get(tier).map_or(SUPPLY_STARVING, |(_, value)| *value)
}

pub fn morale_modifier(atmos: f64) -> f64 {
    0.4 + atmos / 150.0
}

pub fn training_modifier(train: f64) -> f64 {
    0.5 + train / 140.0
}

pub fn injury_modifier(injury: f64, config: &EngineConfig) -> f64 {
    1.0 - injury.clamp(0.0, config.injury_cap) / 250.0
}

pub fn fatigue_modifier(elapsed: u32, config: &EngineConfig) -> f64 {
    if elapsed <= config.fatigue_grace_turns {
        return 1.0;
    }
    let over = f64::from(elapsed - config.fatigue_grace_turns);
    (1.0 - over * config.fatigue_step).max(config.fatigue_floor)
}

/// Troop-type bonus for assaulting or holding a city
pub fn siege_modifier(unit: &CombatUnit, ctx: &BattleContext) -> f64 {
    match unit.side {
        Side::Attacker if ctx.is_siege() => unit.troop.siege_bonus,
        Side::Defender if ctx.defender_holds_city() => unit.troop.hold_bonus,
        _ => 1.0,
    }
}

/// Attack bonus from active skills and inherited buffs
pub fn skill_modifier(unit: &CombatUnit) -> f64 {
    let Some(profile) = unit.commander() else {
        return 1.0;
    };
    let mut pct = 0.0;
    for skill in &unit.state.active_skills {
        pct += match skill.as_str() {
            SKILL_CHARGE => CHARGE_ATTACK_PCT,
            SKILL_FOCUS => FOCUS_ATTACK_PCT,
            SKILL_INTIMIDATE => INTIMIDATE_ATTACK_PCT,
            _ => 0.0,
        };
    }
    pct += profile.buffs.critical * CRITICAL_BUFF_WEIGHT + profile.buffs.avoid * AVOID_BUFF_WEIGHT;
    1.0 + pct / 100.0
}

/// Every adjustment that applies to `unit` at `elapsed` turns into the battle
pub fn collect_modifiers(
    unit: &CombatUnit,
    ctx: &BattleContext,
    elapsed: u32,
    config: &EngineConfig,
) -> ModifierSet {
    let mut set = ModifierSet::default();
    let arm = unit.arm();
    let side = unit.side;

    set.push(Adjustment::new(
        ModifierKind::Terrain,
        terrain_modifier(ctx.terrain, arm, side, config),
    ));
    set.push(Adjustment::new(ModifierKind::Weather, ctx.weather.arm_modifier(arm)));
    set.push(Adjustment::new(
        ModifierKind::Morale,
        morale_modifier(unit.state.atmos) * ctx.weather.morale_modifier(),
    ));

    let connected = ctx.supply_connected || side == Side::Defender;
    set.push(Adjustment::new(ModifierKind::Supply, supply_modifier(unit, connected)));
    set.push(Adjustment::new(ModifierKind::Training, training_modifier(unit.state.train)));
    set.push(Adjustment::new(ModifierKind::Injury, injury_modifier(unit.injury(), config)));

    if !unit.is_fortification() {
        set.push(Adjustment::new(ModifierKind::Fatigue, fatigue_modifier(elapsed, config)));
    }

    set.push(Adjustment::new(ModifierKind::Siege, siege_modifier(unit, ctx)));
    set.push(Adjustment::new(ModifierKind::Skill, skill_modifier(unit)));
    if unit.has_active_skill(SKILL_FORTIFY) {
        set.push(Adjustment::targeting(
            ModifierKind::Skill,
            1.0 + FORTIFY_DEFENSE_PCT / 100.0,
            Targets::DEFENSE,
        ));
    }

    if let Some(profile) = unit.commander() {
        set.push(Adjustment::new(ModifierKind::Nation, 1.0 + profile.nation_bonus_pct / 100.0));
    }

    set
}

/// Aggregate multipliers, or neutral ones when the stack is switched off
pub fn unit_multipliers(unit: &CombatUnit, ctx: &BattleContext, elapsed: u32, config: &EngineConfig) -> Multipliers {
    if !ctx.apply_modifiers {
        return Multipliers::NEUTRAL;
    }
    collect_modifiers(unit, ctx, elapsed, config).multipliers()
}
