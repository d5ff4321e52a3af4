//! Combat units: one per participating commander, plus the city walls in a siege
//!
//! A `CombatUnit` pairs shared mutable combat state with a tagged identity:
//! either a commander's stat snapshot or a fortification. Units are built once
//! per battle from the roster and are owned by that run only.

use serde::{Deserialize, Serialize};

use crate::battle::setup::{CityConfig, CommanderInput, InheritedBuffs, NationConfig, SideConfig};
use crate::battle::unit_type::{ArmCategory, TroopTable, TroopType, CASTLE_TROOP_ID};
use crate::core::config::EngineConfig;
use crate::core::types::{CityId, GeneralId, NationId, Phase, Side, UnitIndex};

/// Identity of a unit as it appears in logs and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum UnitRef {
    General(GeneralId),
    City(CityId),
}

/// Participation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Active, // Still fighting
    Dead,      // Troops reduced to zero
    Routed,    // Ran out of supply
    Retreated, // Used up its engagement window
}

/// Positional stance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStance {
    #[default]
    Holding,
    Ambushing,
    Defending,
    Retreating,
}

/// Supply carried by a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyStock {
    Limited(f64),
    /// City stores; never runs out
    Unlimited,
}

impl SupplyStock {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, SupplyStock::Unlimited)
    }

    /// Remaining amount, `None` when unlimited
    pub fn remaining(&self) -> Option<f64> {
        match self {
            SupplyStock::Limited(amount) => Some(*amount),
            SupplyStock::Unlimited => None,
        }
    }
}

/// Mutable per-run combat state shared by every unit kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    pub hp: u32,
    pub max_hp: u32,
    pub train: f64,
    pub atmos: f64,
    pub initial_train: f64,
    pub initial_atmos: f64,
    pub supply: SupplyStock,
    pub supply_used: f64,

    pub phase: Phase,
    pub bonus_phase: Phase,

    // Tallies
    pub duel_kills: u32,
    pub duel_deaths: u32,
    pub total_kills: u32,
    pub total_deaths: u32,

    pub last_war_power: f64,
    pub war_power_multiply: f64,

    /// Current duel opponent, cleared when the duel ends
    pub opponent: Option<UnitIndex>,

    pub status: UnitStatus,
    pub stance: UnitStance,
    pub finished: bool,

    /// Skills that fired for this battle
    pub active_skills: Vec<String>,
}

impl CombatState {
    pub fn new(hp: u32, train: f64, atmos: f64, supply: SupplyStock) -> Self {
        Self {
            hp,
            max_hp: hp,
            train,
            atmos,
            initial_train: train,
            initial_atmos: atmos,
            supply,
            supply_used: 0.0,
            phase: 0,
            bonus_phase: 0,
            duel_kills: 0,
            duel_deaths: 0,
            total_kills: 0,
            total_deaths: 0,
            last_war_power: 0.0,
            war_power_multiply: 1.0,
            opponent: None,
            status: UnitStatus::Active,
            stance: UnitStance::Holding,
            finished: false,
            active_skills: Vec::new(),
        }
    }

    /// Remove troops; returns the amount actually removed
    pub fn take_damage(&mut self, damage: u32) -> u32 {
        let applied = damage.min(self.hp);
        self.hp -= applied;
        self.duel_deaths = self.duel_deaths.saturating_add(applied);
        self.total_deaths = self.total_deaths.saturating_add(applied);
        if self.hp == 0 {
            self.status = UnitStatus::Dead;
            self.finished = true;
        }
        applied
    }

    pub fn record_kills(&mut self, kills: u32) {
        self.duel_kills = self.duel_kills.saturating_add(kills);
        self.total_kills = self.total_kills.saturating_add(kills);
    }

    pub fn consume_supply(&mut self, amount: f64) {
        if let SupplyStock::Limited(remaining) = &mut self.supply {
            let used = amount.max(0.0).min(*remaining);
            *remaining -= used;
            self.supply_used += used;
        }
    }

    /// Supply below one ration per hundred troops
    pub fn is_starving(&self) -> bool {
        match self.supply {
            SupplyStock::Limited(remaining) => self.hp > 0 && remaining < f64::from(self.hp) / 100.0,
            SupplyStock::Unlimited => false,
        }
    }

    /// Share of the initial troops lost
    pub fn loss_ratio(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        f64::from(self.max_hp - self.hp) / f64::from(self.max_hp)
    }

    pub fn end_duel(&mut self) {
        self.opponent = None;
        self.duel_kills = 0;
        self.duel_deaths = 0;
    }

    pub fn finish(&mut self, status: UnitStatus) {
        self.status = status;
        self.finished = true;
        if matches!(status, UnitStatus::Routed | UnitStatus::Retreated) {
            self.stance = UnitStance::Retreating;
        }
    }
}

/// Stat snapshot of a commander, copied from the roster at battle start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommanderProfile {
    pub id: GeneralId,
    pub name: String,
    pub leadership: f64,
    pub strength: f64,
    pub intel: f64,
    /// Proficiency per arm, indexed by `ArmCategory::dex_slot`
    pub dex: [f64; 5],
    pub injury: f64,
    pub skills: Vec<String>,
    pub buffs: InheritedBuffs,
    pub experience: f64,
    /// Nation-wide attack bonus in percent
    pub nation_bonus_pct: f64,
}

/// A city's walls as a combat participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FortificationProfile {
    pub city: CityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitKind {
    Commander(CommanderProfile),
    Fortification(FortificationProfile),
}

/// One participant of a battle run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatUnit {
    pub side: Side,
    pub nation: NationId,
    pub troop: TroopType,
    pub kind: UnitKind,
    pub state: CombatState,
}

impl CombatUnit {
    /// Build a commander's unit, filling missing stats with neutral defaults
    pub fn from_commander(
        input: &CommanderInput,
        side: Side,
        side_config: &SideConfig,
        troops: &TroopTable,
        config: &EngineConfig,
    ) -> Self {
        let troop = troops.resolve(input.crew_type);
        let train = config.clamp_stat(input.train.unwrap_or(config.default_train) + side_config.train_bonus);
        let atmos = config.clamp_stat(input.atmos.unwrap_or(config.default_atmos) + side_config.morale_bonus);
        let rice = input
            .rice
            .unwrap_or(f64::from(input.crew) * config.default_supply_per_soldier)
            .max(0.0);

        let profile = CommanderProfile {
            id: input.id,
            name: input.name.clone(),
            leadership: input.leadership.unwrap_or(config.default_stat),
            strength: input.strength.unwrap_or(config.default_stat),
            intel: input.intel.unwrap_or(config.default_stat),
            dex: input.dex.to_array(),
            injury: input.injury.clamp(0.0, config.injury_cap),
            skills: input.skills.clone(),
            buffs: input.buffs,
            experience: input.experience,
            nation_bonus_pct: side_config.nation.attack_bonus_pct,
        };

        Self {
            side,
            nation: side_config.nation.id,
            troop,
            kind: UnitKind::Commander(profile),
            state: CombatState::new(input.crew, train, atmos, SupplyStock::Limited(rice)),
        }
    }

    /// Units for every commander on a side, in roster order
    pub fn roster(side_config: &SideConfig, side: Side, troops: &TroopTable, config: &EngineConfig) -> Vec<Self> {
        side_config
            .commanders
            .iter()
            .map(|input| Self::from_commander(input, side, side_config, troops, config))
            .collect()
    }

    /// The city's walls: hp = wall strength, defense = castle base + city rating
    pub fn fortification(city: &CityConfig, nation: &NationConfig, troops: &TroopTable) -> Self {
        let mut troop = troops
            .get(CASTLE_TROOP_ID)
            .cloned()
            .unwrap_or_else(TroopType::castle);
        troop.defense += city.defense;
        troop.speed = 0;

        let mut state = CombatState::new(city.wall, 100.0, 100.0, SupplyStock::Unlimited);
        state.stance = UnitStance::Defending;

        Self {
            side: Side::Defender,
            nation: nation.id,
            troop,
            kind: UnitKind::Fortification(FortificationProfile {
                city: city.id,
                name: city.name.clone(),
            }),
            state,
        }
    }

    pub fn unit_ref(&self) -> UnitRef {
        match &self.kind {
            UnitKind::Commander(profile) => UnitRef::General(profile.id),
            UnitKind::Fortification(fort) => UnitRef::City(fort.city),
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            UnitKind::Commander(profile) => &profile.name,
            UnitKind::Fortification(fort) => &fort.name,
        }
    }

    pub fn commander(&self) -> Option<&CommanderProfile> {
        match &self.kind {
            UnitKind::Commander(profile) => Some(profile),
            UnitKind::Fortification(_) => None,
        }
    }

    pub fn is_fortification(&self) -> bool {
        matches!(self.kind, UnitKind::Fortification(_))
    }

    pub fn arm(&self) -> ArmCategory {
        self.troop.arm
    }

    pub fn leadership(&self) -> f64 {
        self.commander().map_or(0.0, |c| c.leadership)
    }

    /// Stat the arm fights with: intelligence for ranged and casters, strength otherwise
    pub fn fighting_stat(&self) -> f64 {
        match self.commander() {
            Some(c) if self.troop.arm.uses_intel() => c.intel,
            Some(c) => c.strength,
            None => 0.0,
        }
    }

    /// Proficiency with the unit's own arm
    pub fn own_dex(&self) -> f64 {
        self.commander().map_or(0.0, |c| c.dex[self.troop.arm.dex_slot()])
    }

    pub fn injury(&self) -> f64 {
        self.commander().map_or(0.0, |c| c.injury)
    }

    pub fn knows_skill(&self, skill: &str) -> bool {
        self.commander().is_some_and(|c| c.skills.iter().any(|s| s == skill))
    }

    pub fn has_active_skill(&self, skill: &str) -> bool {
        self.state.active_skills.iter().any(|s| s == skill)
    }

    /// Alive, with troops, and not withdrawn
    pub fn is_valid_target(&self) -> bool {
        matches!(self.state.status, UnitStatus::Active) && self.state.hp > 0 && !self.state.finished
    }

    /// Engagement window in phases; `None` when uncapped
    pub fn phase_cap(&self, speed_multiplier: f64) -> Option<Phase> {
        if self.troop.speed == 0 || self.is_fortification() {
            return None;
        }
        let scaled = (f64::from(self.troop.speed) * speed_multiplier).round().max(1.0) as Phase;
        Some(scaled + self.state.bonus_phase)
    }
}
