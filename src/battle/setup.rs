//! Battle configuration: the input a caller hands to the engine
//!
//! Optional stats are `Option`s so a missing value can be told apart from a
//! zero; the engine fills them with neutral defaults from `EngineConfig`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::terrain::Terrain;
use crate::battle::unit_type::ArmCategory;
use crate::battle::weather::Weather;
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::rng::BattleSeed;
use crate::core::types::{CityId, GeneralId, NationId, Phase};

/// What kind of battle is being fought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleKind {
    /// Attacker duels the queued defenders in the open
    #[default]
    Field,
    /// Attacker duels the queued defenders, then the city walls
    Siege,
    /// A principal defender holds against a queue of attackers
    Defense,
}

/// Which scheduler resolves the battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerMode {
    /// Round-based many-vs-many resolution
    Mass,
    /// Phase-based principal-vs-queue resolution
    #[default]
    Duel,
}

/// Proficiency per arm
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DexInput {
    pub footman: f64,
    pub archer: f64,
    pub cavalry: f64,
    pub wizard: f64,
    pub siege: f64,
}

impl DexInput {
    pub fn to_array(&self) -> [f64; 5] {
        [self.footman, self.archer, self.cavalry, self.wizard, self.siege]
    }

    pub fn uniform(value: f64) -> Self {
        Self {
            footman: value,
            archer: value,
            cavalry: value,
            wizard: value,
            siege: value,
        }
    }
}

/// Combat buffs a commander carries into battle (percent values)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InheritedBuffs {
    pub critical: f64,
    pub avoid: f64,
}

/// One commander on a side's roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommanderInput {
    pub id: GeneralId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub leadership: Option<f64>,
    #[serde(default)]
    pub strength: Option<f64>,
    #[serde(default)]
    pub intel: Option<f64>,
    /// Troop headcount (becomes hit points)
    #[serde(default)]
    pub crew: u32,
    /// Troop type id, looked up in the scenario's troop table
    #[serde(default)]
    pub crew_type: u32,
    #[serde(default)]
    pub train: Option<f64>,
    #[serde(default)]
    pub atmos: Option<f64>,
    /// Carried supply
    #[serde(default)]
    pub rice: Option<f64>,
    #[serde(default)]
    pub injury: f64,
    #[serde(default)]
    pub dex: DexInput,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub buffs: InheritedBuffs,
    #[serde(default)]
    pub experience: f64,
}

impl CommanderInput {
    pub fn new(id: u32, name: &str, crew: u32, crew_type: u32) -> Self {
        Self {
            id: GeneralId(id),
            name: name.to_string(),
            leadership: None,
            strength: None,
            intel: None,
            crew,
            crew_type,
            train: None,
            atmos: None,
            rice: None,
            injury: 0.0,
            dex: DexInput::default(),
            skills: Vec::new(),
            buffs: InheritedBuffs::default(),
            experience: 0.0,
        }
    }

    pub fn with_stats(mut self, leadership: f64, strength: f64, intel: f64) -> Self {
        self.leadership = Some(leadership);
        self.strength = Some(strength);
        self.intel = Some(intel);
        self
    }

    pub fn with_condition(mut self, train: f64, atmos: f64) -> Self {
        self.train = Some(train);
        self.atmos = Some(atmos);
        self
    }

    pub fn with_rice(mut self, rice: f64) -> Self {
        self.rice = Some(rice);
        self
    }

    pub fn with_skill(mut self, skill: &str) -> Self {
        self.skills.push(skill.to_string());
        self
    }

    pub fn with_dex(mut self, arm: ArmCategory, value: f64) -> Self {
        match arm {
            ArmCategory::Footman => self.dex.footman = value,
            ArmCategory::Archer => self.dex.archer = value,
            ArmCategory::Cavalry => self.dex.cavalry = value,
            ArmCategory::Wizard => self.dex.wizard = value,
            ArmCategory::Siege | ArmCategory::Castle => self.dex.siege = value,
        }
        self
    }
}

/// Nation a side fights for
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NationConfig {
    pub id: NationId,
    pub name: String,
    /// Nation-wide attack bonus from policy, in percent
    pub attack_bonus_pct: f64,
    /// The nation's stores are exhausted (a siege skips straight to the walls)
    pub supply_collapsed: bool,
}

impl NationConfig {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id: NationId(id),
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// One side of the battle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SideConfig {
    pub nation: NationConfig,
    pub commanders: Vec<CommanderInput>,
    /// Flat morale added to every commander of the side
    pub morale_bonus: f64,
    /// Flat training added to every commander of the side
    pub train_bonus: f64,
}

impl SideConfig {
    pub fn new(nation: NationConfig, commanders: Vec<CommanderInput>) -> Self {
        Self {
            nation,
            commanders,
            morale_bonus: 0.0,
            train_bonus: 0.0,
        }
    }
}

/// The city being assaulted or held
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CityConfig {
    pub id: CityId,
    #[serde(default)]
    pub name: String,
    /// Wall strength (fortification hit points)
    pub wall: u32,
    /// Defense rating added to the castle troop's base defense
    #[serde(default)]
    pub defense: f64,
    /// Stores that can be plundered on conquest
    #[serde(default)]
    pub gold: f64,
    #[serde(default)]
    pub rice: f64,
}

impl CityConfig {
    pub fn new(id: u32, name: &str, wall: u32, defense: f64) -> Self {
        Self {
            id: CityId(id),
            name: name.to_string(),
            wall,
            defense,
            gold: 0.0,
            rice: 0.0,
        }
    }
}

fn enabled() -> bool {
    true
}

/// Complete description of one battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    #[serde(default)]
    pub kind: BattleKind,
    #[serde(default)]
    pub mode: SchedulerMode,
    #[serde(default)]
    pub attacker: SideConfig,
    #[serde(default)]
    pub defender: SideConfig,
    #[serde(default)]
    pub city: Option<CityConfig>,
    #[serde(default)]
    pub terrain: Terrain,
    #[serde(default)]
    pub weather: Weather,
    /// Turn (mass) or phase (duel) budget; engine default when absent
    #[serde(default)]
    pub max_turns: Option<u32>,
    /// Selects the troop and advantage tables
    #[serde(default)]
    pub scenario: u32,
    #[serde(default)]
    pub seed: BattleSeed,
    /// Is the attacker still connected to its supply lines?
    #[serde(default = "enabled")]
    pub supply_connected: bool,
    /// Apply the terrain/weather/condition modifier stack
    #[serde(default = "enabled")]
    pub apply_modifiers: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            kind: BattleKind::default(),
            mode: SchedulerMode::default(),
            attacker: SideConfig::default(),
            defender: SideConfig::default(),
            city: None,
            terrain: Terrain::default(),
            weather: Weather::default(),
            max_turns: None,
            scenario: 0,
            seed: BattleSeed::default(),
            supply_connected: true,
            apply_modifiers: true,
        }
    }
}

impl BattleConfig {
    pub fn new(kind: BattleKind, attacker: SideConfig, defender: SideConfig) -> Self {
        Self {
            kind,
            attacker,
            defender,
            ..Self::default()
        }
    }

    pub fn with_city(mut self, city: CityConfig) -> Self {
        self.city = Some(city);
        self
    }

    pub fn with_seed(mut self, seed: impl Into<BattleSeed>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn with_mode(mut self, mode: SchedulerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn without_modifiers(mut self) -> Self {
        self.apply_modifiers = false;
        self
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// Stage of a duel battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    #[default]
    Approach,
    Combat,
    PursuitRetreat,
    Result,
}

/// Battle-wide state the modifier stack and schedulers read
#[derive(Debug, Clone, PartialEq)]
pub struct BattleContext {
    pub kind: BattleKind,
    pub terrain: Terrain,
    pub weather: Weather,
    pub phase: BattlePhase,
    /// Current turn (mass) or principal phase (duel)
    pub turn: Phase,
    pub max_turns: u32,
    pub supply_connected: bool,
    pub apply_modifiers: bool,
}

impl BattleContext {
    pub fn new(config: &BattleConfig, engine: &EngineConfig) -> Self {
        Self {
            kind: config.kind,
            terrain: config.terrain,
            weather: config.weather,
            phase: BattlePhase::Approach,
            turn: 0,
            max_turns: config.max_turns.unwrap_or(engine.default_max_turns),
            supply_connected: config.supply_connected,
            apply_modifiers: config.apply_modifiers,
        }
    }

    pub fn is_siege(&self) -> bool {
        matches!(self.kind, BattleKind::Siege)
    }

    /// Defenders hold a city in siege and defense battles
    pub fn defender_holds_city(&self) -> bool {
        matches!(self.kind, BattleKind::Siege | BattleKind::Defense)
    }
}
