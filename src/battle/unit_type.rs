//! Troop types, advantage coefficients and the scenario rulebook
//!
//! Troop types are looked up once per battle and copied into each unit;
//! they are immutable for the rest of the run. Tables are injected into the
//! engine, never read from process-wide state.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;

/// Troop id of the synthetic fortification troop type
pub const CASTLE_TROOP_ID: u32 = 1000;

/// Arm category of a troop type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmCategory {
    #[default]
    Footman,  // Line infantry
    Archer,   // Ranged
    Cavalry,  // Mounted shock
    Wizard,   // Caster, fights with intelligence
    Siege,    // Engines, bonus against walls
    Castle,   // Fortification only
}

impl ArmCategory {
    /// Ranged and caster arms fight with intelligence rather than strength
    pub fn uses_intel(&self) -> bool {
        matches!(self, ArmCategory::Archer | ArmCategory::Wizard)
    }

    /// Can this arm open a duel with a pre-emptive volley?
    pub fn is_ranged(&self) -> bool {
        matches!(self, ArmCategory::Archer | ArmCategory::Wizard)
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self, ArmCategory::Cavalry)
    }

    /// Index into per-arm proficiency tables
    pub fn dex_slot(&self) -> usize {
        match self {
            ArmCategory::Footman => 0,
            ArmCategory::Archer => 1,
            ArmCategory::Cavalry => 2,
            ArmCategory::Wizard => 3,
            ArmCategory::Siege | ArmCategory::Castle => 4,
        }
    }
}

fn one() -> f64 {
    1.0
}

fn default_speed() -> u32 {
    7
}

fn default_rating() -> f64 {
    100.0
}

/// Static definition of a troop type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroopType {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arm: ArmCategory,
    #[serde(default = "default_rating")]
    pub attack: f64,
    #[serde(default = "default_rating")]
    pub defense: f64,
    /// Engagement window in duel phases (0 = uncapped)
    #[serde(default = "default_speed")]
    pub speed: u32,
    /// Critical chance in percent
    #[serde(default)]
    pub critical: f64,
    /// Avoid chance in percent
    #[serde(default)]
    pub avoid: f64,
    /// Supply consumed per 100 damage dealt, relative to the standard rate
    #[serde(default = "one")]
    pub supply_cost: f64,
    /// Multiplier when attacking in a siege
    #[serde(default = "one")]
    pub siege_bonus: f64,
    /// Multiplier when holding a city (siege or defense battles)
    #[serde(default = "one")]
    pub hold_bonus: f64,
}

impl TroopType {
    /// Neutral troop type used when a roster names an unknown id
    pub fn baseline(id: u32) -> Self {
        Self {
            id,
            name: String::from("기본병"),
            arm: ArmCategory::Footman,
            attack: 100.0,
            defense: 100.0,
            speed: 7,
            critical: 0.0,
            avoid: 0.0,
            supply_cost: 1.0,
            siege_bonus: 1.0,
            hold_bonus: 1.0,
        }
    }

    /// Troop type of a city's walls
    pub fn castle() -> Self {
        Self {
            id: CASTLE_TROOP_ID,
            name: String::from("성벽"),
            arm: ArmCategory::Castle,
            attack: 100.0,
            defense: 100.0,
            speed: 0,
            critical: 0.0,
            avoid: 0.0,
            supply_cost: 0.0,
            siege_bonus: 1.0,
            hold_bonus: 1.0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn standard(
        id: u32,
        name: &str,
        arm: ArmCategory,
        attack: f64,
        defense: f64,
        speed: u32,
        critical: f64,
        avoid: f64,
        supply_cost: f64,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            arm,
            attack,
            defense,
            speed,
            critical,
            avoid,
            supply_cost,
            siege_bonus: 1.0,
            hold_bonus: 1.0,
        }
    }
}

/// Troop types of one scenario, keyed by id
#[derive(Debug, Clone, Default)]
pub struct TroopTable {
    types: AHashMap<u32, TroopType>,
}

impl TroopTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, troop: TroopType) {
        self.types.insert(troop.id, troop);
    }

    pub fn get(&self, id: u32) -> Option<&TroopType> {
        self.types.get(&id)
    }

    /// Copy of the troop type, or the neutral baseline for unknown ids
    pub fn resolve(&self, id: u32) -> TroopType {
        self.get(id).cloned().unwrap_or_else(|| {
            tracing::debug!(troop = id, "unknown troop type, using baseline");
            TroopType::baseline(id)
        })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Advantage coefficients: troop id × opposing arm → multiplier
#[derive(Debug, Clone, Default)]
pub struct AdvantageTable {
    attack: AHashMap<(u32, ArmCategory), f64>,
    defense: AHashMap<(u32, ArmCategory), f64>,
}

impl AdvantageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attack(&mut self, troop: u32, against: ArmCategory, coef: f64) {
        self.attack.insert((troop, against), coef);
    }

    pub fn set_defense(&mut self, troop: u32, against: ArmCategory, coef: f64) {
        self.defense.insert((troop, against), coef);
    }

    /// Multiplier on `troop`'s war power when striking `against`
    pub fn attack_coef(&self, troop: u32, against: ArmCategory) -> f64 {
        self.attack.get(&(troop, against)).copied().unwrap_or(1.0)
    }

    /// Resistance of `troop` against blows from `against` (divides war power)
    pub fn defense_coef(&self, troop: u32, against: ArmCategory) -> f64 {
        self.defense.get(&(troop, against)).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Deserialize)]
struct AdvantageEntry {
    troop: u32,
    against: ArmCategory,
    #[serde(default = "one")]
    attack: f64,
    #[serde(default = "one")]
    defense: f64,
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    scenario: u32,
    #[serde(default)]
    troop: Vec<TroopType>,
    #[serde(default)]
    advantage: Vec<AdvantageEntry>,
}

/// Troop and advantage tables of one scenario
#[derive(Debug, Clone, Default)]
pub struct ScenarioTables {
    pub scenario: u32,
    pub troops: TroopTable,
    pub advantages: AdvantageTable,
}

impl ScenarioTables {
    pub fn new(scenario: u32) -> Self {
        Self {
            scenario,
            ..Self::default()
        }
    }

    /// The built-in troop roster: footman, archer, cavalry, wizard, siege
    pub fn standard(scenario: u32) -> Self {
        use ArmCategory::*;

        let mut troops = TroopTable::new();
        let mut footman = TroopType::standard(1100, "보병", Footman, 100.0, 150.0, 7, 5.0, 10.0, 1.0);
        footman.hold_bonus = 1.1;
        let mut archer = TroopType::standard(1200, "궁병", Archer, 100.0, 100.0, 7, 10.0, 20.0, 1.0);
        archer.hold_bonus = 1.15;
        let cavalry = TroopType::standard(1300, "기병", Cavalry, 150.0, 100.0, 7, 10.0, 5.0, 1.2);
        let wizard = TroopType::standard(1400, "귀병", Wizard, 80.0, 80.0, 7, 5.0, 5.0, 1.0);
        let mut siege = TroopType::standard(1500, "차병", Siege, 100.0, 100.0, 6, 0.0, 0.0, 1.5);
        siege.siege_bonus = 1.2;
        for troop in [footman, archer, cavalry, wizard, siege, TroopType::castle()] {
            troops.insert(troop);
        }

        // Footman > Archer > Cavalry > Footman
        let mut advantages = AdvantageTable::new();
        for (strong, weak) in [(1100, Archer), (1200, Cavalry), (1300, Footman)] {
            advantages.set_attack(strong, weak, 1.2);
            advantages.set_defense(strong, weak, 1.1);
        }
        for (weak, strong) in [(1100, Cavalry), (1200, Footman), (1300, Archer)] {
            advantages.set_attack(weak, strong, 0.8);
            advantages.set_defense(weak, strong, 0.9);
        }
        advantages.set_attack(1500, Castle, 1.2);
        for arm in [Footman, Archer, Cavalry, Wizard] {
            advantages.set_attack(1500, arm, 0.8);
        }

        Self {
            scenario,
            troops,
            advantages,
        }
    }

    /// Parse scenario tables from TOML (`[[troop]]` and `[[advantage]]` arrays)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ScenarioFile = toml::from_str(content)?;
        let mut tables = ScenarioTables::new(file.scenario);
        for troop in file.troop {
            tables.troops.insert(troop);
        }
        for entry in file.advantage {
            tables.advantages.set_attack(entry.troop, entry.against, entry.attack);
            tables.advantages.set_defense(entry.troop, entry.against, entry.defense);
        }
        Ok(tables)
    }
}

/// All scenario tables an engine knows, with a fallback for unknown ids
#[derive(Debug, Clone)]
pub struct Rulebook {
    scenarios: AHashMap<u32, ScenarioTables>,
    fallback: ScenarioTables,
}

impl Default for Rulebook {
    fn default() -> Self {
        Self::standard()
    }
}

impl Rulebook {
    pub fn new(fallback: ScenarioTables) -> Self {
        Self {
            scenarios: AHashMap::new(),
            fallback,
        }
    }

    /// Rulebook whose every scenario uses the built-in tables
    pub fn standard() -> Self {
        Self::new(ScenarioTables::standard(0))
    }

    pub fn with_scenario(mut self, tables: ScenarioTables) -> Self {
        self.insert(tables);
        self
    }

    pub fn insert(&mut self, tables: ScenarioTables) {
        self.scenarios.insert(tables.scenario, tables);
    }

    pub fn tables(&self, scenario: u32) -> &ScenarioTables {
        self.scenarios.get(&scenario).unwrap_or(&self.fallback)
    }
}
