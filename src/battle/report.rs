//! Battle result: summary, logs and aftermath
//!
//! Both log streams are appended while the battle runs. Aftermath (wounds,
//! experience, training/morale changes, plunder) is computed once the
//! scheduler reaches its terminal state.

use serde::{Deserialize, Serialize};

use crate::battle::setup::CityConfig;
use crate::battle::units::{CombatUnit, UnitKind, UnitRef, UnitStatus};
use crate::core::config::EngineConfig;
use crate::core::rng::BattleRng;
use crate::core::types::{CityId, GeneralId, Phase, Side, UnitIndex};

/// Who won the battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Attacker,
    Defender,
    Draw,
}

impl Winner {
    pub fn from_side(side: Side) -> Self {
        match side {
            Side::Attacker => Winner::Attacker,
            Side::Defender => Winner::Defender,
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Winner::Attacker => Some(Side::Attacker),
            Winner::Defender => Some(Side::Defender),
            Winner::Draw => None,
        }
    }
}

/// How the battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Empty,         // Nothing to fight
    Decisive,      // One side has no units left standing
    Routed,        // The principal ran out of supply
    QueueCleared,  // The principal beat every opponent
    CityConquered, // The walls fell
    DefenseHeld,   // The principal defender outlasted the attackers
    Stalemate,     // The principal used up its engagement window
    TurnLimit,     // The turn or phase budget ran out
}

/// Kind of a logged blow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    Strike,      // Mass-mode attack
    Duel,        // Duel exchange
    Volley,      // Pre-emptive ranged strike
    Retaliation, // Walls striking back
    Retreat,     // Losses while falling back
    Pursuit,     // Losses to a pursuing winner
}

/// One structured log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub turn: Phase,
    /// Striker's own phase counter (duel mode)
    pub phase: Phase,
    pub kind: ExchangeKind,
    pub attacker: UnitRef,
    pub defender: UnitRef,
    pub damage: u32,
    pub remaining_hp: u32,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub avoided: bool,
}

/// Structured and narrated log streams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleLog {
    pub records: Vec<ExchangeRecord>,
    pub lines: Vec<String>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: ExchangeRecord) {
        self.records.push(record);
    }

    pub fn narrate(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.lines.is_empty()
    }
}

/// Totals for one side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub commanders: usize,
    pub initial_hp: u64,
    pub remaining_hp: u64,
    pub casualties: u64,
    pub supply_used: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub winner: Winner,
    pub outcome: OutcomeKind,
    pub turns: Phase,
    pub attacker: SideSummary,
    pub defender: SideSummary,
    /// Wall hp left after a siege
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_hp: Option<u32>,
}

impl BattleSummary {
    /// Aggregate final unit states; walls count toward neither side's casualties
    pub fn from_units(units: &[CombatUnit], winner: Winner, outcome: OutcomeKind, turns: Phase) -> Self {
        let mut attacker = SideSummary::default();
        let mut defender = SideSummary::default();
        let mut city_hp = None;
        for unit in units {
            if unit.is_fortification() {
                city_hp = Some(unit.state.hp);
                continue;
            }
            let side = match unit.side {
                Side::Attacker => &mut attacker,
                Side::Defender => &mut defender,
            };
            side.commanders += 1;
            side.initial_hp += u64::from(unit.state.max_hp);
            side.remaining_hp += u64::from(unit.state.hp);
            side.casualties += u64::from(unit.state.max_hp - unit.state.hp);
            side.supply_used += unit.state.supply_used;
        }
        Self {
            winner,
            outcome,
            turns,
            attacker,
            defender,
            city_hp,
        }
    }

    pub fn side(&self, side: Side) -> &SideSummary {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }
}

/// Per-commander aftermath
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    pub general: GeneralId,
    pub name: String,
    pub side: Side,
    pub final_hp: u32,
    pub max_hp: u32,
    pub kills: u32,
    pub deaths: u32,
    pub supply_used: f64,
    /// Injury added by the wound roll
    pub injury_delta: f64,
    pub train_delta: f64,
    pub atmos_delta: f64,
    pub experience: f64,
    pub status: UnitStatus,
}

/// Spoils of a captured city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConquestReward {
    pub city: CityId,
    pub conqueror: GeneralId,
    pub gold: f64,
    pub rice: f64,
    pub experience: f64,
}

impl ConquestReward {
    pub fn new(city: &CityConfig, conqueror: GeneralId, config: &EngineConfig) -> Self {
        Self {
            city: city.id,
            conqueror,
            gold: city.gold * config.plunder_ratio,
            rice: city.rice * config.plunder_ratio,
            experience: config.conquest_experience,
        }
    }
}

/// Complete output of one battle run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub summary: BattleSummary,
    pub log: BattleLog,
    pub reports: Vec<UnitReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conquest: Option<ConquestReward>,
    /// Final unit snapshots
    pub units: Vec<CombatUnit>,
}

impl BattleResult {
    /// Draw with no turns, no logs and no units
    pub fn empty() -> Self {
        Self {
            summary: BattleSummary::from_units(&[], Winner::Draw, OutcomeKind::Empty, 0),
            log: BattleLog::new(),
            reports: Vec::new(),
            conquest: None,
            units: Vec::new(),
        }
    }

    pub fn winner(&self) -> Winner {
        self.summary.winner
    }
}

/// Winner by survivorship: the only side with survivors, else greater hp
pub fn winner_by_survivors(units: &[CombatUnit]) -> Winner {
    let alive = |side: Side| units.iter().any(|u| u.side == side && u.is_valid_target());
    let hp = |side: Side| -> u64 {
        units
            .iter()
            .filter(|u| u.side == side)
            .map(|u| u64::from(u.state.hp))
            .sum()
    };
    match (alive(Side::Attacker), alive(Side::Defender)) {
        (true, false) => Winner::Attacker,
        (false, true) => Winner::Defender,
        _ => match hp(Side::Attacker).cmp(&hp(Side::Defender)) {
            std::cmp::Ordering::Greater => Winner::Attacker,
            std::cmp::Ordering::Less => Winner::Defender,
            std::cmp::Ordering::Equal => Winner::Draw,
        },
    }
}

/// Chance that a commander comes back wounded
pub fn wound_chance(loss_ratio: f64, defeated: bool, annihilated: bool, config: &EngineConfig) -> f64 {
    let mut chance = config.wound_base_chance + loss_ratio * config.wound_loss_weight;
    if defeated {
        chance *= config.wound_defeat_multiplier;
    }
    if annihilated {
        chance += config.wound_annihilation_bonus;
    }
    chance.clamp(0.0, config.wound_max_chance)
}

/// Apply wounds, experience and morale/training changes to every commander.
///
/// Mutates the final snapshots so they match the returned reports.
pub fn apply_aftermath(
    units: &mut [CombatUnit],
    winner: Winner,
    held_by: Option<UnitIndex>,
    config: &EngineConfig,
    rng: &mut BattleRng,
) -> Vec<UnitReport> {
    let mut reports = Vec::new();
    for (idx, unit) in units.iter_mut().enumerate() {
        let side = unit.side;
        let state = &mut unit.state;
        let UnitKind::Commander(profile) = &mut unit.kind else {
            continue;
        };

        let won = winner.side() == Some(side);
        let lost = winner.side() == Some(side.opponent());
        let defeated = lost || matches!(state.status, UnitStatus::Routed);
        let annihilated = state.max_hp > 0 && state.hp == 0;

        let chance = wound_chance(state.loss_ratio(), defeated, annihilated, config);
        let injury_before = profile.injury;
        if state.max_hp > 0 && rng.next_bool(chance) {
            let wound = rng.next_range_int(config.wound_min, config.wound_max) as f64;
            profile.injury = (profile.injury + wound).min(config.injury_cap);
        }

        if won {
            state.atmos = config.clamp_stat(state.atmos + config.victory_atmos_gain);
            state.train = config.clamp_stat(state.train + config.victory_train_gain);
        } else if lost {
            state.atmos = config.clamp_stat(state.atmos - config.defeat_atmos_loss);
        }
        if held_by == Some(UnitIndex(idx)) {
            state.train = config.clamp_stat(state.train + config.defense_train_bonus);
            state.atmos = config.clamp_stat(state.atmos + config.defense_atmos_bonus);
        }

        let experience = f64::from(state.total_kills) * config.experience_per_kill
            + f64::from(state.total_deaths) * config.experience_per_death;
        profile.experience += experience;

        reports.push(UnitReport {
            general: profile.id,
            name: profile.name.clone(),
            side,
            final_hp: state.hp,
            max_hp: state.max_hp,
            kills: state.total_kills,
            deaths: state.total_deaths,
            supply_used: state.supply_used,
            injury_delta: profile.injury - injury_before,
            train_delta: state.train - state.initial_train,
            atmos_delta: state.atmos - state.initial_atmos,
            experience,
            status: state.status,
        });
    }
    reports
}
