//! Engine configuration with documented constants
//!
//! All magic numbers of the combat formulas are collected here with
//! explanations of their purpose and how they interact with each other.
//! A config is owned by one `BattleEngine`; there is no process-wide copy.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{BattleError, Result};

/// Configuration for the battle formulas and schedulers
///
/// Partial TOML files are accepted: every field missing from the file keeps
/// its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === WAR POWER ===
    /// Base war power of one exchange before attack/defense are applied
    pub arm_per_phase: f64,

    /// Lower bound of the morale/training band
    pub stat_min: f64,

    /// Upper bound of the morale/training band
    pub stat_max: f64,

    /// Floor applied to the defender's training before it divides war power
    pub train_floor: f64,

    /// Crew coefficient: `clamp(hp / divisor + base, base, max) / 100`.
    ///
    /// At the default divisor a defender needs 7,000 troops to reach the
    /// full defense coefficient.
    pub crew_coef_divisor: f64,
    pub crew_coef_base: f64,
    pub crew_coef_max: f64,

    /// Raw power below this is floored and re-rolled in `[avg, floor]`
    pub raw_power_floor: f64,

    /// Both sides below this proficiency count as untrained (dex term = 1)
    pub dex_negligible: f64,

    // === DAMAGE ===
    /// Random spread applied to each blow
    pub damage_random_min: f64,
    pub damage_random_max: f64,

    /// Duel injury penalty: `1 - min(injury, cap) / divisor`
    pub duel_injury_cap: f64,
    pub duel_injury_divisor: f64,

    /// Multiplier of a critical blow
    pub critical_multiplier: f64,

    /// Multiplier of a blow the receiver partially avoids
    pub avoid_multiplier: f64,

    /// Mass-mode defense rating divisor base (`defense / base`)
    pub mass_defense_base: f64,

    /// Mass-mode weight of the morale difference term
    pub mass_morale_weight: f64,

    // === SUPPLY ===
    /// Supply consumed per 100 damage dealt, scaled by troop supply cost
    pub supply_rate: f64,

    /// Supply a commander brings when the roster omits it, per soldier
    pub default_supply_per_soldier: f64,

    // === MODIFIERS ===
    /// Elapsed turns before fatigue sets in
    pub fatigue_grace_turns: u32,

    /// Fatigue penalty per turn after the grace period
    pub fatigue_step: f64,

    /// Fatigue never reduces a multiplier below this
    pub fatigue_floor: f64,

    /// Flat defender bonus on wall / inner-castle terrain
    pub wall_defense_bonus: f64,

    /// Cavalry bonus when attacking on plain terrain
    pub plain_cavalry_bonus: f64,

    // === DUEL ===
    /// Share of a normal blow dealt by a ranged pre-emptive strike
    pub preemptive_ratio: f64,

    /// Damage multiplier of siege troops against a fortification
    pub siege_damage_bonus: f64,

    /// Fortification retaliation per point of the attacker's leadership
    pub city_retaliation_per_leadership: f64,

    /// Extra retreat losses as a share of the loser's accumulated losses
    pub retreat_loss_min: f64,
    pub retreat_loss_max: f64,

    /// Pursuit success chance, scaled by morale above the arm threshold
    pub pursuit_chance_min: f64,
    pub pursuit_chance_max: f64,

    /// Pursuit damage as a share of the winner's last war power
    pub pursuit_damage_min: f64,
    pub pursuit_damage_max: f64,

    /// Morale a winner needs before it may pursue, by arm
    pub pursuit_morale_cavalry: f64,
    pub pursuit_morale_archer: f64,
    pub pursuit_morale_other: f64,

    /// Training every participant gains from the approach drill
    pub approach_train_gain: f64,

    /// Morale removed from the opponent by an active intimidate skill
    pub intimidate_morale_drop: f64,

    // === AFTERMATH ===
    /// Wound chance: `base + loss_ratio * weight`, scaled on defeat
    pub wound_base_chance: f64,
    pub wound_loss_weight: f64,
    pub wound_defeat_multiplier: f64,
    pub wound_annihilation_bonus: f64,
    pub wound_max_chance: f64,

    /// Injury inflicted by a wound roll (inclusive range)
    pub wound_min: i64,
    pub wound_max: i64,

    /// Injury never exceeds this
    pub injury_cap: f64,

    pub victory_atmos_gain: f64,
    pub defeat_atmos_loss: f64,
    pub victory_train_gain: f64,

    /// Permanent bonus for a principal defender who holds
    pub defense_train_bonus: f64,
    pub defense_atmos_bonus: f64,

    /// Experience per soldier killed / lost
    pub experience_per_kill: f64,
    pub experience_per_death: f64,

    /// Experience granted to the commander who takes a city
    pub conquest_experience: f64,

    /// Share of the city's stores carried off on conquest
    pub plunder_ratio: f64,

    // === DEFAULTS ===
    /// Leadership / strength / intelligence when the roster omits them
    pub default_stat: f64,
    pub default_train: f64,
    pub default_atmos: f64,

    /// Turn (mass) / phase (duel) budget when the battle omits one
    pub default_max_turns: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // War power
            arm_per_phase: 500.0,
            stat_min: 40.0,
            stat_max: 130.0,
            train_floor: 50.0,
            crew_coef_divisor: 233.33,
            crew_coef_base: 70.0,
            crew_coef_max: 100.0,
            raw_power_floor: 100.0,
            dex_negligible: 1.0,

            // Damage
            damage_random_min: 0.9,
            damage_random_max: 1.1,
            duel_injury_cap: 80.0,
            duel_injury_divisor: 120.0,
            critical_multiplier: 1.5,
            avoid_multiplier: 0.5,
            mass_defense_base: 120.0,
            mass_morale_weight: 0.25,

            // Supply
            supply_rate: 0.8,
            default_supply_per_soldier: 0.1,

            // Modifiers
            fatigue_grace_turns: 10,
            fatigue_step: 0.02,
            fatigue_floor: 0.7,
            wall_defense_bonus: 0.2,
            plain_cavalry_bonus: 0.1,

            // Duel
            preemptive_ratio: 0.5,
            siege_damage_bonus: 1.5,
            city_retaliation_per_leadership: 5.0,
            retreat_loss_min: 0.1,
            retreat_loss_max: 0.3,
            pursuit_chance_min: 0.2,
            pursuit_chance_max: 0.6,
            pursuit_damage_min: 0.2,
            pursuit_damage_max: 0.5,
            pursuit_morale_cavalry: 50.0,
            pursuit_morale_archer: 60.0,
            pursuit_morale_other: 80.0,
            approach_train_gain: 1.0,
            intimidate_morale_drop: 5.0,

            // Aftermath
            wound_base_chance: 0.05,
            wound_loss_weight: 0.3,
            wound_defeat_multiplier: 2.0,
            wound_annihilation_bonus: 0.3,
            wound_max_chance: 0.9,
            wound_min: 5,
            wound_max: 30,
            injury_cap: 80.0,
            victory_atmos_gain: 5.0,
            defeat_atmos_loss: 5.0,
            victory_train_gain: 1.0,
            defense_train_bonus: 2.0,
            defense_atmos_bonus: 3.0,
            experience_per_kill: 0.02,
            experience_per_death: 0.01,
            conquest_experience: 1000.0,
            plunder_ratio: 0.5,

            // Defaults
            default_stat: 50.0,
            default_train: 100.0,
            default_atmos: 100.0,
            default_max_turns: 50,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate().map_err(BattleError::InvalidConfig)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Clamp a morale/training value into the configured band
    pub fn clamp_stat(&self, value: f64) -> f64 {
        value.clamp(self.stat_min, self.stat_max)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.stat_min >= self.stat_max {
            return Err(format!(
                "stat_min ({}) should be < stat_max ({})",
                self.stat_min, self.stat_max
            ));
        }

        if self.crew_coef_base > self.crew_coef_max {
            return Err(format!(
                "crew_coef_base ({}) should be <= crew_coef_max ({})",
                self.crew_coef_base, self.crew_coef_max
            ));
        }

        if self.damage_random_min > self.damage_random_max {
            return Err(format!(
                "damage_random_min ({}) should be <= damage_random_max ({})",
                self.damage_random_min, self.damage_random_max
            ));
        }

        // Divisors
        if self.crew_coef_divisor <= 0.0
            || self.duel_injury_divisor <= 0.0
            || self.mass_defense_base <= 0.0
            || self.train_floor <= 0.0
        {
            return Err("Divisors must be positive".into());
        }

        if self.wound_min > self.wound_max {
            return Err(format!(
                "wound_min ({}) should be <= wound_max ({})",
                self.wound_min, self.wound_max
            ));
        }

        if !(0.0..=1.0).contains(&self.fatigue_floor) {
            return Err(format!("fatigue_floor ({}) must lie in [0, 1]", self.fatigue_floor));
        }

        Ok(())
    }
}
