//! Battle table constants: skill identifiers, skill percentages and supply tiers
//!
//! Formula constants that callers may want to tune live in `EngineConfig`;
//! the values here are fixed parts of the rules themselves.

// Special skill identifiers as they appear in commander rosters
pub const SKILL_CHARGE: &str = "charge";
pub const SKILL_FOCUS: &str = "focus";
pub const SKILL_INTIMIDATE: &str = "intimidate";
pub const SKILL_FORTIFY: &str = "fortify";
pub const SKILL_VOLLEY: &str = "volley";

// Attack percentage each active skill contributes
pub const CHARGE_ATTACK_PCT: f64 = 10.0;
pub const FOCUS_ATTACK_PCT: f64 = 8.0;
pub const INTIMIDATE_ATTACK_PCT: f64 = 5.0;

// Defense percentage of an active fortify
pub const FORTIFY_DEFENSE_PCT: f64 = 15.0;

// Attack percentage per point of inherited critical / avoid buff
pub const CRITICAL_BUFF_WEIGHT: f64 = 0.5;
pub const AVOID_BUFF_WEIGHT: f64 = 0.25;

// Duel activation chance of each skill, in percent
pub const SKILL_ACTIVATION_PCT: f64 = 50.0;

// Bonus phases granted by an active charge
pub const CHARGE_BONUS_PHASES: u32 = 1;

// Supply tiers: remaining supply per 100 troops → multiplier
// Abundant, sufficient, strained, short, starving
pub const SUPPLY_TIERS: [(f64, f64); 4] = [(5.0, 1.0), (3.0, 0.9), (2.0, 0.8), (1.0, 0.65)];
pub const SUPPLY_STARVING: f64 = 0.5;

/// Is this a skill the rules know about?
pub fn is_known_skill(name: &str) -> bool {
    matches!(
        name,
        SKILL_CHARGE | SKILL_FOCUS | SKILL_INTIMIDATE | SKILL_FORTIFY | SKILL_VOLLEY
    )
}
