//! Weather during a battle
//!
//! Weather affects ranged effectiveness, mounted troops and morale.

use serde::{Deserialize, Serialize};

use crate::battle::unit_type::ArmCategory;

/// Current weather condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Cloudy,
    Rain,
    HeavyRain,
    Snow,
    Blizzard,
    Fog,
    Sandstorm,
}

impl Weather {
    /// Combat effectiveness modifier for ranged and caster attacks
    pub fn ranged_combat_modifier(&self) -> f64 {
        match self {
            Self::Clear => 1.0,
            Self::Cloudy => 1.0,
            Self::Rain => 0.8,
            Self::HeavyRain => 0.6,
            Self::Snow => 0.9,
            Self::Blizzard => 0.5,
            Self::Fog => 0.7,
            Self::Sandstorm => 0.5,
        }
    }

    /// Combat effectiveness modifier for mounted troops
    pub fn mounted_combat_modifier(&self) -> f64 {
        match self {
            Self::HeavyRain => 0.9,
            Self::Snow => 0.9,
            Self::Blizzard => 0.7,
            Self::Sandstorm => 0.8,
            _ => 1.0,
        }
    }

    /// Combat modifier for a given arm
    pub fn arm_modifier(&self, arm: ArmCategory) -> f64 {
        if arm.is_ranged() {
            self.ranged_combat_modifier()
        } else if arm.is_mounted() {
            self.mounted_combat_modifier()
        } else if matches!(arm, ArmCategory::Siege) {
            // Wet ropes and frozen gears
            match self {
                Self::HeavyRain | Self::Blizzard => 0.8,
                _ => 1.0,
            }
        } else {
            1.0
        }
    }

    /// Morale multiplier while fighting in this weather
    pub fn morale_modifier(&self) -> f64 {
        match self {
            Self::HeavyRain => 0.95,
            Self::Blizzard => 0.9,
            Self::Sandstorm => 0.93,
            _ => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "맑음",
            Self::Cloudy => "흐림",
            Self::Rain => "비",
            Self::HeavyRain => "폭우",
            Self::Snow => "눈",
            Self::Blizzard => "눈보라",
            Self::Fog => "안개",
            Self::Sandstorm => "모래폭풍",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_is_neutral() {
        assert_eq!(Weather::Clear.arm_modifier(ArmCategory::Archer), 1.0);
        assert_eq!(Weather::Clear.arm_modifier(ArmCategory::Cavalry), 1.0);
        assert_eq!(Weather::Clear.morale_modifier(), 1.0);
    }

    #[test]
    fn test_rain_and_fog_hurt_ranged() {
        assert!(Weather::Rain.arm_modifier(ArmCategory::Archer) < 1.0);
        assert!(Weather::Fog.arm_modifier(ArmCategory::Wizard) < 1.0);
        assert_eq!(Weather::Rain.arm_modifier(ArmCategory::Footman), 1.0);
    }

    #[test]
    fn test_heavy_weather_worse_than_light() {
        assert!(Weather::HeavyRain.ranged_combat_modifier() < Weather::Rain.ranged_combat_modifier());
        assert!(Weather::Blizzard.mounted_combat_modifier() < Weather::Snow.mounted_combat_modifier());
    }
}
