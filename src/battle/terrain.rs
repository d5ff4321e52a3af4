//! Battlefield terrain and its effect on each arm

use serde::{Deserialize, Serialize};

use crate::battle::unit_type::ArmCategory;

/// Terrain the battle is fought on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    #[default]
    Plain,       // Open ground, cavalry country
    Forest,      // Cramped, archers lose sight lines
    Mountain,    // Steep, footmen and archers favoured
    River,       // Fords and banks, mounted troops struggle
    Swamp,       // Everyone bogs down except light footmen
    Wall,        // Fighting on the city walls
    InnerCastle, // Fighting inside the keep
}

impl Terrain {
    /// Arm-specific combat multiplier (1.0 = unaffected)
    pub fn arm_modifier(&self, arm: ArmCategory) -> f64 {
        use ArmCategory::*;
        match (self, arm) {
            (Terrain::Forest, Cavalry) => 0.8,
            (Terrain::Forest, Archer) => 0.9,
            (Terrain::Forest, Footman) => 1.1,

            (Terrain::Mountain, Cavalry) => 0.8,
            (Terrain::Mountain, Footman) => 1.05,
            (Terrain::Mountain, Archer) => 1.1,
            (Terrain::Mountain, Siege) => 0.8,

            (Terrain::River, Cavalry) => 0.9,
            (Terrain::River, Wizard) => 1.05,

            (Terrain::Swamp, Cavalry) => 0.7,
            (Terrain::Swamp, Siege) => 0.7,
            (Terrain::Swamp, Footman) => 0.95,

            (Terrain::Wall, Cavalry) | (Terrain::InnerCastle, Cavalry) => 0.8,
            (Terrain::Wall, Siege) => 1.2,

            _ => 1.0,
        }
    }

    /// Do defenders fight from fortifications here?
    pub fn is_fortified(&self) -> bool {
        matches!(self, Terrain::Wall | Terrain::InnerCastle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Terrain::Plain => "평지",
            Terrain::Forest => "숲",
            Terrain::Mountain => "산지",
            Terrain::River => "강",
            Terrain::Swamp => "늪지",
            Terrain::Wall => "성벽",
            Terrain::InnerCastle => "내성",
        }
    }
}
