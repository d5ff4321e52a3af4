//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for commanders (generals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneralId(pub u32);

/// Unique identifier for nations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NationId(pub u32);

/// Unique identifier for cities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub u32);

/// Position of a combat unit inside the unit array owned by one battle run.
///
/// Only meaningful for the run that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitIndex(pub usize);

/// Phase / turn counter (one duel exchange or one mass round)
pub type Phase = u32;

/// Which side of the battle a unit fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }

    pub fn is_attacker(&self) -> bool {
        matches!(self, Side::Attacker)
    }
}
