//! Factions, layers, and territory metadata.
//!
//! Territories live in a dense arena owned by [`Board`](super::Board) and are
//! addressed by [`TerritoryId`], a `u16` index into that arena. The string id
//! carried by each territory is only used at the external boundary (map data,
//! order notation, reports).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The number of playable factions.
pub const FACTION_COUNT: usize = 7;

/// A playable faction.
///
/// The `#[repr(u8)]` discriminant doubles as an index into per-faction arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Faction {
    Federation = 0,
    Klingon = 1,
    Romulan = 2,
    Cardassian = 3,
    Ferengi = 4,
    Breen = 5,
    Gorn = 6,
}

/// All factions in index order.
pub const ALL_FACTIONS: [Faction; FACTION_COUNT] = [
    Faction::Federation,
    Faction::Klingon,
    Faction::Romulan,
    Faction::Cardassian,
    Faction::Ferengi,
    Faction::Breen,
    Faction::Gorn,
];

impl Faction {
    /// Returns the index of this faction for per-faction arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the lowercase name used in map data and order notation.
    pub const fn name(self) -> &'static str {
        match self {
            Faction::Federation => "federation",
            Faction::Klingon => "klingon",
            Faction::Romulan => "romulan",
            Faction::Cardassian => "cardassian",
            Faction::Ferengi => "ferengi",
            Faction::Breen => "breen",
            Faction::Gorn => "gorn",
        }
    }

    /// Parses a faction from its lowercase name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Faction> {
        ALL_FACTIONS
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The layer a territory sits on.
///
/// Only the core layer carries ownership or supply value; the hyperspace
/// layers exist as bypass routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Layer {
    LowerHyperspace,
    Core,
    UpperHyperspace,
}

impl Layer {
    /// Returns true for either hyperspace layer.
    pub const fn is_hyperspace(self) -> bool {
        !matches!(self, Layer::Core)
    }
}

impl TryFrom<u8> for Layer {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Layer::LowerHyperspace),
            2 => Ok(Layer::Core),
            3 => Ok(Layer::UpperHyperspace),
            other => Err(format!("layer must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Layer> for u8 {
    fn from(layer: Layer) -> u8 {
        match layer {
            Layer::LowerHyperspace => 1,
            Layer::Core => 2,
            Layer::UpperHyperspace => 3,
        }
    }
}

/// Dense index of a territory within its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerritoryId(pub u16);

impl TerritoryId {
    /// Returns the arena index as `usize`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Static metadata for one territory.
#[derive(Debug, Clone, PartialEq)]
pub struct Territory {
    /// Unique string id, e.g. `"earth"`.
    pub key: String,
    pub name: String,
    pub layer: Layer,
    pub supply_center: bool,
    /// The faction this territory is a home center for, if any.
    pub home: Option<Faction>,
    /// Map coordinates. Presentation only.
    pub position: (f32, f32),
}

impl Territory {
    /// Returns true if this is a home supply center of `faction`.
    pub fn is_home_of(&self, faction: Faction) -> bool {
        self.supply_center && self.home == Some(faction)
    }
}
