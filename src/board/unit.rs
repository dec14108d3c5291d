//! Units and their positions.

use serde::{Deserialize, Serialize};

use super::territory::{Faction, TerritoryId};

/// A unit on the board. Units are interchangeable apart from ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub faction: Faction,
    pub territory: TerritoryId,
}

impl Unit {
    pub fn new(faction: Faction, territory: TerritoryId) -> Self {
        Unit { faction, territory }
    }
}
