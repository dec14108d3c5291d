//! Static map data.
//!
//! The standard galaxy ships as JSON embedded at compile time. Custom maps can
//! be loaded through [`MapDefinition::from_json`] and turned into a [`Board`]
//! with [`Board::from_definition`].

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use super::graph::Board;
use super::territory::{Faction, Layer};

/// The standard seven-faction galaxy.
pub const GALAXY_JSON: &str = include_str!("../../data/galaxy.json");

/// One territory record as it appears in map data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryRecord {
    pub id: String,
    pub name: String,
    pub layer: Layer,
    #[serde(default)]
    pub supply_center: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<Faction>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

/// Raw map data: territories plus horizontal and vertical lane lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    pub territories: Vec<TerritoryRecord>,
    #[serde(default)]
    pub hyperlanes: Vec<[String; 2]>,
    #[serde(default)]
    pub vertical_lanes: Vec<[String; 2]>,
}

impl MapDefinition {
    /// Parses a map definition from JSON.
    pub fn from_json(json: &str) -> Result<MapDefinition, serde_json::Error> {
        serde_json::from_str(json)
    }
}

static STANDARD_BOARD: LazyLock<Arc<Board>> = LazyLock::new(|| {
    let def = MapDefinition::from_json(GALAXY_JSON).expect("embedded galaxy map is valid JSON");
    Arc::new(Board::from_definition(&def).expect("embedded galaxy map is a valid board"))
});

/// Returns the shared standard board.
pub fn standard_board() -> Arc<Board> {
    Arc::clone(&STANDARD_BOARD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::territory::ALL_FACTIONS;
    use std::collections::VecDeque;

    #[test]
    fn standard_board_shape() {
        let board = standard_board();
        assert_eq!(board.territory_count(), 60);
        assert_eq!(board.supply_center_count(), 44);

        let core = board
            .territories()
            .iter()
            .filter(|t| t.layer == Layer::Core)
            .count();
        assert_eq!(core, 54);

        let lower = board
            .territories()
            .iter()
            .filter(|t| t.layer == Layer::LowerHyperspace)
            .count();
        assert_eq!(lower, 3);
    }

    #[test]
    fn every_faction_has_three_homes() {
        let board = standard_board();
        for f in ALL_FACTIONS {
            assert_eq!(board.home_centers(f).len(), 3, "{f}");
        }
    }

    #[test]
    fn standard_board_is_connected() {
        let board = standard_board();
        let start = board.lookup("earth").unwrap();
        let mut seen = vec![false; board.territory_count()];
        let mut queue = VecDeque::from([start]);
        seen[start.index()] = true;
        while let Some(id) = queue.pop_front() {
            for n in board.neighbors(id) {
                if !seen[n.index()] {
                    seen[n.index()] = true;
                    queue.push_back(n);
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn known_adjacencies() {
        let board = standard_board();
        let id = |k: &str| board.lookup(k).unwrap();
        assert!(board.is_adjacent(id("earth"), id("vulcan")));
        assert!(board.is_adjacent(id("earth"), id("upper_spine")));
        assert!(board.is_adjacent(id("risa"), id("lower_core")));
        assert!(!board.is_adjacent(id("earth"), id("qonos")));
    }

    #[test]
    fn definition_roundtrips_through_json() {
        let def = MapDefinition::from_json(GALAXY_JSON).unwrap();
        let json = serde_json::to_string(&def).unwrap();
        let again = MapDefinition::from_json(&json).unwrap();
        assert_eq!(def, again);
    }
}
