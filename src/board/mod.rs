//! Board representation and position types.
//!
//! Contains the territory graph, map data loading, orders, and the position
//! snapshot the phase machine mutates.

pub mod graph;
pub mod map;
pub mod order;
pub mod state;
pub mod territory;
pub mod unit;

pub use graph::{
    canonical_edge_key, split_edge_key, Board, BoardError, Edge, EdgeRef, LaneKind,
    EDGE_SEPARATOR,
};
pub use map::{standard_board, MapDefinition, TerritoryRecord, GALAXY_JSON};
pub use order::{Order, OrderKind};
pub use state::{BoardState, DislodgedUnit, Phase, PhaseId, Season};
pub use territory::{Faction, Layer, Territory, TerritoryId, ALL_FACTIONS, FACTION_COUNT};
pub use unit::Unit;
