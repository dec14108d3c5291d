//! Arena board graph.
//!
//! Territories and hyperlanes are stored in dense vectors and referenced by
//! integer index. Each territory keeps a short adjacency list of
//! `(neighbor, edge)` pairs. The board is read-only once constructed.
//!
//! Edges are undirected. Externally an edge is addressed by its canonical id:
//! the two territory string ids sorted lexicographically and joined with `~`,
//! e.g. `"earth~vulcan"`.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use super::map::MapDefinition;
use super::territory::{Faction, Layer, Territory, TerritoryId};

/// Separator used in canonical edge ids.
pub const EDGE_SEPARATOR: char = '~';

/// Errors raised while building a board from map data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("duplicate territory id '{0}'")]
    DuplicateTerritory(String),

    #[error("lane references unknown territory '{0}'")]
    UnknownTerritory(String),

    #[error("lane connects '{0}' to itself")]
    SelfLoop(String),

    #[error("duplicate lane '{0}'")]
    DuplicateEdge(String),

    #[error("territory '{0}' is a supply center outside the core layer")]
    SupplyOutsideCore(String),

    #[error("territory '{0}' is a home center but not a supply center")]
    HomeWithoutSupply(String),

    #[error("vertical lane '{0}' must join a core territory to a hyperspace territory")]
    VerticalLaneLayers(String),

    #[error("board has {0} territories, more than the arena can index")]
    TooManyTerritories(usize),
}

/// Whether an edge is a horizontal hyperlane or a vertical lane between layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    Hyperlane,
    Vertical,
}

/// An undirected edge. `a` sorts before `b` by string id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub a: TerritoryId,
    pub b: TerritoryId,
    pub kind: LaneKind,
}

impl Edge {
    /// Returns true if `id` is one of the endpoints.
    pub fn touches(&self, id: TerritoryId) -> bool {
        self.a == id || self.b == id
    }

    /// Returns the endpoint opposite `id`, or None if `id` is not an endpoint.
    pub fn other(&self, id: TerritoryId) -> Option<TerritoryId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// One entry in a territory's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef {
    pub neighbor: TerritoryId,
    /// Index into [`Board::edges`].
    pub edge: usize,
}

/// Builds the canonical id for the edge between two string ids.
pub fn canonical_edge_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}{EDGE_SEPARATOR}{b}")
    } else {
        format!("{b}{EDGE_SEPARATOR}{a}")
    }
}

/// Splits a canonical edge id into its two endpoint ids.
///
/// Accepts the endpoints in either order and always returns them sorted.
/// Returns None for malformed ids.
pub fn split_edge_key(key: &str) -> Option<(&str, &str)> {
    let (a, b) = key.split_once(EDGE_SEPARATOR)?;
    if a.is_empty() || b.is_empty() || a == b || b.contains(EDGE_SEPARATOR) {
        return None;
    }
    if a <= b {
        Some((a, b))
    } else {
        Some((b, a))
    }
}

/// The immutable territory graph.
#[derive(Debug, Clone)]
pub struct Board {
    name: String,
    territories: Vec<Territory>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<EdgeRef>>,
    index: HashMap<String, TerritoryId>,
    supply_centers: usize,
}

impl Board {
    /// Builds and validates a board from a map definition.
    pub fn from_definition(def: &MapDefinition) -> Result<Board, BoardError> {
        if def.territories.len() > u16::MAX as usize {
            return Err(BoardError::TooManyTerritories(def.territories.len()));
        }

        let mut territories = Vec::with_capacity(def.territories.len());
        let mut index = HashMap::with_capacity(def.territories.len());

        for (i, rec) in def.territories.iter().enumerate() {
            if index.contains_key(&rec.id) {
                return Err(BoardError::DuplicateTerritory(rec.id.clone()));
            }
            if rec.supply_center && rec.layer != Layer::Core {
                return Err(BoardError::SupplyOutsideCore(rec.id.clone()));
            }
            if rec.home.is_some() && !rec.supply_center {
                return Err(BoardError::HomeWithoutSupply(rec.id.clone()));
            }
            index.insert(rec.id.clone(), TerritoryId(i as u16));
            territories.push(Territory {
                key: rec.id.clone(),
                name: rec.name.clone(),
                layer: rec.layer,
                supply_center: rec.supply_center,
                home: rec.home,
                position: (rec.x, rec.y),
            });
        }

        let mut board = Board {
            name: def.name.clone(),
            supply_centers: territories.iter().filter(|t| t.supply_center).count(),
            adjacency: vec![Vec::new(); territories.len()],
            territories,
            edges: Vec::new(),
            index,
        };

        for [a, b] in &def.hyperlanes {
            board.add_edge(a, b, LaneKind::Hyperlane)?;
        }
        for [a, b] in &def.vertical_lanes {
            board.add_edge(a, b, LaneKind::Vertical)?;
        }

        Ok(board)
    }

    fn add_edge(&mut self, a: &str, b: &str, kind: LaneKind) -> Result<(), BoardError> {
        let ia = self
            .lookup(a)
            .ok_or_else(|| BoardError::UnknownTerritory(a.to_string()))?;
        let ib = self
            .lookup(b)
            .ok_or_else(|| BoardError::UnknownTerritory(b.to_string()))?;
        if ia == ib {
            return Err(BoardError::SelfLoop(a.to_string()));
        }
        if self.is_adjacent(ia, ib) {
            return Err(BoardError::DuplicateEdge(canonical_edge_key(a, b)));
        }
        if kind == LaneKind::Vertical {
            let la = self.territory(ia).layer;
            let lb = self.territory(ib).layer;
            if la.is_hyperspace() == lb.is_hyperspace() {
                return Err(BoardError::VerticalLaneLayers(canonical_edge_key(a, b)));
            }
        }

        let (lo, hi) = if a <= b { (ia, ib) } else { (ib, ia) };
        let edge = self.edges.len();
        self.edges.push(Edge { a: lo, b: hi, kind });
        self.adjacency[ia.index()].push(EdgeRef { neighbor: ib, edge });
        self.adjacency[ib.index()].push(EdgeRef { neighbor: ia, edge });
        Ok(())
    }

    /// Returns the map name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all territories in index order.
    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    /// Returns the number of territories.
    pub fn territory_count(&self) -> usize {
        self.territories.len()
    }

    /// Returns every territory id in index order.
    pub fn ids(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        (0..self.territories.len()).map(|i| TerritoryId(i as u16))
    }

    /// Returns true if `id` indexes a territory of this board.
    pub fn contains(&self, id: TerritoryId) -> bool {
        id.index() < self.territories.len()
    }

    /// Returns the metadata for a territory.
    ///
    /// Panics on an id from another board; that is a caller bug.
    pub fn territory(&self, id: TerritoryId) -> &Territory {
        &self.territories[id.index()]
    }

    /// Returns the string id of a territory.
    pub fn key(&self, id: TerritoryId) -> &str {
        &self.territories[id.index()].key
    }

    /// Resolves a string id to its arena index.
    pub fn lookup(&self, key: &str) -> Option<TerritoryId> {
        self.index.get(key).copied()
    }

    /// Returns all edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the adjacency list of a territory.
    pub fn edges_of(&self, id: TerritoryId) -> &[EdgeRef] {
        &self.adjacency[id.index()]
    }

    /// Iterates over the neighbors of a territory.
    pub fn neighbors(&self, id: TerritoryId) -> impl Iterator<Item = TerritoryId> + '_ {
        self.adjacency[id.index()].iter().map(|e| e.neighbor)
    }

    /// Returns true if a lane joins `a` and `b`.
    pub fn is_adjacent(&self, a: TerritoryId, b: TerritoryId) -> bool {
        self.adjacency[a.index()].iter().any(|e| e.neighbor == b)
    }

    /// Returns the canonical edge id for two territories.
    ///
    /// The result does not depend on argument order. It is defined for any
    /// pair, adjacent or not.
    pub fn canonical_edge_id(&self, a: TerritoryId, b: TerritoryId) -> String {
        canonical_edge_key(self.key(a), self.key(b))
    }

    /// Parses a canonical edge id back into both endpoints, sorted by string id.
    pub fn parse_edge_id(&self, key: &str) -> Option<(TerritoryId, TerritoryId)> {
        let (a, b) = split_edge_key(key)?;
        Some((self.lookup(a)?, self.lookup(b)?))
    }

    /// Returns the index of the edge between `a` and `b`, if any.
    pub fn edge_between(&self, a: TerritoryId, b: TerritoryId) -> Option<usize> {
        self.adjacency[a.index()]
            .iter()
            .find(|e| e.neighbor == b)
            .map(|e| e.edge)
    }

    /// Two edges are adjacent iff they share exactly one endpoint.
    pub fn edges_adjacent(&self, e1: usize, e2: usize) -> bool {
        let x = self.edges[e1];
        let y = self.edges[e2];
        let shared = [x.a, x.b].iter().filter(|&&t| y.touches(t)).count();
        shared == 1
    }

    /// Returns the total number of supply centers on the board.
    pub fn supply_center_count(&self) -> usize {
        self.supply_centers
    }

    /// Returns the home centers of a faction in index order.
    pub fn home_centers(&self, faction: Faction) -> Vec<TerritoryId> {
        self.ids()
            .filter(|&id| self.territory(id).is_home_of(faction))
            .collect()
    }

    /// BFS hop count from `from` to the nearest home center of `faction`.
    ///
    /// Returns None if the faction has no reachable home center.
    pub fn distance_to_home(&self, from: TerritoryId, faction: Faction) -> Option<u32> {
        let mut visited = vec![false; self.territories.len()];
        let mut queue = VecDeque::new();
        visited[from.index()] = true;
        queue.push_back((from, 0u32));

        while let Some((id, dist)) = queue.pop_front() {
            if self.territory(id).is_home_of(faction) {
                return Some(dist);
            }
            for next in self.neighbors(id) {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    queue.push_back((next, dist + 1));
                }
            }
        }
        None
    }
}
