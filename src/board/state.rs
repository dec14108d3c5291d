//! Position snapshot.
//!
//! Holds unit placement, supply-center ownership, pending dislodgements and
//! the season/phase clock. Per-territory data lives in vectors indexed by
//! [`TerritoryId`], sized to the board the state was created for.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::graph::Board;
use super::territory::{Faction, TerritoryId, FACTION_COUNT};
use super::unit::Unit;

/// The season of a game turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Fall,
}

impl Season {
    pub const fn name(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Fall => "fall",
        }
    }
}

/// The phase within a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Orders,
    Retreat,
    Build,
}

impl Phase {
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Orders => "orders",
            Phase::Retreat => "retreat",
            Phase::Build => "build",
        }
    }
}

/// Identifies one phase of the game. Submissions must quote the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseId {
    pub year: u16,
    pub season: Season,
    pub phase: Phase,
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.season.name(), self.year, self.phase.name())
    }
}

/// A dislodged unit awaiting retreat, with the territory it was attacked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DislodgedUnit {
    pub faction: Faction,
    pub attacker_from: TerritoryId,
}

/// Complete position at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub year: u16,
    pub season: Season,
    pub phase: Phase,
    /// Owning faction of the unit in each territory.
    pub units: Vec<Option<Faction>>,
    /// Supply-center owner. Always None for non-supply territories.
    pub sc_owner: Vec<Option<Faction>>,
    /// Dislodged units awaiting retreat orders.
    pub dislodged: Vec<Option<DislodgedUnit>>,
    /// Territories left empty by a standoff in the last orders phase.
    pub standoffs: Vec<bool>,
}

impl BoardState {
    /// Creates an empty state for a board with `territory_count` territories.
    pub fn empty(territory_count: usize, year: u16, season: Season, phase: Phase) -> Self {
        BoardState {
            year,
            season,
            phase,
            units: vec![None; territory_count],
            sc_owner: vec![None; territory_count],
            dislodged: vec![None; territory_count],
            standoffs: vec![false; territory_count],
        }
    }

    /// Creates an empty Spring Orders state sized for `board`.
    pub fn for_board(board: &Board, year: u16) -> Self {
        Self::empty(board.territory_count(), year, Season::Spring, Phase::Orders)
    }

    /// Creates the opening position: each participating faction owns its home
    /// centers and has one unit on each. Homes of absent factions stay neutral.
    pub fn initial(board: &Board, year: u16, players: &[Faction]) -> Self {
        let mut state = Self::for_board(board, year);
        for &faction in players {
            for home in board.home_centers(faction) {
                state.units[home.index()] = Some(faction);
                state.sc_owner[home.index()] = Some(faction);
            }
        }
        state
    }

    pub fn phase_id(&self) -> PhaseId {
        PhaseId {
            year: self.year,
            season: self.season,
            phase: self.phase,
        }
    }

    /// Places a unit. Returns false if the territory is already occupied.
    pub fn place_unit(&mut self, territory: TerritoryId, faction: Faction) -> bool {
        let slot = &mut self.units[territory.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(faction);
        true
    }

    /// Removes and returns the unit in a territory.
    pub fn remove_unit(&mut self, territory: TerritoryId) -> Option<Faction> {
        self.units[territory.index()].take()
    }

    pub fn unit_at(&self, territory: TerritoryId) -> Option<Faction> {
        self.units[territory.index()]
    }

    pub fn set_sc_owner(&mut self, territory: TerritoryId, owner: Option<Faction>) {
        self.sc_owner[territory.index()] = owner;
    }

    pub fn set_dislodged(&mut self, territory: TerritoryId, dislodged: DislodgedUnit) {
        self.dislodged[territory.index()] = Some(dislodged);
    }

    pub fn has_dislodgements(&self) -> bool {
        self.dislodged.iter().any(Option::is_some)
    }

    /// Iterates over all units on the board in territory order.
    pub fn units(&self) -> impl Iterator<Item = Unit> + '_ {
        self.units.iter().enumerate().filter_map(|(i, u)| {
            u.map(|faction| Unit {
                faction,
                territory: TerritoryId(i as u16),
            })
        })
    }

    /// Territories occupied by a faction's units, in territory order.
    pub fn units_of(&self, faction: Faction) -> Vec<TerritoryId> {
        self.units()
            .filter(|u| u.faction == faction)
            .map(|u| u.territory)
            .collect()
    }

    /// Number of units per faction.
    pub fn unit_counts(&self) -> [usize; FACTION_COUNT] {
        let mut counts = [0; FACTION_COUNT];
        for f in self.units.iter().flatten() {
            counts[f.index()] += 1;
        }
        counts
    }

    /// Number of supply centers per faction.
    pub fn center_counts(&self) -> [usize; FACTION_COUNT] {
        let mut counts = [0; FACTION_COUNT];
        for f in self.sc_owner.iter().flatten() {
            counts[f.index()] += 1;
        }
        counts
    }

    pub fn unit_count(&self, faction: Faction) -> usize {
        self.units.iter().filter(|u| **u == Some(faction)).count()
    }

    pub fn center_count(&self, faction: Faction) -> usize {
        self.sc_owner.iter().filter(|o| **o == Some(faction)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::standard_board;
    use crate::board::territory::ALL_FACTIONS;

    #[test]
    fn empty_state_has_no_units() {
        let state = BoardState::empty(10, 2370, Season::Spring, Phase::Orders);
        assert!(state.units.iter().all(|u| u.is_none()));
        assert!(state.sc_owner.iter().all(|o| o.is_none()));
        assert!(!state.has_dislodgements());
    }

    #[test]
    fn place_unit_rejects_duplicate() {
        let mut state = BoardState::empty(10, 2370, Season::Spring, Phase::Orders);
        assert!(state.place_unit(TerritoryId(3), Faction::Klingon));
        assert!(!state.place_unit(TerritoryId(3), Faction::Gorn));
        assert_eq!(state.unit_at(TerritoryId(3)), Some(Faction::Klingon));
        assert_eq!(state.remove_unit(TerritoryId(3)), Some(Faction::Klingon));
        assert_eq!(state.unit_at(TerritoryId(3)), None);
    }

    #[test]
    fn initial_position_full_game() {
        let board = standard_board();
        let state = BoardState::initial(&board, 2370, &ALL_FACTIONS);
        assert_eq!(state.phase_id().to_string(), "spring-2370-orders");
        for f in ALL_FACTIONS {
            assert_eq!(state.unit_count(f), 3);
            assert_eq!(state.center_count(f), 3);
        }
        assert_eq!(state.units().count(), 21);
    }

    #[test]
    fn initial_position_leaves_absent_homes_neutral() {
        let board = standard_board();
        let state = BoardState::initial(&board, 2370, &[Faction::Federation, Faction::Gorn]);
        assert_eq!(state.unit_count(Faction::Klingon), 0);
        let qonos = board.lookup("qonos").unwrap();
        assert_eq!(state.sc_owner[qonos.index()], None);
        assert_eq!(state.center_counts()[Faction::Gorn.index()], 3);
    }
}
