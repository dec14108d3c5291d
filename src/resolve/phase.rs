//! Phase sequencing.
//!
//! Determines the next phase of the game year and advances the position clock.

use crate::board::{Board, BoardState, Phase, Season, TerritoryId};

/// Computes the next (season, phase) given the current phase and whether any
/// unit is awaiting retreat.
///
/// Phase flow:
/// - Spring Orders  -> Spring Retreat (if dislodged) OR Fall Orders
/// - Spring Retreat -> Fall Orders
/// - Fall Orders    -> Fall Retreat (if dislodged) OR Fall Build
/// - Fall Retreat   -> Fall Build
/// - Fall Build     -> Spring Orders (next year)
///
/// A Fall Build with no adjustments owed is still entered; the caller applies
/// it immediately.
pub fn next_phase(season: Season, phase: Phase, has_dislodgements: bool) -> (Season, Phase) {
    match phase {
        Phase::Orders if has_dislodgements => (season, Phase::Retreat),
        Phase::Orders | Phase::Retreat => after_orders(season),
        Phase::Build => (Season::Spring, Phase::Orders),
    }
}

fn after_orders(season: Season) -> (Season, Phase) {
    match season {
        Season::Spring => (Season::Fall, Phase::Orders),
        Season::Fall => (Season::Fall, Phase::Build),
    }
}

/// Supply centers are captured by the faction whose unit occupies them.
/// Unoccupied centers keep their owner.
///
/// Returns the territories whose owner changed.
pub fn update_sc_ownership(board: &Board, state: &mut BoardState) -> Vec<TerritoryId> {
    let mut changed = Vec::new();
    for id in board.ids() {
        if !board.territory(id).supply_center {
            continue;
        }
        if let Some(faction) = state.unit_at(id) {
            if state.sc_owner[id.index()] != Some(faction) {
                state.sc_owner[id.index()] = Some(faction);
                changed.push(id);
            }
        }
    }
    changed
}

/// Advances the position to the next phase.
///
/// Handles ownership capture after Fall Orders (when no retreat follows) and
/// after Fall Retreat, the year increment, and clearing retreat bookkeeping
/// when not entering a Retreat phase. Returns the territories whose owner
/// changed.
pub fn advance_state(
    board: &Board,
    state: &mut BoardState,
    has_dislodgements: bool,
) -> Vec<TerritoryId> {
    let (next_season, next) = next_phase(state.season, state.phase, has_dislodgements);

    let mut changed = Vec::new();
    if state.season == Season::Fall && next == Phase::Build {
        changed = update_sc_ownership(board, state);
    }

    if next_season == Season::Spring && next == Phase::Orders {
        state.year += 1;
    }
    state.season = next_season;
    state.phase = next;

    if next != Phase::Retreat {
        state.dislodged.iter_mut().for_each(|d| *d = None);
        state.standoffs.iter_mut().for_each(|s| *s = false);
    }
    changed
}
