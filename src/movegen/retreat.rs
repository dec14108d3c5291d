//! Retreat-phase move generation.

use crate::board::{Board, BoardState, Order, TerritoryId};
use crate::resolve::retreat_destinations;

/// Legal retreats for the dislodged unit in `territory`, plus Disband.
///
/// Returns an empty vec if nothing was dislodged there.
pub fn legal_retreats(board: &Board, state: &BoardState, territory: TerritoryId) -> Vec<Order> {
    if state.dislodged[territory.index()].is_none() {
        return Vec::new();
    }
    let mut orders: Vec<Order> = retreat_destinations(board, state, territory)
        .into_iter()
        .map(|dest| Order::Retreat {
            unit: territory,
            dest,
        })
        .collect();
    orders.push(Order::Disband { unit: territory });
    orders
}
