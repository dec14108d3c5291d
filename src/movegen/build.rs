//! Build-phase move generation.

use crate::board::{Board, BoardState, Faction, Order};
use crate::resolve::{adjustment, build_sites, Adjustment};

/// Legal adjustment orders for `faction`.
///
/// Owing builds: a Build per free home site plus Waive. Owing disbands: a
/// Disband per unit. Owing nothing: empty.
pub fn legal_builds(board: &Board, state: &BoardState, faction: Faction) -> Vec<Order> {
    match adjustment(board, state, faction) {
        Adjustment::None => Vec::new(),
        Adjustment::Build(_) => {
            let mut orders: Vec<Order> = build_sites(board, state, faction)
                .into_iter()
                .map(|site| Order::Build { site })
                .collect();
            orders.push(Order::Waive);
            orders
        }
        Adjustment::Disband(_) => state
            .units_of(faction)
            .into_iter()
            .map(|unit| Order::Disband { unit })
            .collect(),
    }
}
