//! Orders-phase move generation.
//!
//! Enumerates legal hold, move and support orders for a unit. Every order
//! produced here passes intake validation.

use crate::board::{Board, BoardState, Order, TerritoryId};

/// Generates all legal Orders-phase orders for the unit in `territory`.
///
/// Returns an empty vec if the territory is empty. Frozen territories are
/// not considered; see [`crate::intake::validate_order`].
pub fn legal_orders(board: &Board, state: &BoardState, territory: TerritoryId) -> Vec<Order> {
    if state.unit_at(territory).is_none() {
        return Vec::new();
    }

    let mut orders = vec![Order::Hold { unit: territory }];
    let reachable: Vec<TerritoryId> = board.neighbors(territory).collect();

    for &dest in &reachable {
        orders.push(Order::Move {
            unit: territory,
            dest,
        });
    }

    generate_supports(board, state, territory, &reachable, &mut orders);
    orders
}

/// Support hold for each adjacent unit; support move for every move of
/// another unit into a territory this unit also reaches.
fn generate_supports(
    board: &Board,
    state: &BoardState,
    territory: TerritoryId,
    reachable: &[TerritoryId],
    orders: &mut Vec<Order>,
) {
    for other in state.units() {
        let supported = other.territory;
        if supported == territory {
            continue;
        }
        if reachable.contains(&supported) {
            orders.push(Order::SupportHold {
                unit: territory,
                supported,
            });
        }
        for dest in board.neighbors(supported) {
            if dest == territory || !reachable.contains(&dest) {
                continue;
            }
            orders.push(Order::SupportMove {
                unit: territory,
                supported,
                dest,
            });
        }
    }
}
