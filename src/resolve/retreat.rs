//! Retreat-phase resolution.
//!
//! If two dislodged units retreat to the same territory, both are disbanded.
//! Unordered dislodged units are disbanded (civil disorder).

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardState, Faction, Order, TerritoryId};
use crate::error::InvariantViolation;

use super::adjudicator::OrderResult;

/// The result of resolving a retreat or disband order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetreatResult {
    pub order: Order,
    pub faction: Faction,
    pub result: OrderResult,
}

/// Territories a dislodged unit in `territory` may retreat to.
///
/// A destination must be adjacent, unoccupied, not the territory the attacker
/// came from, and not left empty by a standoff this turn.
pub fn retreat_destinations(
    board: &Board,
    state: &BoardState,
    territory: TerritoryId,
) -> Vec<TerritoryId> {
    let Some(d) = state.dislodged[territory.index()] else {
        return Vec::new();
    };
    board
        .neighbors(territory)
        .filter(|&dest| {
            dest != d.attacker_from
                && state.unit_at(dest).is_none()
                && !state.standoffs[dest.index()]
        })
        .collect()
}

/// Resolves retreat-phase orders. Orders are assumed validated by intake.
///
/// - Dislodged units with no order are disbanded.
/// - Retreats sharing a destination all fail and their units are disbanded.
/// - Disband orders always succeed.
pub fn resolve_retreats(orders: &[(Order, Faction)], state: &BoardState) -> Vec<RetreatResult> {
    let n = state.units.len();
    let mut results = Vec::new();

    let mut has_order = vec![false; n];
    let mut target_count = vec![0u8; n];
    for (order, _) in orders {
        if let Some(unit) = order.unit() {
            has_order[unit.index()] = true;
        }
        if let Order::Retreat { dest, .. } = order {
            target_count[dest.index()] = target_count[dest.index()].saturating_add(1);
        }
    }

    for (i, d) in state.dislodged.iter().enumerate() {
        if let Some(d) = d {
            if !has_order[i] {
                results.push(RetreatResult {
                    order: Order::Disband {
                        unit: TerritoryId(i as u16),
                    },
                    faction: d.faction,
                    result: OrderResult::Succeeded,
                });
            }
        }
    }

    for &(order, faction) in orders {
        let result = match order {
            Order::Disband { .. } => OrderResult::Succeeded,
            Order::Retreat { unit, dest } => {
                if state.dislodged[unit.index()].is_none() || target_count[dest.index()] > 1 {
                    OrderResult::Bounced
                } else {
                    OrderResult::Succeeded
                }
            }
            _ => OrderResult::Bounced,
        };
        results.push(RetreatResult {
            order,
            faction,
            result,
        });
    }

    results
}

/// Applies retreat results. Successful retreats re-enter the board; every
/// other dislodged unit is gone. Dislodgement records are cleared.
pub fn apply_retreats(
    state: &mut BoardState,
    results: &[RetreatResult],
) -> Result<(), InvariantViolation> {
    for r in results {
        if r.result != OrderResult::Succeeded {
            continue;
        }
        if let Order::Retreat { dest, .. } = r.order {
            if !state.place_unit(dest, r.faction) {
                return Err(InvariantViolation::DoubleOccupancy(dest));
            }
        }
    }
    state.dislodged.iter_mut().for_each(|d| *d = None);
    Ok(())
}
