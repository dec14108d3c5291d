//! Build/disband-phase resolution.
//!
//! Validates and applies adjustments at the end of a game year. A faction
//! short of disbands falls into civil disorder: the units farthest from its
//! home centers are removed.

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardState, Faction, Order, TerritoryId, ALL_FACTIONS, FACTION_COUNT};
use crate::error::InvariantViolation;

use super::adjudicator::OrderResult;

/// The adjustment a faction owes this Build phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Adjustment {
    None,
    Build(usize),
    Disband(usize),
}

impl Adjustment {
    pub fn is_none(&self) -> bool {
        matches!(self, Adjustment::None)
    }
}

/// The result of resolving a build, disband or waive order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub order: Order,
    pub faction: Faction,
    pub result: OrderResult,
}

/// Unoccupied home centers still owned by `faction`, in territory order.
pub fn build_sites(board: &Board, state: &BoardState, faction: Faction) -> Vec<TerritoryId> {
    board
        .home_centers(faction)
        .into_iter()
        .filter(|&id| state.sc_owner[id.index()] == Some(faction) && state.unit_at(id).is_none())
        .collect()
}

/// Computes what `faction` owes. Builds are capped by available sites.
pub fn adjustment(board: &Board, state: &BoardState, faction: Faction) -> Adjustment {
    let centers = state.center_count(faction);
    let units = state.unit_count(faction);
    if centers > units {
        let n = (centers - units).min(build_sites(board, state, faction).len());
        if n == 0 {
            Adjustment::None
        } else {
            Adjustment::Build(n)
        }
    } else if units > centers {
        Adjustment::Disband(units - centers)
    } else {
        Adjustment::None
    }
}

/// Adjustments for every faction, indexed by [`Faction::index`].
pub fn adjustments(board: &Board, state: &BoardState) -> [Adjustment; FACTION_COUNT] {
    let mut out = [Adjustment::None; FACTION_COUNT];
    for f in ALL_FACTIONS {
        out[f.index()] = adjustment(board, state, f);
    }
    out
}

/// Returns true if any faction owes builds or disbands.
pub fn needs_build_phase(board: &Board, state: &BoardState) -> bool {
    adjustments(board, state).iter().any(|a| !a.is_none())
}

/// Resolves build-phase orders for all factions.
///
/// - Builds: valid sites only, one per site, capped at the allowance. Waive
///   uses up one allowance.
/// - Disbands: own units only, capped at the requirement; any shortfall is
///   filled by civil disorder.
/// - Factions that owe nothing have every order fail.
pub fn resolve_builds(
    board: &Board,
    orders: &[(Order, Faction)],
    state: &BoardState,
) -> Vec<BuildResult> {
    let mut results = Vec::new();

    for faction in ALL_FACTIONS {
        let owed = adjustment(board, state, faction);
        let sites = build_sites(board, state, faction);
        let mut used_sites: Vec<TerritoryId> = Vec::new();
        let mut disbanded: Vec<TerritoryId> = Vec::new();
        let mut count = 0;

        for &(order, f) in orders {
            if f != faction {
                continue;
            }
            let ok = match (owed, order) {
                (Adjustment::Build(allowed), Order::Build { site }) => {
                    let valid =
                        count < allowed && sites.contains(&site) && !used_sites.contains(&site);
                    if valid {
                        used_sites.push(site);
                    }
                    valid
                }
                (Adjustment::Build(allowed), Order::Waive) => count < allowed,
                (Adjustment::Disband(needed), Order::Disband { unit }) => {
                    let valid = count < needed
                        && state.unit_at(unit) == Some(faction)
                        && !disbanded.contains(&unit);
                    if valid {
                        disbanded.push(unit);
                    }
                    valid
                }
                _ => false,
            };
            if ok {
                count += 1;
            }
            results.push(BuildResult {
                order,
                faction,
                result: if ok {
                    OrderResult::Succeeded
                } else {
                    OrderResult::Bounced
                },
            });
        }

        if let Adjustment::Disband(needed) = owed {
            if count < needed {
                results.extend(civil_disorder(board, faction, needed - count, state, &disbanded));
            }
        }
    }

    results
}

/// Disbands the `count` units of `faction` farthest from its home centers.
/// Ties go to the higher territory index.
fn civil_disorder(
    board: &Board,
    faction: Faction,
    count: usize,
    state: &BoardState,
    already: &[TerritoryId],
) -> Vec<BuildResult> {
    let mut candidates: Vec<(TerritoryId, u32)> = state
        .units_of(faction)
        .into_iter()
        .filter(|t| !already.contains(t))
        .map(|t| (t, board.distance_to_home(t, faction).unwrap_or(u32::MAX)))
        .collect();

    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    candidates
        .into_iter()
        .take(count)
        .map(|(unit, _)| BuildResult {
            order: Order::Disband { unit },
            faction,
            result: OrderResult::Succeeded,
        })
        .collect()
}

/// Applies resolved build results to the position.
pub fn apply_builds(
    state: &mut BoardState,
    results: &[BuildResult],
) -> Result<(), InvariantViolation> {
    for r in results {
        if r.result != OrderResult::Succeeded {
            continue;
        }
        match r.order {
            Order::Build { site } => {
                if !state.place_unit(site, r.faction) {
                    return Err(InvariantViolation::DoubleOccupancy(site));
                }
            }
            Order::Disband { unit } => {
                state.remove_unit(unit);
            }
            _ => {}
        }
    }
    Ok(())
}
