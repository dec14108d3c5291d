//! Legal move generation.
//!
//! Generates the set of legal orders for a faction in the current position,
//! covering the Orders, Retreat and Build phases.

pub mod build;
pub mod movement;
pub mod retreat;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, BoardState, Faction, Order, Phase, TerritoryId};
use crate::resolve::{adjustment, Adjustment};

/// Generates a set of random legal orders for `faction`.
///
/// Orders phase: one random order per unit. Retreat phase: one per dislodged
/// unit. Build phase: random builds or disbands up to what is owed.
pub fn random_orders(
    board: &Board,
    faction: Faction,
    state: &BoardState,
    rng: &mut impl Rng,
) -> Vec<Order> {
    match state.phase {
        Phase::Orders => random_movement_orders(board, faction, state, rng),
        Phase::Retreat => random_retreat_orders(board, faction, state, rng),
        Phase::Build => random_build_orders(board, faction, state, rng),
    }
}

fn random_movement_orders(
    board: &Board,
    faction: Faction,
    state: &BoardState,
    rng: &mut impl Rng,
) -> Vec<Order> {
    state
        .units_of(faction)
        .into_iter()
        .filter_map(|unit| movement::legal_orders(board, state, unit).choose(rng).copied())
        .collect()
}

fn random_retreat_orders(
    board: &Board,
    faction: Faction,
    state: &BoardState,
    rng: &mut impl Rng,
) -> Vec<Order> {
    board
        .ids()
        .filter(|id| matches!(state.dislodged[id.index()], Some(d) if d.faction == faction))
        .filter_map(|id| retreat::legal_retreats(board, state, id).choose(rng).copied())
        .collect()
}

fn random_build_orders(
    board: &Board,
    faction: Faction,
    state: &BoardState,
    rng: &mut impl Rng,
) -> Vec<Order> {
    let legal = build::legal_builds(board, state, faction);
    match adjustment(board, state, faction) {
        Adjustment::None => Vec::new(),
        Adjustment::Build(count) => random_build_choices(&legal, count, rng),
        Adjustment::Disband(count) => legal.choose_multiple(rng, count).copied().collect(),
    }
}

/// Picks `count` builds or waives, never two builds on one site.
fn random_build_choices(legal: &[Order], count: usize, rng: &mut impl Rng) -> Vec<Order> {
    let mut orders = Vec::with_capacity(count);
    let mut used: Vec<TerritoryId> = Vec::new();

    for _ in 0..count {
        let available: Vec<Order> = legal
            .iter()
            .copied()
            .filter(|o| match o {
                Order::Build { site } => !used.contains(site),
                _ => true,
            })
            .collect();
        let chosen = available.choose(rng).copied().unwrap_or(Order::Waive);
        if let Order::Build { site } = chosen {
            used.push(site);
        }
        orders.push(chosen);
    }

    orders
}
