//! Order intake.
//!
//! One order slot per faction for the phase in progress. A submission is
//! validated order by order against the board and position; invalid orders are
//! dropped with a reason while the rest are kept. Resubmitting replaces the
//! faction's previous set wholesale.

use serde::{Deserialize, Serialize};

use crate::board::{
    Board, BoardState, Faction, Order, Phase, PhaseId, TerritoryId, ALL_FACTIONS, FACTION_COUNT,
};
use crate::error::{RejectReason, Rejection};
use crate::resolve::{adjustment, build_sites, retreat_destinations, Adjustment};

/// The outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub faction: Faction,
    pub phase: PhaseId,
    pub accepted: Vec<Order>,
    pub rejected: Vec<Rejection>,
}

impl SubmissionReport {
    pub fn fully_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Per-faction order mailboxes for the current phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntake {
    slots: [Option<Vec<Order>>; FACTION_COUNT],
}

impl OrderIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `orders` and stores the accepted ones as the faction's set,
    /// replacing anything submitted earlier this phase. An empty accepted set
    /// still counts as a submission.
    pub fn submit(
        &mut self,
        board: &Board,
        state: &BoardState,
        faction: Faction,
        orders: &[Order],
        frozen: &[TerritoryId],
    ) -> SubmissionReport {
        let mut accepted: Vec<Order> = Vec::with_capacity(orders.len());
        let mut rejected = Vec::new();
        let mut builds = 0usize;
        let mut disbands = 0usize;
        let owed = match state.phase {
            Phase::Build => adjustment(board, state, faction),
            _ => Adjustment::None,
        };

        for &order in orders {
            let mut verdict = validate_order(board, state, faction, &order, frozen);
            if verdict.is_ok() {
                if let Some(unit) = order.unit() {
                    if accepted.iter().any(|o| o.unit() == Some(unit)) {
                        verdict = Err(RejectReason::DuplicateOrder);
                    }
                }
            }
            if verdict.is_ok() && state.phase == Phase::Build {
                verdict = count_adjustment(owed, &order, &mut builds, &mut disbands);
            }
            match verdict {
                Ok(()) => accepted.push(order),
                Err(reason) => rejected.push(Rejection::new(faction, Some(order), reason)),
            }
        }

        self.slots[faction.index()] = Some(accepted.clone());
        SubmissionReport {
            faction,
            phase: state.phase_id(),
            accepted,
            rejected,
        }
    }

    pub fn has_submitted(&self, faction: Faction) -> bool {
        self.slots[faction.index()].is_some()
    }

    pub fn orders_of(&self, faction: Faction) -> Option<&[Order]> {
        self.slots[faction.index()].as_deref()
    }

    /// All stored orders, tagged with their faction, in faction order.
    pub fn combined(&self) -> Vec<(Order, Faction)> {
        ALL_FACTIONS
            .iter()
            .filter_map(|&f| self.slots[f.index()].as_ref().map(|os| (f, os)))
            .flat_map(|(f, os)| os.iter().map(move |&o| (o, f)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

fn count_adjustment(
    owed: Adjustment,
    order: &Order,
    builds: &mut usize,
    disbands: &mut usize,
) -> Result<(), RejectReason> {
    match (owed, order) {
        (Adjustment::Build(n), Order::Build { .. } | Order::Waive) => {
            if *builds >= n {
                return Err(RejectReason::ExcessAdjustment);
            }
            *builds += 1;
        }
        (Adjustment::Disband(n), Order::Disband { .. }) => {
            if *disbands >= n {
                return Err(RejectReason::ExcessAdjustment);
            }
            *disbands += 1;
        }
        _ => {}
    }
    Ok(())
}

/// Checks one order against the board and position.
///
/// Only structural legality is checked here. Whether a supported order is
/// actually given is settled when the phase closes, see [`match_supports`].
pub fn validate_order(
    board: &Board,
    state: &BoardState,
    faction: Faction,
    order: &Order,
    frozen: &[TerritoryId],
) -> Result<(), RejectReason> {
    if let Some(unknown) = order.territories().find(|&t| !board.contains(t)) {
        return Err(RejectReason::UnknownTerritory(format!("#{}", unknown.0)));
    }
    if !order.allowed_in(state.phase) {
        return Err(RejectReason::WrongPhase {
            kind: order.kind(),
            phase: state.phase,
        });
    }

    match state.phase {
        Phase::Orders => validate_movement(board, state, faction, order, frozen),
        Phase::Retreat => validate_retreat(board, state, faction, order),
        Phase::Build => validate_build(board, state, faction, order),
    }
}

fn owned_unit(state: &BoardState, faction: Faction, unit: TerritoryId) -> Result<(), RejectReason> {
    match state.unit_at(unit) {
        None => Err(RejectReason::NoUnit),
        Some(owner) if owner != faction => Err(RejectReason::NotOwned(owner)),
        Some(_) => Ok(()),
    }
}

fn validate_movement(
    board: &Board,
    state: &BoardState,
    faction: Faction,
    order: &Order,
    frozen: &[TerritoryId],
) -> Result<(), RejectReason> {
    match *order {
        Order::Hold { unit } => owned_unit(state, faction, unit),
        Order::Move { unit, dest } => {
            owned_unit(state, faction, unit)?;
            if unit == dest {
                return Err(RejectReason::MoveToSelf);
            }
            if !board.is_adjacent(unit, dest) {
                return Err(RejectReason::NotAdjacent);
            }
            if frozen.contains(&unit) {
                return Err(RejectReason::Frozen);
            }
            Ok(())
        }
        Order::SupportHold { unit, supported } => {
            owned_unit(state, faction, unit)?;
            if unit == supported {
                return Err(RejectReason::SelfSupport);
            }
            if state.unit_at(supported).is_none() {
                return Err(RejectReason::SupportedUnitMissing);
            }
            if !board.is_adjacent(unit, supported) {
                return Err(RejectReason::SupportUnreachable);
            }
            Ok(())
        }
        Order::SupportMove { unit, supported, dest } => {
            owned_unit(state, faction, unit)?;
            if unit == supported {
                return Err(RejectReason::SelfSupport);
            }
            if state.unit_at(supported).is_none() {
                return Err(RejectReason::SupportedUnitMissing);
            }
            if dest == unit
                || !board.is_adjacent(unit, dest)
                || !board.is_adjacent(supported, dest)
            {
                return Err(RejectReason::SupportUnreachable);
            }
            Ok(())
        }
        _ => Err(RejectReason::Malformed("not a movement order".into())),
    }
}

fn validate_retreat(
    board: &Board,
    state: &BoardState,
    faction: Faction,
    order: &Order,
) -> Result<(), RejectReason> {
    let unit = order
        .unit()
        .ok_or_else(|| RejectReason::Malformed("retreat without a unit".into()))?;
    match state.dislodged[unit.index()] {
        None => return Err(RejectReason::NotDislodged),
        Some(d) if d.faction != faction => return Err(RejectReason::NotOwned(d.faction)),
        Some(_) => {}
    }
    if let Order::Retreat { dest, .. } = *order {
        if !retreat_destinations(board, state, unit).contains(&dest) {
            return Err(RejectReason::InvalidRetreat);
        }
    }
    Ok(())
}

fn validate_build(
    board: &Board,
    state: &BoardState,
    faction: Faction,
    order: &Order,
) -> Result<(), RejectReason> {
    let owed = adjustment(board, state, faction);
    match (*order, owed) {
        (_, Adjustment::None) => Err(RejectReason::NoAdjustment),
        (Order::Build { site }, Adjustment::Build(_)) => {
            if build_sites(board, state, faction).contains(&site) {
                Ok(())
            } else {
                Err(RejectReason::InvalidBuildSite)
            }
        }
        (Order::Waive, Adjustment::Build(_)) => Ok(()),
        (Order::Disband { unit }, Adjustment::Disband(_)) => owned_unit(state, faction, unit),
        _ => Err(RejectReason::NoAdjustment),
    }
}

/// Gives every unit without an order an implicit Hold.
pub fn fill_implicit_holds(state: &BoardState, orders: &mut Vec<(Order, Faction)>) {
    let mut ordered = vec![false; state.units.len()];
    for (order, _) in orders.iter() {
        if let Some(unit) = order.unit() {
            ordered[unit.index()] = true;
        }
    }
    for unit in state.units() {
        if !ordered[unit.territory.index()] {
            orders.push((Order::Hold { unit: unit.territory }, unit.faction));
        }
    }
}

/// Turns supports whose supported order was not given into holds.
///
/// Expects every unit to carry exactly one order. Returns a rejection for
/// each converted support.
pub fn match_supports(orders: &mut [(Order, Faction)]) -> Vec<Rejection> {
    let mismatched: Vec<usize> = orders
        .iter()
        .enumerate()
        .filter(|(_, (order, _))| {
            matches!(order, Order::SupportHold { .. } | Order::SupportMove { .. })
        })
        .filter(|(_, (support, _))| !orders.iter().any(|(o, _)| o.is_supported_by(support)))
        .map(|(i, _)| i)
        .collect();

    mismatched
        .into_iter()
        .filter_map(|i| {
            let (support, faction) = orders[i];
            let unit = support.unit()?;
            orders[i].0 = Order::Hold { unit };
            Some(Rejection::new(faction, Some(support), RejectReason::SupportedOrderMismatch))
        })
        .collect()
}
