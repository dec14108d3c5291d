//! Guess-and-check order adjudication.
//!
//! Every Orders-phase order is indexed by the territory of its unit. Each
//! order's success is decided lazily: when a dependency cycle is hit the
//! order in progress answers with its current guess (optimistically "succeeds"),
//! and the guess is re-checked once the dependent result is known.
//!
//! Strength arithmetic is routed through [`StrengthHooks`], so faction
//! abilities can adjust attack, defense and support values without the
//! resolver knowing about them. Post-resolution overrides (a unit surviving
//! a dislodgement) are applied by [`Resolver::resolve_with_overrides`], which
//! re-runs adjudication with the surviving territories fortified.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::board::order::Order;
use crate::board::state::{BoardState, DislodgedUnit as PendingRetreat};
use crate::board::territory::{Faction, TerritoryId};
use crate::error::InvariantViolation;

/// The outcome of one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderResult {
    /// Move arrived, or support was given.
    Succeeded,
    /// Move failed and the unit stayed in its origin.
    Bounced,
    /// Support did not count.
    Cut,
    /// The unit was forced out of its territory.
    Dislodged,
    /// Hold order for a unit that kept its territory.
    Held,
}

/// A resolved order paired with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOrder {
    pub order: Order,
    pub faction: Faction,
    pub result: OrderResult,
}

/// A unit dislodged during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dislodgement {
    pub faction: Faction,
    pub territory: TerritoryId,
    pub attacker_from: TerritoryId,
}

/// Full output of one adjudication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// One entry per input order, in input order.
    pub orders: Vec<ResolvedOrder>,
    pub dislodged: Vec<Dislodgement>,
    /// Territories contested by two or more moves where none arrived.
    pub standoffs: Vec<TerritoryId>,
}

impl Resolution {
    /// Returns the result for the order of the unit in `territory`.
    pub fn result_for(&self, territory: TerritoryId) -> Option<OrderResult> {
        self.orders
            .iter()
            .find(|r| r.order.unit() == Some(territory))
            .map(|r| r.result)
    }

    pub fn is_dislodged(&self, territory: TerritoryId) -> bool {
        self.dislodged.iter().any(|d| d.territory == territory)
    }
}

/// Strength modifiers consulted during adjudication.
///
/// `base` is the unmodified value. Results below zero are treated as zero.
pub trait StrengthHooks {
    /// Strength of a move by `faction` (attack and prevent).
    fn attack(&self, _faction: Faction, base: i32) -> i32 {
        base
    }

    /// Strength of a unit of `faction` staying in place.
    fn defend(&self, _faction: Faction, base: i32) -> i32 {
        base
    }

    /// Contribution of one uncut support given by `faction`.
    fn support(&self, _faction: Faction, base: i32) -> i32 {
        base
    }
}

/// Plain rules with no faction modifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModifiers;

impl StrengthHooks for NoModifiers {}

/// Resolution state for the guess-and-check algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResState {
    Unresolved,
    Guessing,
    Resolved,
}

/// Internal tracking for a single order during adjudication.
#[derive(Debug, Clone, Copy)]
struct AdjResult {
    order: Order,
    faction: Faction,
    state: ResState,
    resolution: bool,
    prov: u16,
    /// Move destination.
    target: u16,
    /// Support: territory of the supported unit.
    aux_loc: u16,
    /// Support-move: destination of the supported move. NONE for support-hold.
    aux_target: u16,
}

const NONE: u16 = u16::MAX;

/// Hold strength of a territory whose unit cannot be dislodged.
const FORTIFIED: i32 = i32::MAX;

#[derive(Clone, Copy)]
struct Env<'a> {
    state: &'a BoardState,
    hooks: &'a dyn StrengthHooks,
}

/// Reusable resolver that minimizes allocations across repeated calls.
///
/// The internal lookup table and buffers are reused; the returned
/// [`Resolution`] is freshly allocated each call.
pub struct Resolver {
    lookup: Vec<u16>,
    adj_buf: Vec<AdjResult>,
    fortified: Vec<bool>,
}

impl Resolver {
    /// Creates a new resolver with the given order capacity hint.
    pub fn new(capacity: usize) -> Self {
        Resolver {
            lookup: Vec::new(),
            adj_buf: Vec::with_capacity(capacity),
            fortified: Vec::new(),
        }
    }

    /// Resolves a set of Orders-phase orders against the position.
    pub fn resolve(
        &mut self,
        orders: &[(Order, Faction)],
        state: &BoardState,
        hooks: &dyn StrengthHooks,
    ) -> Resolution {
        self.resolve_with_fortified(orders, state, hooks, &[])
    }

    /// Resolves with the units in `fortified` treated as impossible to
    /// dislodge. Attacks on them bounce.
    pub fn resolve_with_fortified(
        &mut self,
        orders: &[(Order, Faction)],
        state: &BoardState,
        hooks: &dyn StrengthHooks,
        fortified: &[TerritoryId],
    ) -> Resolution {
        self.init(orders, state.units.len(), fortified);
        let env = Env { state, hooks };
        self.adjudicate_all(env);
        self.build_results(orders, state.units.len())
    }

    /// Resolves, then offers dislodged units to `survives` one at a time,
    /// lowest territory first. A saved unit is fortified and the whole set
    /// is re-adjudicated before the next offer, until no new unit is saved.
    /// `survives` is asked at most once per unit.
    ///
    /// Saves that the final position no longer needs are dropped, so the
    /// returned territories are exactly the units whose dislodgement was
    /// prevented.
    pub fn resolve_with_overrides<F>(
        &mut self,
        orders: &[(Order, Faction)],
        state: &BoardState,
        hooks: &dyn StrengthHooks,
        mut survives: F,
    ) -> (Resolution, Vec<TerritoryId>)
    where
        F: FnMut(&Dislodgement) -> bool,
    {
        let mut saved: Vec<TerritoryId> = Vec::new();
        let mut asked: Vec<TerritoryId> = Vec::new();

        let mut resolution = loop {
            let resolution = self.resolve_with_fortified(orders, state, hooks, &saved);
            let mut offers: Vec<&Dislodgement> = resolution
                .dislodged
                .iter()
                .filter(|d| !asked.contains(&d.territory))
                .collect();
            offers.sort_by_key(|d| d.territory);

            let mut changed = false;
            for d in offers {
                asked.push(d.territory);
                if survives(d) {
                    debug!(
                        territory = d.territory.0,
                        faction = %d.faction,
                        "dislodgement overridden"
                    );
                    saved.push(d.territory);
                    changed = true;
                    break;
                }
            }
            if !changed {
                break resolution;
            }
        };

        let mut i = 0;
        while i < saved.len() {
            let territory = saved[i];
            let without: Vec<TerritoryId> =
                saved.iter().copied().filter(|&t| t != territory).collect();
            if self
                .resolve_with_fortified(orders, state, hooks, &without)
                .is_dislodged(territory)
            {
                i += 1;
            } else {
                debug!(territory = territory.0, "override not needed");
                saved.remove(i);
                resolution = self.resolve_with_fortified(orders, state, hooks, &saved);
            }
        }
        (resolution, saved)
    }

    fn init(&mut self, orders: &[(Order, Faction)], territories: usize, fortified: &[TerritoryId]) {
        self.adj_buf.clear();
        self.lookup.clear();
        self.lookup.resize(territories, NONE);
        self.fortified.clear();
        self.fortified.resize(territories, false);
        for t in fortified {
            self.fortified[t.index()] = true;
        }

        for (i, (order, faction)) in orders.iter().enumerate() {
            let (prov, target, aux_loc, aux_target) = order_indices(order);

            self.adj_buf.push(AdjResult {
                order: *order,
                faction: *faction,
                state: ResState::Unresolved,
                resolution: false,
                prov,
                target,
                aux_loc,
                aux_target,
            });

            if prov != NONE && (prov as usize) < territories {
                self.lookup[prov as usize] = i as u16;
            }
        }
    }

    fn order_at(&self, prov: u16) -> Option<AdjResult> {
        if prov == NONE {
            return None;
        }
        match self.lookup.get(prov as usize) {
            Some(&idx) if idx != NONE => Some(self.adj_buf[idx as usize]),
            _ => None,
        }
    }

    fn adjudicate_all(&mut self, env: Env<'_>) {
        for i in 0..self.adj_buf.len() {
            let prov = self.adj_buf[i].prov;
            self.adjudicate(prov, env);
        }
    }

    /// Adjudicates the order at `prov`: on a dependency cycle, guess,
    /// check consistency, and re-resolve if the guess was wrong.
    fn adjudicate(&mut self, prov: u16, env: Env<'_>) -> bool {
        let idx = match self.lookup.get(prov as usize) {
            Some(&idx) if idx != NONE => idx as usize,
            _ => return false,
        };

        match self.adj_buf[idx].state {
            ResState::Resolved | ResState::Guessing => return self.adj_buf[idx].resolution,
            ResState::Unresolved => {}
        }

        self.adj_buf[idx].state = ResState::Guessing;
        self.adj_buf[idx].resolution = true;

        let result = self.resolve_order(idx, env);

        if self.adj_buf[idx].state == ResState::Guessing && result != self.adj_buf[idx].resolution {
            self.adj_buf[idx].resolution = result;
            let second = self.resolve_order(idx, env);
            self.adj_buf[idx].state = ResState::Resolved;
            self.adj_buf[idx].resolution = second;
            return second;
        }

        self.adj_buf[idx].state = ResState::Resolved;
        self.adj_buf[idx].resolution = result;
        result
    }

    fn resolve_order(&mut self, idx: usize, env: Env<'_>) -> bool {
        let prov = self.adj_buf[idx].prov;
        match self.adj_buf[idx].order {
            Order::Hold { .. } => true,
            Order::Move { .. } => self.resolve_move(prov, env),
            Order::SupportHold { .. } | Order::SupportMove { .. } => {
                self.resolve_support(prov, env)
            }
            _ => false,
        }
    }

    /// Determines if a move order succeeds.
    fn resolve_move(&mut self, prov: u16, env: Env<'_>) -> bool {
        let Some(ar) = self.order_at(prov) else {
            return false;
        };

        let attack = self.attack_strength(prov, env);
        let hold = self.hold_strength(ar.target, env);
        if attack <= hold {
            return false;
        }

        // Head-to-head: must also beat the opposing unit's own attack.
        if let Some(defender) = self.order_at(ar.target) {
            if matches!(defender.order, Order::Move { .. }) && defender.target == prov {
                let opposing = self.attack_strength(ar.target, env);
                if attack <= opposing {
                    return false;
                }
            }
        }

        for i in 0..self.adj_buf.len() {
            let other = self.adj_buf[i];
            if other.prov == prov {
                continue;
            }
            if matches!(other.order, Order::Move { .. }) && other.target == ar.target {
                let prevent = self.prevent_strength(other.prov, env);
                if attack <= prevent {
                    return false;
                }
            }
        }

        true
    }

    /// Determines if a support is given.
    ///
    /// A support is cut only by a successful move into the supporter's
    /// territory from a faction other than the supporter's and the
    /// supported unit's.
    fn resolve_support(&mut self, prov: u16, env: Env<'_>) -> bool {
        let Some(ar) = self.order_at(prov) else {
            return false;
        };
        let supported_faction = env.state.units.get(ar.aux_loc as usize).copied().flatten();

        for i in 0..self.adj_buf.len() {
            let other = self.adj_buf[i];
            if !matches!(other.order, Order::Move { .. }) || other.target != prov {
                continue;
            }
            if other.faction == ar.faction || Some(other.faction) == supported_faction {
                continue;
            }
            if self.adjudicate(other.prov, env) {
                return false;
            }
        }

        true
    }

    /// Sums uncut supports matching `(aux_loc, aux_target)`.
    fn support_total(&mut self, aux_loc: u16, aux_target: u16, hold: bool, env: Env<'_>) -> i32 {
        let mut total = 0;
        for i in 0..self.adj_buf.len() {
            let other = self.adj_buf[i];
            let kind_matches = if hold {
                matches!(other.order, Order::SupportHold { .. })
            } else {
                matches!(other.order, Order::SupportMove { .. })
            };
            if !kind_matches || other.aux_loc != aux_loc || other.aux_target != aux_target {
                continue;
            }
            if self.adjudicate(other.prov, env) {
                total += env.hooks.support(other.faction, 1).max(0);
            }
        }
        total
    }

    /// Computes the attack strength of a move order.
    fn attack_strength(&mut self, prov: u16, env: Env<'_>) -> i32 {
        let Some(ar) = self.order_at(prov) else {
            return 0;
        };
        if !matches!(ar.order, Order::Move { .. }) {
            return 0;
        }

        // A unit never dislodges a unit of its own faction: attacking an
        // own-occupied territory only counts if the occupant leaves.
        if env.state.units.get(ar.target as usize).copied().flatten() == Some(ar.faction) {
            match self.order_at(ar.target) {
                Some(occ) if matches!(occ.order, Order::Move { .. }) => {
                    if occ.target == prov || !self.adjudicate(ar.target, env) {
                        return 0;
                    }
                }
                _ => return 0,
            }
        }

        let base = 1 + self.support_total(prov, ar.target, false, env);
        env.hooks.attack(ar.faction, base).max(0)
    }

    /// Computes the hold strength of a territory.
    fn hold_strength(&mut self, territory: u16, env: Env<'_>) -> i32 {
        if territory == NONE {
            return 0;
        }
        let fortified = self.fortified.get(territory as usize).copied().unwrap_or(false);

        let Some(ar) = self.order_at(territory) else {
            // An unordered unit holds.
            return match env.state.units.get(territory as usize).copied().flatten() {
                Some(_) if fortified => FORTIFIED,
                Some(f) => env.hooks.defend(f, 1).max(0),
                None => 0,
            };
        };

        if matches!(ar.order, Order::Move { .. }) {
            if self.adjudicate(territory, env) {
                return 0;
            }
            if fortified {
                return FORTIFIED;
            }
            return env.hooks.defend(ar.faction, 1).max(0);
        }

        if fortified {
            return FORTIFIED;
        }

        let base = 1 + self.support_total(territory, NONE, true, env);
        env.hooks.defend(ar.faction, base).max(0)
    }

    /// Computes the prevent strength of a move order.
    fn prevent_strength(&mut self, prov: u16, env: Env<'_>) -> i32 {
        let Some(ar) = self.order_at(prov) else {
            return 0;
        };
        if !matches!(ar.order, Order::Move { .. }) {
            return 0;
        }

        // A unit that lost a head-to-head battle prevents nothing.
        if let Some(defender) = self.order_at(ar.target) {
            if matches!(defender.order, Order::Move { .. })
                && defender.target == prov
                && !self.adjudicate(prov, env)
            {
                return 0;
            }
        }

        let base = 1 + self.support_total(prov, ar.target, false, env);
        env.hooks.attack(ar.faction, base).max(0)
    }

    /// Converts internal adjudication state to the external result format.
    fn build_results(&self, orders: &[(Order, Faction)], territories: usize) -> Resolution {
        let mut results = Vec::with_capacity(orders.len());
        let mut dislodged = Vec::new();

        let mut arrived_from = vec![NONE; territories];
        let mut contested = vec![0u8; territories];
        for ar in &self.adj_buf {
            if !matches!(ar.order, Order::Move { .. }) || ar.target as usize >= territories {
                continue;
            }
            contested[ar.target as usize] = contested[ar.target as usize].saturating_add(1);
            if ar.resolution {
                arrived_from[ar.target as usize] = ar.prov;
            }
        }

        for (i, (order, faction)) in orders.iter().enumerate() {
            let ar = &self.adj_buf[i];

            let mut result = match ar.order {
                Order::Move { .. } if ar.resolution => OrderResult::Succeeded,
                Order::Move { .. } => OrderResult::Bounced,
                Order::SupportHold { .. } | Order::SupportMove { .. } if ar.resolution => {
                    OrderResult::Succeeded
                }
                Order::SupportHold { .. } | Order::SupportMove { .. } => OrderResult::Cut,
                _ => OrderResult::Held,
            };

            let attacker = arrived_from
                .get(ar.prov as usize)
                .copied()
                .unwrap_or(NONE);
            let moved_out = matches!(ar.order, Order::Move { .. }) && ar.resolution;
            if attacker != NONE && !moved_out {
                if result != OrderResult::Cut {
                    result = OrderResult::Dislodged;
                }
                dislodged.push(Dislodgement {
                    faction: *faction,
                    territory: TerritoryId(ar.prov),
                    attacker_from: TerritoryId(attacker),
                });
            }

            results.push(ResolvedOrder {
                order: *order,
                faction: *faction,
                result,
            });
        }

        let standoffs = (0..territories)
            .filter(|&t| contested[t] >= 2 && arrived_from[t] == NONE)
            .map(|t| TerritoryId(t as u16))
            .collect();

        Resolution {
            orders: results,
            dislodged,
            standoffs,
        }
    }
}

/// Applies a resolution to the position.
///
/// Dislodged units leave the board and are recorded for the retreat phase;
/// successful moves are then applied simultaneously. Standoff territories are
/// recorded. On an invariant violation `state` is left partially updated, so
/// callers apply to a scratch copy.
pub fn apply_resolution(
    state: &mut BoardState,
    resolution: &Resolution,
) -> Result<(), InvariantViolation> {
    state.dislodged.iter_mut().for_each(|d| *d = None);
    state.standoffs.iter_mut().for_each(|s| *s = false);

    for d in &resolution.dislodged {
        state.remove_unit(d.territory);
        state.set_dislodged(
            d.territory,
            PendingRetreat {
                faction: d.faction,
                attacker_from: d.attacker_from,
            },
        );
    }

    let mut arriving = Vec::new();
    for ro in &resolution.orders {
        if ro.result != OrderResult::Succeeded {
            continue;
        }
        if let Order::Move { unit, dest } = ro.order {
            match state.remove_unit(unit) {
                Some(faction) => arriving.push((dest, faction)),
                None => {
                    error!(territory = unit.0, "successful move has no unit");
                    return Err(InvariantViolation::MissingUnit(unit));
                }
            }
        }
    }
    for (dest, faction) in arriving {
        if !state.place_unit(dest, faction) {
            error!(territory = dest.0, "double occupancy after resolution");
            return Err(InvariantViolation::DoubleOccupancy(dest));
        }
    }

    for t in &resolution.standoffs {
        state.standoffs[t.index()] = true;
    }
    Ok(())
}

/// Extracts territory indices from an order for the lookup table.
fn order_indices(order: &Order) -> (u16, u16, u16, u16) {
    match *order {
        Order::Hold { unit } => (unit.0, NONE, NONE, NONE),
        Order::Move { unit, dest } => (unit.0, dest.0, NONE, NONE),
        Order::SupportHold { unit, supported } => (unit.0, NONE, supported.0, NONE),
        Order::SupportMove {
            unit,
            supported,
            dest,
        } => (unit.0, NONE, supported.0, dest.0),
        _ => (NONE, NONE, NONE, NONE),
    }
}

/// Convenience function that creates a resolver and resolves with no modifiers.
pub fn resolve_orders(orders: &[(Order, Faction)], state: &BoardState) -> Resolution {
    let mut resolver = Resolver::new(orders.len());
    resolver.resolve(orders, state, &NoModifiers)
}
