//! Faction abilities.
//!
//! Each faction owns exactly one [`Ability`]. An ability implements whichever
//! hooks it needs and leaves the rest as no-ops:
//!
//! - `invoke`: an explicit player action during the Orders phase, charged
//!   against the faction's [`AbilitySlot`] (and latinum, for the Ferengi).
//! - `filter_orders`: rewrites the combined order set when the phase closes.
//! - `modify_attack` / `modify_defense` / `modify_support`: strength hooks
//!   consulted by the adjudicator.
//! - `override_dislodgement`: may keep a unit in place after resolution.
//!
//! Abilities are stateless apart from configuration; budgets live in
//! [`AbilityBook`] and are owned by the game.

mod breen;
mod cardassian;
mod federation;
mod ferengi;
mod gorn;
mod klingon;
mod romulan;

pub use breen::Freeze;
pub use cardassian::Surveillance;
pub use federation::Immunity;
pub use ferengi::Commerce;
pub use gorn::Regeneration;
pub use klingon::Warrior;
pub use romulan::Intercept;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::{Board, BoardState, Faction, Order, TerritoryId, ALL_FACTIONS, FACTION_COUNT};
use crate::config::AbilityConfig;
use crate::economy::Ledger;
use crate::error::{AbilityError, Rejection};
use crate::resolve::{Dislodgement, StrengthHooks};

/// Where in the turn an ability acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    PreIntake,
    Visibility,
    Strength,
    PostResolution,
}

/// An explicit ability use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ability", rename_all = "snake_case")]
pub enum AbilityInvocation {
    /// Romulan: read every other faction's submitted orders.
    Intercept,
    /// Cardassian: read other factions' move destinations.
    Surveil,
    /// Ferengi: the target unit's order becomes Hold.
    Bribe { target: TerritoryId },
    /// Ferengi: the target unit's order becomes a move to `redirect`.
    Sabotage {
        target: TerritoryId,
        redirect: TerritoryId,
    },
    /// Breen: units in `territory` may not move this turn.
    Freeze { territory: TerritoryId },
}

impl AbilityInvocation {
    pub fn name(&self) -> &'static str {
        match self {
            AbilityInvocation::Intercept => "intercept",
            AbilityInvocation::Surveil => "surveil",
            AbilityInvocation::Bribe { .. } => "bribe",
            AbilityInvocation::Sabotage { .. } => "sabotage",
            AbilityInvocation::Freeze { .. } => "freeze",
        }
    }

    /// Territories the invocation targets.
    pub fn territories(&self) -> Vec<TerritoryId> {
        match *self {
            AbilityInvocation::Intercept | AbilityInvocation::Surveil => Vec::new(),
            AbilityInvocation::Bribe { target } => vec![target],
            AbilityInvocation::Sabotage { target, redirect } => vec![target, redirect],
            AbilityInvocation::Freeze { territory } => vec![territory],
        }
    }
}

/// Information revealed by a visibility ability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intel {
    /// Full orders, by faction.
    Orders { orders: Vec<(Faction, Order)> },
    /// Destinations of move orders only, by faction.
    MoveDestinations {
        destinations: Vec<(Faction, TerritoryId)>,
    },
}

/// The immediate result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AbilityOutcome {
    Intel { intel: Intel },
    /// Recorded; applied when the Orders phase closes.
    Queued { balance: Option<u32> },
}

/// Something an ability did to the turn, reported in the turn result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AbilityEvent {
    ImmunityUsed {
        territory: TerritoryId,
        charges_left: u32,
    },
    SurvivalRoll {
        territory: TerritoryId,
        survived: bool,
    },
    Bribed {
        target: TerritoryId,
        victim: Faction,
    },
    Sabotaged {
        target: TerritoryId,
        victim: Faction,
        redirect: TerritoryId,
    },
    MoveFrozen {
        territory: TerritoryId,
        victim: Faction,
    },
}

impl AbilityEvent {
    /// True if this event kept a unit from being dislodged.
    pub fn prevents_dislodgement(&self) -> bool {
        match self {
            AbilityEvent::ImmunityUsed { .. } => true,
            AbilityEvent::SurvivalRoll { survived, .. } => *survived,
            _ => false,
        }
    }
}

/// Usage budget for one faction's ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbilitySlot {
    /// Remaining uses for the whole game. None means unlimited.
    pub charges: Option<u32>,
    /// Uses allowed per turn. None means unlimited.
    pub per_turn: Option<u32>,
    pub used_this_turn: u32,
}

impl AbilitySlot {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_charges(charges: u32) -> Self {
        AbilitySlot {
            charges: Some(charges),
            ..Self::default()
        }
    }

    pub fn per_turn(limit: u32) -> Self {
        AbilitySlot {
            per_turn: Some(limit),
            ..Self::default()
        }
    }

    /// Checks that one more use is allowed without consuming anything.
    pub fn check(&self) -> Result<(), AbilityError> {
        if self.charges == Some(0) {
            return Err(AbilityError::ChargesExhausted);
        }
        if let Some(limit) = self.per_turn {
            if self.used_this_turn >= limit {
                return Err(AbilityError::TurnLimitReached);
            }
        }
        Ok(())
    }

    pub fn consume(&mut self) {
        if let Some(c) = self.charges.as_mut() {
            *c = c.saturating_sub(1);
        }
        self.used_this_turn += 1;
    }

    pub fn reset_turn(&mut self) {
        self.used_this_turn = 0;
    }
}

/// Actions recorded during the Orders phase, applied at close.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingActions {
    pub bribes: Vec<TerritoryId>,
    pub sabotages: Vec<(TerritoryId, TerritoryId)>,
    pub frozen: Vec<TerritoryId>,
}

impl PendingActions {
    /// True if a Ferengi action already targets this unit.
    pub fn targets(&self, unit: TerritoryId) -> bool {
        self.bribes.contains(&unit) || self.sabotages.iter().any(|(t, _)| *t == unit)
    }

    pub fn is_frozen(&self, territory: TerritoryId) -> bool {
        self.frozen.contains(&territory)
    }

    pub fn clear(&mut self) {
        self.bribes.clear();
        self.sabotages.clear();
        self.frozen.clear();
    }
}

/// Per-faction budgets plus pending actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityBook {
    slots: [AbilitySlot; FACTION_COUNT],
    pub pending: PendingActions,
}

impl AbilityBook {
    pub fn new(config: &AbilityConfig) -> Self {
        let mut slots = [AbilitySlot::unlimited(); FACTION_COUNT];
        for f in ALL_FACTIONS {
            slots[f.index()] = match f {
                Faction::Federation => {
                    AbilitySlot::with_charges(config.federation_immunity_charges)
                }
                Faction::Romulan | Faction::Cardassian => {
                    AbilitySlot::per_turn(config.intel_per_turn)
                }
                Faction::Ferengi => AbilitySlot::per_turn(config.ferengi_actions_per_turn),
                Faction::Breen => AbilitySlot::per_turn(config.freezes_per_turn),
                Faction::Klingon | Faction::Gorn => AbilitySlot::unlimited(),
            };
        }
        AbilityBook {
            slots,
            pending: PendingActions::default(),
        }
    }

    pub fn slot(&self, faction: Faction) -> &AbilitySlot {
        &self.slots[faction.index()]
    }

    pub fn slot_mut(&mut self, faction: Faction) -> &mut AbilitySlot {
        &mut self.slots[faction.index()]
    }

    /// Opens a new Orders phase: per-turn counters and pending actions reset.
    pub fn reset_turn(&mut self) {
        self.slots.iter_mut().for_each(AbilitySlot::reset_turn);
        self.pending.clear();
    }
}

/// Read-only view handed to ability hooks.
pub struct AbilityContext<'a> {
    pub board: &'a Board,
    pub state: &'a BoardState,
    /// Orders submitted so far this phase, all factions.
    pub submitted: &'a [(Order, Faction)],
}

/// Collected side effects of `filter_orders`.
#[derive(Debug, Default)]
pub struct FilterOutput {
    pub events: Vec<AbilityEvent>,
    pub rejections: Vec<Rejection>,
}

/// One faction's ability.
pub trait Ability: Send + Sync {
    fn faction(&self) -> Faction;

    fn name(&self) -> &'static str;

    fn hook(&self) -> HookPoint;

    /// True for abilities that take explicit invocations.
    fn is_invocable(&self) -> bool {
        false
    }

    /// Handles an explicit invocation. Must validate fully before charging
    /// `ledger` or recording in `pending`.
    fn invoke(
        &self,
        _invocation: &AbilityInvocation,
        _ctx: &AbilityContext<'_>,
        _ledger: &mut Ledger,
        _pending: &mut PendingActions,
    ) -> Result<AbilityOutcome, AbilityError> {
        Err(AbilityError::NotInvocable(self.faction()))
    }

    /// Rewrites the full order set at phase close. Every unit has exactly
    /// one order when this runs.
    fn filter_orders(
        &self,
        _ctx: &AbilityContext<'_>,
        _pending: &PendingActions,
        _orders: &mut [(Order, Faction)],
        _out: &mut FilterOutput,
    ) {
    }

    fn modify_attack(&self, base: i32) -> i32 {
        base
    }

    fn modify_defense(&self, base: i32) -> i32 {
        base
    }

    fn modify_support(&self, base: i32) -> i32 {
        base
    }

    /// Decides whether a dislodged unit of this faction stays in place.
    /// Returns None when the ability does not apply.
    fn override_dislodgement(
        &self,
        _dislodged: &Dislodgement,
        _slot: &mut AbilitySlot,
        _rng: &mut SmallRng,
    ) -> Option<AbilityEvent> {
        None
    }
}

/// Builds the ability for a faction.
pub fn for_faction(faction: Faction, config: &AbilityConfig) -> Box<dyn Ability> {
    match faction {
        Faction::Federation => Box::new(Immunity),
        Faction::Klingon => Box::new(Warrior),
        Faction::Romulan => Box::new(Intercept),
        Faction::Cardassian => Box::new(Surveillance),
        Faction::Ferengi => Box::new(Commerce),
        Faction::Breen => Box::new(Freeze),
        Faction::Gorn => Box::new(Regeneration::new(config.gorn_survival_probability)),
    }
}

/// All seven abilities, indexed by faction.
pub struct AbilityRegistry {
    abilities: Vec<Box<dyn Ability>>,
}

impl AbilityRegistry {
    pub fn new(config: &AbilityConfig) -> Self {
        AbilityRegistry {
            abilities: ALL_FACTIONS
                .iter()
                .map(|&f| for_faction(f, config))
                .collect(),
        }
    }

    pub fn get(&self, faction: Faction) -> &dyn Ability {
        self.abilities[faction.index()].as_ref()
    }

    /// Validates and records an invocation. Rejections consume nothing.
    pub fn invoke(
        &self,
        faction: Faction,
        invocation: &AbilityInvocation,
        ctx: &AbilityContext<'_>,
        book: &mut AbilityBook,
        ledger: &mut Ledger,
    ) -> Result<AbilityOutcome, AbilityError> {
        let ability = self.get(faction);
        if !ability.is_invocable() {
            return Err(AbilityError::NotInvocable(faction));
        }
        let unknown = invocation.territories().into_iter().find(|&t| !ctx.board.contains(t));
        if let Some(unknown) = unknown {
            return Err(AbilityError::InvalidTarget(format!("no territory #{}", unknown.0)));
        }
        book.slot(faction).check()?;
        let outcome = ability.invoke(invocation, ctx, ledger, &mut book.pending)?;
        book.slot_mut(faction).consume();
        info!(faction = %faction, ability = invocation.name(), "ability invoked");
        Ok(outcome)
    }

    /// Runs every faction's order filter in faction order.
    pub fn filter_orders(
        &self,
        ctx: &AbilityContext<'_>,
        pending: &PendingActions,
        orders: &mut [(Order, Faction)],
    ) -> FilterOutput {
        let mut out = FilterOutput::default();
        for ability in &self.abilities {
            ability.filter_orders(ctx, pending, orders, &mut out);
        }
        out
    }

    /// Offers a dislodged unit to its faction's override hook.
    pub fn override_dislodgement(
        &self,
        dislodged: &Dislodgement,
        book: &mut AbilityBook,
        rng: &mut SmallRng,
    ) -> Option<AbilityEvent> {
        let faction = dislodged.faction;
        let event = self
            .get(faction)
            .override_dislodgement(dislodged, book.slot_mut(faction), rng)?;
        info!(
            faction = %faction,
            territory = dislodged.territory.0,
            ?event,
            "post-resolution override"
        );
        Some(event)
    }
}

impl StrengthHooks for AbilityRegistry {
    fn attack(&self, faction: Faction, base: i32) -> i32 {
        self.get(faction).modify_attack(base)
    }

    fn defend(&self, faction: Faction, base: i32) -> i32 {
        self.get(faction).modify_defense(base)
    }

    fn support(&self, faction: Faction, base: i32) -> i32 {
        self.get(faction).modify_support(base)
    }
}

/// Replaces the order of the unit in `unit`, returning the previous order.
pub(crate) fn replace_order(
    orders: &mut [(Order, Faction)],
    unit: TerritoryId,
    with: Order,
) -> Option<(Order, Faction)> {
    let slot = orders.iter_mut().find(|(o, _)| o.unit() == Some(unit))?;
    let previous = *slot;
    slot.0 = with;
    Some(previous)
}
