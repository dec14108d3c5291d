//! Error taxonomy.
//!
//! Validation, ability, and state errors are non-fatal: they are reported
//! back per action and never abort the phase. [`InvariantViolation`] marks a
//! core bug and halts the current turn.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::graph::BoardError;
use crate::board::order::{Order, OrderKind};
use crate::board::state::{Phase, PhaseId};
use crate::board::territory::{Faction, TerritoryId};

/// Why a single order was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("unknown territory '{0}'")]
    UnknownTerritory(String),

    #[error("malformed order: {0}")]
    Malformed(String),

    #[error("no unit in the ordered territory")]
    NoUnit,

    #[error("unit belongs to {0}")]
    NotOwned(Faction),

    #[error("destination is not adjacent")]
    NotAdjacent,

    #[error("unit cannot move to its own territory")]
    MoveToSelf,

    #[error("supporting unit cannot reach the supported territory")]
    SupportUnreachable,

    #[error("no unit to support in the named territory")]
    SupportedUnitMissing,

    #[error("supported unit was not ordered as described")]
    SupportedOrderMismatch,

    #[error("a unit cannot support itself")]
    SelfSupport,

    #[error("unit already has an order this phase")]
    DuplicateOrder,

    #[error("unit is in a frozen territory and cannot move")]
    Frozen,

    #[error("{kind:?} orders are not allowed in the {phase:?} phase")]
    WrongPhase { kind: OrderKind, phase: Phase },

    #[error("unit is not dislodged")]
    NotDislodged,

    #[error("invalid retreat destination")]
    InvalidRetreat,

    #[error("invalid build site")]
    InvalidBuildSite,

    #[error("no builds or disbands owed")]
    NoAdjustment,

    #[error("more adjustments than owed")]
    ExcessAdjustment,
}

/// A dropped order with the faction that submitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub faction: Faction,
    /// The parsed order, if it got that far.
    pub order: Option<Order>,
    pub reason: RejectReason,
}

impl Rejection {
    pub fn new(faction: Faction, order: Option<Order>, reason: RejectReason) -> Self {
        Rejection {
            faction,
            order,
            reason,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.order {
            Some(order) => write!(f, "{} {:?}: {}", self.faction, order, self.reason),
            None => write!(f, "{}: {}", self.faction, self.reason),
        }
    }
}

/// Why an ability invocation was refused. Refusals consume nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbilityError {
    #[error("{0} has no invocable ability")]
    NotInvocable(Faction),

    #[error("{faction} cannot use {ability}")]
    WrongAbility {
        faction: Faction,
        ability: &'static str,
    },

    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: u32, available: u32 },

    #[error("no charges remaining")]
    ChargesExhausted,

    #[error("per-turn limit reached")]
    TurnLimitReached,

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("abilities can only be used in the orders phase, not {0:?}")]
    WrongPhase(Phase),
}

/// Alliance state-machine violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllianceError {
    #[error("a faction cannot ally with itself")]
    SameFaction,

    #[error("{0} is not an active faction")]
    Inactive(Faction),

    #[error("{0} and {1} already have a proposal or alliance")]
    AlreadyRelated(Faction, Faction),

    #[error("no pending proposal between {0} and {1}")]
    NoProposal(Faction, Faction),

    #[error("{0} cannot answer its own proposal")]
    OwnProposal(Faction),

    #[error("{0} and {1} are not allied")]
    NotAllied(Faction, Faction),

    #[error("{0} has reached its alliance limit")]
    LimitReached(Faction),
}

/// Actions that are well-formed but not allowed in the current game state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("submitted for {actual}, but the current phase is {expected}")]
    WrongPhase { expected: PhaseId, actual: PhaseId },

    #[error("unknown faction '{0}'")]
    UnknownFaction(String),

    #[error("{0} is not playing in this game")]
    NotInGame(Faction),

    #[error("{0} has been eliminated")]
    Eliminated(Faction),

    #[error("the game is over")]
    GameOver,

    #[error(transparent)]
    Alliance(#[from] AllianceError),
}

/// A broken core invariant. Never reachable through valid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("two units ended up in territory {0:?}")]
    DoubleOccupancy(TerritoryId),

    #[error("moving unit missing from territory {0:?}")]
    MissingUnit(TerritoryId),

    #[error("eliminated faction {faction} still has a unit in {territory:?}")]
    EliminatedUnit {
        faction: Faction,
        territory: TerritoryId,
    },

    #[error("territory {0:?} is owned but is not a supply center")]
    OwnershipOffSupply(TerritoryId),

    #[error("supply-center ownership changed outside fall or build")]
    SpringOwnershipChange,
}

/// Errors loading configuration or map data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("map parse error: {0}")]
    MapJson(#[from] serde_json::Error),

    #[error("invalid board: {0}")]
    Board(#[from] BoardError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Umbrella error for engine entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<AllianceError> for EngineError {
    fn from(e: AllianceError) -> Self {
        EngineError::State(StateError::Alliance(e))
    }
}

impl EngineError {
    /// True only for invariant violations, which halt the current turn.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Invariant(_))
    }
}
