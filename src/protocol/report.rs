//! JSON-facing turn reports.
//!
//! [`TurnResult`] speaks in [`TerritoryId`]s, which mean nothing outside one
//! loaded board. The types here restate it with string territory ids, order
//! notation, and canonical edge ids for every move, ready for serialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityEvent, AbilityOutcome, Intel};
use crate::alliance::Relation;
use crate::board::{Board, BoardState, Faction, Order, OrderKind, TerritoryId};
use crate::error::Rejection;
use crate::game::{Game, GameStatus, TurnResult};
use crate::intake::SubmissionReport;
use crate::resolve::{Adjustment, OrderResult, ResolvedOrder};
use crate::victory::Victory;

use super::notation::format_order;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReport {
    pub faction: Faction,
    pub kind: OrderKind,
    pub order: String,
    /// Canonical id of the traversed edge, for moves and retreats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge: Option<String>,
    pub result: OrderResult,
}

impl OrderReport {
    pub fn new(board: &Board, resolved: &ResolvedOrder) -> Self {
        let edge = match resolved.order {
            Order::Move { unit, dest } | Order::Retreat { unit, dest } => {
                Some(board.canonical_edge_id(unit, dest))
            }
            _ => None,
        };
        OrderReport {
            faction: resolved.faction,
            kind: resolved.order.kind(),
            order: format_order(board, &resolved.order),
            edge,
            result: resolved.result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReport {
    pub faction: Faction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    pub reason: String,
}

impl RejectionReport {
    pub fn new(board: &Board, rejection: &Rejection) -> Self {
        RejectionReport {
            faction: rejection.faction,
            order: rejection.order.as_ref().map(|o| format_order(board, o)),
            reason: rejection.reason.to_string(),
        }
    }
}

/// [`AbilityEvent`] with string territory ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventReport {
    ImmunityUsed { territory: String, charges_left: u32 },
    SurvivalRoll { territory: String, survived: bool },
    Bribed { target: String, victim: Faction },
    Sabotaged { target: String, victim: Faction, redirect: String },
    MoveFrozen { territory: String, victim: Faction },
}

impl EventReport {
    pub fn new(board: &Board, event: &AbilityEvent) -> Self {
        let k = |id: TerritoryId| board.key(id).to_string();
        match *event {
            AbilityEvent::ImmunityUsed {
                territory,
                charges_left,
            } => EventReport::ImmunityUsed {
                territory: k(territory),
                charges_left,
            },
            AbilityEvent::SurvivalRoll { territory, survived } => EventReport::SurvivalRoll {
                territory: k(territory),
                survived,
            },
            AbilityEvent::Bribed { target, victim } => EventReport::Bribed {
                target: k(target),
                victim,
            },
            AbilityEvent::Sabotaged {
                target,
                victim,
                redirect,
            } => EventReport::Sabotaged {
                target: k(target),
                victim,
                redirect: k(redirect),
            },
            AbilityEvent::MoveFrozen { territory, victim } => EventReport::MoveFrozen {
                territory: k(territory),
                victim,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DislodgedReport {
    pub faction: Faction,
    pub territory: String,
    pub attacker_from: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetreatReport {
    pub faction: Faction,
    pub territory: String,
    pub destinations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentReport {
    pub faction: Faction,
    pub builds: usize,
    pub disbands: usize,
}

impl AdjustmentReport {
    fn new(faction: Faction, adjustment: Adjustment) -> Self {
        let (builds, disbands) = match adjustment {
            Adjustment::None => (0, 0),
            Adjustment::Build(n) => (n, 0),
            Adjustment::Disband(n) => (0, n),
        };
        AdjustmentReport {
            faction,
            builds,
            disbands,
        }
    }
}

/// Units and supply-center owners keyed by territory id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardReport {
    pub units: BTreeMap<String, Faction>,
    pub ownership: BTreeMap<String, Faction>,
}

impl BoardReport {
    pub fn new(board: &Board, state: &BoardState) -> Self {
        Self::from_parts(board, state.units().map(|u| (u.territory, u.faction)), &state.sc_owner)
    }

    fn from_parts(
        board: &Board,
        units: impl Iterator<Item = (TerritoryId, Faction)>,
        sc_owner: &[Option<Faction>],
    ) -> Self {
        let units = units.map(|(t, f)| (board.key(t).to_string(), f)).collect();
        let ownership = board
            .ids()
            .filter_map(|id| {
                sc_owner
                    .get(id.index())
                    .copied()
                    .flatten()
                    .map(|f| (board.key(id).to_string(), f))
            })
            .collect();
        BoardReport { units, ownership }
    }
}

/// The intake verdict for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub faction: Faction,
    pub phase: String,
    pub accepted: Vec<String>,
    pub rejected: Vec<RejectionReport>,
}

impl SubmissionSummary {
    pub fn new(board: &Board, report: &SubmissionReport) -> Self {
        SubmissionSummary {
            faction: report.faction,
            phase: report.phase.to_string(),
            accepted: report.accepted.iter().map(|o| format_order(board, o)).collect(),
            rejected: report.rejected.iter().map(|r| RejectionReport::new(board, r)).collect(),
        }
    }
}

/// [`AbilityOutcome`] with orders in notation and string territory ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeReport {
    Orders { orders: Vec<(Faction, String)> },
    MoveDestinations { destinations: Vec<(Faction, String)> },
    Queued {
        #[serde(skip_serializing_if = "Option::is_none")]
        balance: Option<u32>,
    },
}

impl OutcomeReport {
    pub fn new(board: &Board, outcome: &AbilityOutcome) -> Self {
        match outcome {
            AbilityOutcome::Intel {
                intel: Intel::Orders { orders },
            } => OutcomeReport::Orders {
                orders: orders.iter().map(|(f, o)| (*f, format_order(board, o))).collect(),
            },
            AbilityOutcome::Intel {
                intel: Intel::MoveDestinations { destinations },
            } => OutcomeReport::MoveDestinations {
                destinations: destinations
                    .iter()
                    .map(|&(f, t)| (f, board.key(t).to_string()))
                    .collect(),
            },
            AbilityOutcome::Queued { balance } => OutcomeReport::Queued { balance: *balance },
        }
    }
}

/// A resolved phase, addressed by string ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub phase: String,
    pub orders: Vec<OrderReport>,
    pub rejections: Vec<RejectionReport>,
    pub ability_events: Vec<EventReport>,
    pub dislodged: Vec<DislodgedReport>,
    pub standoffs: Vec<String>,
    pub retreats: Vec<RetreatReport>,
    pub adjustments: Vec<AdjustmentReport>,
    pub ownership_changes: Vec<String>,
    pub board: BoardReport,
    pub eliminated: Vec<Faction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victory: Option<Victory>,
    pub status: GameStatus,
}

impl TurnReport {
    pub fn new(board: &Board, result: &TurnResult) -> Self {
        let keys = |ids: &[TerritoryId]| {
            ids.iter()
                .map(|&id| board.key(id).to_string())
                .collect::<Vec<_>>()
        };
        TurnReport {
            phase: result.phase.to_string(),
            orders: result.orders.iter().map(|r| OrderReport::new(board, r)).collect(),
            rejections: result.rejections.iter().map(|r| RejectionReport::new(board, r)).collect(),
            ability_events: result
                .ability_events
                .iter()
                .map(|e| EventReport::new(board, e))
                .collect(),
            dislodged: result
                .dislodged
                .iter()
                .map(|d| DislodgedReport {
                    faction: d.faction,
                    territory: board.key(d.territory).to_string(),
                    attacker_from: board.key(d.attacker_from).to_string(),
                })
                .collect(),
            standoffs: keys(&result.standoffs),
            retreats: result
                .retreats
                .iter()
                .map(|r| RetreatReport {
                    faction: r.faction,
                    territory: board.key(r.territory).to_string(),
                    destinations: keys(&r.destinations),
                })
                .collect(),
            adjustments: result
                .adjustments
                .iter()
                .map(|&(f, a)| AdjustmentReport::new(f, a))
                .collect(),
            ownership_changes: keys(&result.ownership_changes),
            board: BoardReport::from_parts(
                board,
                result.units.iter().map(|u| (u.territory, u.faction)),
                &result.sc_owner,
            ),
            eliminated: result.eliminated.clone(),
            income: result.income,
            victory: result.victory,
            status: result.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceReport {
    pub a: Faction,
    pub b: Faction,
    pub relation: Relation,
}

/// A snapshot of the game between resolutions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: GameStatus,
    pub players: Vec<Faction>,
    pub eliminated: Vec<Faction>,
    pub pending: Vec<Faction>,
    pub latinum: u32,
    pub alliances: Vec<AllianceReport>,
    pub board: BoardReport,
}

impl StatusReport {
    pub fn new(game: &Game) -> Self {
        let state = game.state();
        StatusReport {
            status: game.status(),
            players: state.players.clone(),
            eliminated: state.eliminated.clone(),
            pending: game.pending_factions(),
            latinum: state.ledger.balance(),
            alliances: state
                .alliances
                .relations()
                .iter()
                .map(|r| AllianceReport {
                    a: r.a,
                    b: r.b,
                    relation: r.relation,
                })
                .collect(),
            board: BoardReport::new(game.board(), game.position()),
        }
    }
}
