//! Order types for all phases.
//!
//! Every order names its acting unit by the territory it occupies; a territory
//! holds at most one unit, so the territory is a unique handle. Support names
//! the supported unit by territory as well, plus the destination for a
//! supported move.

use serde::{Deserialize, Serialize};

use super::state::Phase;
use super::territory::TerritoryId;

/// Coarse order classification, used for validation and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Hold,
    Move,
    Support,
    Retreat,
    Disband,
    Build,
    Waive,
}

/// An order covering all three phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Order {
    /// Hold: `earth H`
    Hold { unit: TerritoryId },

    /// Move: `earth - vulcan`
    Move { unit: TerritoryId, dest: TerritoryId },

    /// Support hold: `andor S earth`
    SupportHold {
        unit: TerritoryId,
        supported: TerritoryId,
    },

    /// Support move: `andor S earth - vulcan`
    SupportMove {
        unit: TerritoryId,
        supported: TerritoryId,
        dest: TerritoryId,
    },

    /// Retreat: `earth R vulcan`
    Retreat { unit: TerritoryId, dest: TerritoryId },

    /// Disband: `earth D` (retreat or build phase)
    Disband { unit: TerritoryId },

    /// Build: `earth B`
    Build { site: TerritoryId },

    /// Waive: `W` (voluntarily skip one build)
    Waive,
}

impl Order {
    /// Returns the territory of the acting unit, or the build site.
    ///
    /// Waive has no territory.
    pub fn unit(&self) -> Option<TerritoryId> {
        match *self {
            Order::Hold { unit }
            | Order::Move { unit, .. }
            | Order::SupportHold { unit, .. }
            | Order::SupportMove { unit, .. }
            | Order::Retreat { unit, .. }
            | Order::Disband { unit } => Some(unit),
            Order::Build { site } => Some(site),
            Order::Waive => None,
        }
    }

    /// Every territory the order names.
    pub fn territories(&self) -> impl Iterator<Item = TerritoryId> {
        let (a, b, c) = match *self {
            Order::Hold { unit } | Order::Disband { unit } => (Some(unit), None, None),
            Order::Move { unit, dest } | Order::Retreat { unit, dest } => {
                (Some(unit), Some(dest), None)
            }
            Order::SupportHold { unit, supported } => (Some(unit), Some(supported), None),
            Order::SupportMove {
                unit,
                supported,
                dest,
            } => (Some(unit), Some(supported), Some(dest)),
            Order::Build { site } => (Some(site), None, None),
            Order::Waive => (None, None, None),
        };
        [a, b, c].into_iter().flatten()
    }

    /// Returns the destination of a move or retreat.
    pub fn dest(&self) -> Option<TerritoryId> {
        match *self {
            Order::Move { dest, .. } | Order::Retreat { dest, .. } => Some(dest),
            _ => None,
        }
    }

    pub fn kind(&self) -> OrderKind {
        match self {
            Order::Hold { .. } => OrderKind::Hold,
            Order::Move { .. } => OrderKind::Move,
            Order::SupportHold { .. } | Order::SupportMove { .. } => OrderKind::Support,
            Order::Retreat { .. } => OrderKind::Retreat,
            Order::Disband { .. } => OrderKind::Disband,
            Order::Build { .. } => OrderKind::Build,
            Order::Waive => OrderKind::Waive,
        }
    }

    /// Returns true if this order may be issued during `phase`.
    pub fn allowed_in(&self, phase: Phase) -> bool {
        match phase {
            Phase::Orders => matches!(
                self,
                Order::Hold { .. }
                    | Order::Move { .. }
                    | Order::SupportHold { .. }
                    | Order::SupportMove { .. }
            ),
            Phase::Retreat => matches!(self, Order::Retreat { .. } | Order::Disband { .. }),
            Phase::Build => matches!(
                self,
                Order::Build { .. } | Order::Disband { .. } | Order::Waive
            ),
        }
    }

    /// Returns true if `support` assists this order.
    ///
    /// A support-hold matches any non-moving order of the supported unit; a
    /// support-move matches only a move to the named destination.
    pub fn is_supported_by(&self, support: &Order) -> bool {
        match (*support, *self) {
            (Order::SupportHold { supported, .. }, order) => {
                order.unit() == Some(supported) && !matches!(order, Order::Move { .. })
            }
            (Order::SupportMove { supported, dest, .. }, Order::Move { unit, dest: d }) => {
                unit == supported && dest == d
            }
            _ => false,
        }
    }
}
