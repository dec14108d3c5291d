//! Wire form of order submissions.
//!
//! External callers name territories by their string ids. Each entry is
//! converted on its own, so one malformed entry does not void the rest.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Order, TerritoryId};
use crate::error::RejectReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Hold,
    Move,
    Support,
    Retreat,
    Disband,
    Build,
    Waive,
}

/// One order as submitted.
///
/// For a support, `supported` names the supported unit and `target` the
/// destination of the supported move; no `target` means a support to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported: Option<String>,
}

impl OrderSubmission {
    pub fn new(unit: &str, order_type: OrderType) -> Self {
        OrderSubmission {
            unit: Some(unit.to_string()),
            order_type,
            target: None,
            supported: None,
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_supported(mut self, supported: &str) -> Self {
        self.supported = Some(supported.to_string());
        self
    }

    /// Resolves territory names against `board`.
    pub fn to_order(&self, board: &Board) -> Result<Order, RejectReason> {
        let lookup = |field: &Option<String>, what: &str| -> Result<TerritoryId, RejectReason> {
            let name = field
                .as_deref()
                .ok_or_else(|| RejectReason::Malformed(format!("missing {what}")))?;
            board
                .lookup(name)
                .ok_or_else(|| RejectReason::UnknownTerritory(name.to_string()))
        };

        if self.order_type == OrderType::Waive {
            return Ok(Order::Waive);
        }
        let unit = lookup(&self.unit, "unit")?;
        Ok(match self.order_type {
            OrderType::Hold => Order::Hold { unit },
            OrderType::Move => Order::Move {
                unit,
                dest: lookup(&self.target, "target")?,
            },
            OrderType::Support => {
                let supported = lookup(&self.supported, "supported unit")?;
                match self.target {
                    Some(_) => Order::SupportMove {
                        unit,
                        supported,
                        dest: lookup(&self.target, "target")?,
                    },
                    None => Order::SupportHold { unit, supported },
                }
            }
            OrderType::Retreat => Order::Retreat {
                unit,
                dest: lookup(&self.target, "target")?,
            },
            OrderType::Disband => Order::Disband { unit },
            OrderType::Build => Order::Build { site: unit },
            OrderType::Waive => Order::Waive,
        })
    }

    /// Wire form of an order.
    pub fn from_order(board: &Board, order: &Order) -> Self {
        let name = |id: TerritoryId| Some(board.key(id).to_string());
        let (unit, order_type, target, supported) = match *order {
            Order::Hold { unit } => (name(unit), OrderType::Hold, None, None),
            Order::Move { unit, dest } => (name(unit), OrderType::Move, name(dest), None),
            Order::SupportHold { unit, supported } => {
                (name(unit), OrderType::Support, None, name(supported))
            }
            Order::SupportMove { unit, supported, dest } => {
                (name(unit), OrderType::Support, name(dest), name(supported))
            }
            Order::Retreat { unit, dest } => (name(unit), OrderType::Retreat, name(dest), None),
            Order::Disband { unit } => (name(unit), OrderType::Disband, None, None),
            Order::Build { site } => (name(site), OrderType::Build, None, None),
            Order::Waive => (None, OrderType::Waive, None, None),
        };
        OrderSubmission {
            unit,
            order_type,
            target,
            supported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::standard_board;

    #[test]
    fn json_wire_form() {
        let board = standard_board();
        let sub: OrderSubmission =
            serde_json::from_str(
                r#"{"unit":"andor","type":"support","supported":"earth","target":"vulcan"}"#,
            )
            .unwrap();
        let order = sub.to_order(&board).unwrap();
        assert_eq!(
            order,
            Order::SupportMove {
                unit: board.lookup("andor").unwrap(),
                supported: board.lookup("earth").unwrap(),
                dest: board.lookup("vulcan").unwrap(),
            }
        );
        assert_eq!(OrderSubmission::from_order(&board, &order), sub);
    }

    #[test]
    fn conversion_errors() {
        let board = standard_board();
        assert_eq!(
            OrderSubmission::new("pluto", OrderType::Hold).to_order(&board),
            Err(RejectReason::UnknownTerritory("pluto".into()))
        );
        assert!(matches!(
            OrderSubmission::new("earth", OrderType::Move).to_order(&board),
            Err(RejectReason::Malformed(_))
        ));
        let waive: OrderSubmission = serde_json::from_str(r#"{"type":"waive"}"#).unwrap();
        assert_eq!(waive.to_order(&board), Ok(Order::Waive));
    }
}
