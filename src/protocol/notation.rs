//! Text notation for orders.
//!
//! Territories are written by their map id. Forms:
//!
//! | order         | notation                  |
//! |---------------|---------------------------|
//! | hold          | `earth H`                 |
//! | move          | `earth - vulcan`          |
//! | support hold  | `andor S earth`           |
//! | support move  | `andor S earth - vulcan`  |
//! | retreat       | `earth R vulcan`          |
//! | disband       | `earth D`                 |
//! | build         | `earth B`                 |
//! | waive         | `W`                       |
//!
//! Lists are separated by `;`.

use thiserror::Error;

use crate::board::{Board, Order, TerritoryId};

/// Errors that can occur when parsing order notation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("empty input")]
    EmptyInput,

    #[error("unknown territory '{0}'")]
    UnknownTerritory(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(&'static str),

    #[error("unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: &'static str, found: String },
}

fn territory(board: &Board, tokens: &[&str], pos: usize) -> Result<TerritoryId, NotationError> {
    let token = tokens.get(pos).ok_or(NotationError::UnexpectedEnd("territory"))?;
    board
        .lookup(token)
        .ok_or_else(|| NotationError::UnknownTerritory((*token).to_string()))
}

fn expect_end(tokens: &[&str], pos: usize) -> Result<(), NotationError> {
    match tokens.get(pos) {
        None => Ok(()),
        Some(extra) => Err(NotationError::UnexpectedToken {
            expected: "end of order",
            found: (*extra).to_string(),
        }),
    }
}

/// Parses a single order.
pub fn parse_order(board: &Board, s: &str) -> Result<Order, NotationError> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(NotationError::EmptyInput);
    }
    if tokens[0].eq_ignore_ascii_case("W") {
        expect_end(&tokens, 1)?;
        return Ok(Order::Waive);
    }

    let unit = territory(board, &tokens, 0)?;
    let action = tokens.get(1).ok_or(NotationError::UnexpectedEnd("action (H, -, S, R, D, B)"))?;

    let (order, consumed) = match action.to_ascii_uppercase().as_str() {
        "H" => (Order::Hold { unit }, 2),
        "-" => (
            Order::Move {
                unit,
                dest: territory(board, &tokens, 2)?,
            },
            3,
        ),
        "S" => {
            let supported = territory(board, &tokens, 2)?;
            match tokens.get(3).copied() {
                None => (Order::SupportHold { unit, supported }, 3),
                Some(t) if t.eq_ignore_ascii_case("H") => {
                    (Order::SupportHold { unit, supported }, 4)
                }
                Some("-") => (
                    Order::SupportMove {
                        unit,
                        supported,
                        dest: territory(board, &tokens, 4)?,
                    },
                    5,
                ),
                Some(other) => {
                    return Err(NotationError::UnexpectedToken {
                        expected: "H or -",
                        found: other.to_string(),
                    })
                }
            }
        }
        "R" => (
            Order::Retreat {
                unit,
                dest: territory(board, &tokens, 2)?,
            },
            3,
        ),
        "D" => (Order::Disband { unit }, 2),
        "B" => (Order::Build { site: unit }, 2),
        _ => return Err(NotationError::UnknownAction((*action).to_string())),
    };
    expect_end(&tokens, consumed)?;
    Ok(order)
}

/// Parses a `;`-separated list. Empty entries are skipped.
pub fn parse_orders(board: &Board, s: &str) -> Result<Vec<Order>, NotationError> {
    s.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_order(board, part))
        .collect()
}

/// Formats an order in canonical notation.
pub fn format_order(board: &Board, order: &Order) -> String {
    let k = |id: TerritoryId| board.key(id);
    match *order {
        Order::Hold { unit } => format!("{} H", k(unit)),
        Order::Move { unit, dest } => format!("{} - {}", k(unit), k(dest)),
        Order::SupportHold { unit, supported } => format!("{} S {}", k(unit), k(supported)),
        Order::SupportMove { unit, supported, dest } => {
            format!("{} S {} - {}", k(unit), k(supported), k(dest))
        }
        Order::Retreat { unit, dest } => format!("{} R {}", k(unit), k(dest)),
        Order::Disband { unit } => format!("{} D", k(unit)),
        Order::Build { site } => format!("{} B", k(site)),
        Order::Waive => "W".to_string(),
    }
}

/// Formats a list of orders separated by ` ; `.
pub fn format_orders(board: &Board, orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format_order(board, o))
        .collect::<Vec<_>>()
        .join(" ; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::standard_board;

    #[test]
    fn parses_every_form() {
        let board = standard_board();
        let t = |k: &str| board.lookup(k).unwrap();
        let cases = [
            ("earth H", Order::Hold { unit: t("earth") }),
            (
                "earth - vulcan",
                Order::Move {
                    unit: t("earth"),
                    dest: t("vulcan"),
                },
            ),
            (
                "andor S earth",
                Order::SupportHold {
                    unit: t("andor"),
                    supported: t("earth"),
                },
            ),
            (
                "andor S earth - vulcan",
                Order::SupportMove {
                    unit: t("andor"),
                    supported: t("earth"),
                    dest: t("vulcan"),
                },
            ),
            (
                "earth R vega",
                Order::Retreat {
                    unit: t("earth"),
                    dest: t("vega"),
                },
            ),
            ("earth D", Order::Disband { unit: t("earth") }),
            ("earth B", Order::Build { site: t("earth") }),
            ("W", Order::Waive),
        ];
        for (text, order) in cases {
            assert_eq!(parse_order(&board, text), Ok(order), "{text}");
            assert_eq!(format_order(&board, &order), text);
        }
    }

    #[test]
    fn support_hold_accepts_trailing_h() {
        let board = standard_board();
        assert_eq!(
            parse_order(&board, "andor S earth H"),
            parse_order(&board, "andor S earth")
        );
    }

    #[test]
    fn errors() {
        let board = standard_board();
        assert_eq!(parse_order(&board, "  "), Err(NotationError::EmptyInput));
        assert_eq!(
            parse_order(&board, "pluto H"),
            Err(NotationError::UnknownTerritory("pluto".into()))
        );
        assert_eq!(
            parse_order(&board, "earth X"),
            Err(NotationError::UnknownAction("X".into()))
        );
        assert_eq!(
            parse_order(&board, "earth -"),
            Err(NotationError::UnexpectedEnd("territory"))
        );
        assert!(matches!(
            parse_order(&board, "earth H now"),
            Err(NotationError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn order_lists() {
        let board = standard_board();
        let orders = parse_orders(&board, "earth H ; vulcan - rigel;andor S earth").unwrap();
        assert_eq!(orders.len(), 3);
        assert_eq!(
            format_orders(&board, &orders),
            "earth H ; vulcan - rigel ; andor S earth"
        );
        assert!(parse_orders(&board, "").unwrap().is_empty());
    }
}
