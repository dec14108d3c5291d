//! Line command parser.
//!
//! Parses the driver's text commands into structured [`Command`] values. The
//! parser knows nothing about the loaded board: territory ids stay as
//! strings here and are resolved by the caller against its board.

use thiserror::Error;

use crate::abilities::AbilityInvocation;
use crate::board::{Board, Faction};

use super::notation::NotationError;

/// Errors produced while reading a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unknown faction '{0}'")]
    UnknownFaction(String),

    #[error("unknown ability '{0}'")]
    UnknownAbility(String),

    #[error("unknown alliance action '{0}'")]
    UnknownAllianceAction(String),

    #[error("malformed {command}: expected '{usage}'")]
    Usage { command: &'static str, usage: &'static str },
}

/// An ability use as typed, before territory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbilityArgs {
    Intercept,
    Surveil,
    Bribe { target: String },
    Sabotage { target: String, redirect: String },
    Freeze { territory: String },
}

impl AbilityArgs {
    /// Resolves territory ids against `board`.
    pub fn to_invocation(&self, board: &Board) -> Result<AbilityInvocation, NotationError> {
        let t = |key: &str| {
            board
                .lookup(key)
                .ok_or_else(|| NotationError::UnknownTerritory(key.to_string()))
        };
        Ok(match self {
            AbilityArgs::Intercept => AbilityInvocation::Intercept,
            AbilityArgs::Surveil => AbilityInvocation::Surveil,
            AbilityArgs::Bribe { target } => AbilityInvocation::Bribe { target: t(target)? },
            AbilityArgs::Sabotage { target, redirect } => AbilityInvocation::Sabotage {
                target: t(target)?,
                redirect: t(redirect)?,
            },
            AbilityArgs::Freeze { territory } => AbilityInvocation::Freeze {
                territory: t(territory)?,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllianceAction {
    Propose,
    Accept,
    Reject,
    Break,
}

impl AllianceAction {
    pub fn name(self) -> &'static str {
        match self {
            AllianceAction::Propose => "propose",
            AllianceAction::Accept => "accept",
            AllianceAction::Reject => "reject",
            AllianceAction::Break => "break",
        }
    }
}

/// A parsed driver command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new game. No factions means all seven.
    NewGame { factions: Vec<Faction> },

    /// Replace a faction's order set for the current phase, in order notation.
    Orders { faction: Faction, orders: String },

    Ability { faction: Faction, args: AbilityArgs },

    /// `actor` performs `action` toward `other`. For accept and reject,
    /// `other` is the proposer.
    Ally {
        action: AllianceAction,
        actor: Faction,
        other: Faction,
    },

    /// Close the current phase.
    Resolve,

    Status,

    Quit,
}

/// Parses a single line.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let command = match tokens[0] {
        "quit" => Command::Quit,
        "resolve" => Command::Resolve,
        "status" => Command::Status,

        "newgame" => parse_newgame(&tokens)?,
        "orders" => parse_orders(&tokens, trimmed)?,
        "ability" => parse_ability(&tokens)?,
        "ally" => parse_ally(&tokens)?,

        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn faction(token: &str) -> Result<Faction, CommandError> {
    Faction::from_name(token).ok_or_else(|| CommandError::UnknownFaction(token.to_string()))
}

/// Parses `newgame [faction...]`.
fn parse_newgame(tokens: &[&str]) -> Result<Command, CommandError> {
    let factions = tokens[1..].iter().map(|t| faction(t)).collect::<Result<Vec<_>, _>>()?;
    Ok(Command::NewGame { factions })
}

/// Parses `orders <faction> [o1 ; o2 ...]`. An empty list is a valid submission.
fn parse_orders(tokens: &[&str], full_line: &str) -> Result<Command, CommandError> {
    let Some(name) = tokens.get(1) else {
        return Err(CommandError::Usage {
            command: "orders",
            usage: "orders <faction> <order ; order ...>",
        });
    };
    let faction = faction(name)?;
    // Everything after the faction name, verbatim.
    let orders = full_line
        .strip_prefix("orders")
        .map(str::trim_start)
        .and_then(|rest| rest.get(name.len()..))
        .unwrap_or("")
        .trim()
        .to_string();
    Ok(Command::Orders { faction, orders })
}

/// Parses `ability <faction> <intercept|surveil|bribe t|sabotage t r|freeze t>`.
fn parse_ability(tokens: &[&str]) -> Result<Command, CommandError> {
    let usage = CommandError::Usage {
        command: "ability",
        usage: "ability <faction> <name> [territory...]",
    };
    if tokens.len() < 3 {
        return Err(usage);
    }
    let faction = faction(tokens[1])?;
    let arg = |i: usize| tokens[i].to_string();

    let args = match (tokens[2], tokens.len()) {
        ("intercept", 3) => AbilityArgs::Intercept,
        ("surveil", 3) => AbilityArgs::Surveil,
        ("bribe", 4) => AbilityArgs::Bribe {
            target: arg(3),
        },
        ("sabotage", 5) => AbilityArgs::Sabotage {
            target: arg(3),
            redirect: arg(4),
        },
        ("freeze", 4) => AbilityArgs::Freeze {
            territory: arg(3),
        },
        ("intercept" | "surveil" | "bribe" | "sabotage" | "freeze", _) => return Err(usage),
        (other, _) => return Err(CommandError::UnknownAbility(other.to_string())),
    };
    Ok(Command::Ability { faction, args })
}

/// Parses `ally <propose|accept|reject|break> <actor> <other>`.
fn parse_ally(tokens: &[&str]) -> Result<Command, CommandError> {
    if tokens.len() != 4 {
        return Err(CommandError::Usage {
            command: "ally",
            usage: "ally <propose|accept|reject|break> <faction> <faction>",
        });
    }
    let action = match tokens[1] {
        "propose" => AllianceAction::Propose,
        "accept" => AllianceAction::Accept,
        "reject" => AllianceAction::Reject,
        "break" => AllianceAction::Break,
        other => return Err(CommandError::UnknownAllianceAction(other.to_string())),
    };
    Ok(Command::Ally {
        action,
        actor: faction(tokens[2])?,
        other: faction(tokens[3])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::standard_board;

    fn parse(line: &str) -> Command {
        parse_command(line).unwrap().unwrap()
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse("quit"), Command::Quit);
        assert_eq!(parse("resolve"), Command::Resolve);
        assert_eq!(parse("  status  "), Command::Status);
    }

    #[test]
    fn blank_lines_and_comments() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("\t "), Ok(None));
        assert_eq!(parse_command("# spring 2370"), Ok(None));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("go movetime 5000"),
            Err(CommandError::UnknownCommand("go".into()))
        );
    }

    #[test]
    fn newgame_with_and_without_factions() {
        assert_eq!(parse("newgame"), Command::NewGame { factions: vec![] });
        assert_eq!(
            parse("newgame federation Klingon gorn"),
            Command::NewGame {
                factions: vec![Faction::Federation, Faction::Klingon, Faction::Gorn]
            }
        );
        assert_eq!(
            parse_command("newgame vulcans"),
            Err(CommandError::UnknownFaction("vulcans".into()))
        );
    }

    #[test]
    fn orders_keep_the_notation_verbatim() {
        assert_eq!(
            parse("orders federation earth - vega ; andor S earth - vega ; vulcan H"),
            Command::Orders {
                faction: Faction::Federation,
                orders: "earth - vega ; andor S earth - vega ; vulcan H".into()
            }
        );
        assert_eq!(
            parse("orders gorn"),
            Command::Orders {
                faction: Faction::Gorn,
                orders: String::new()
            }
        );
        assert!(matches!(parse_command("orders"), Err(CommandError::Usage { .. })));
    }

    #[test]
    fn ability_forms() {
        assert_eq!(
            parse("ability romulan intercept"),
            Command::Ability {
                faction: Faction::Romulan,
                args: AbilityArgs::Intercept
            }
        );
        assert_eq!(
            parse("ability ferengi sabotage qonos mutara"),
            Command::Ability {
                faction: Faction::Ferengi,
                args: AbilityArgs::Sabotage {
                    target: "qonos".into(),
                    redirect: "mutara".into()
                }
            }
        );
        assert!(matches!(
            parse_command("ability ferengi bribe"),
            Err(CommandError::Usage { .. })
        ));
        assert_eq!(
            parse_command("ability gorn roar"),
            Err(CommandError::UnknownAbility("roar".into()))
        );
    }

    #[test]
    fn ability_args_resolve_against_board() {
        let board = standard_board();
        let args = AbilityArgs::Freeze {
            territory: "galorndon".into(),
        };
        assert_eq!(
            args.to_invocation(&board),
            Ok(AbilityInvocation::Freeze {
                territory: board.lookup("galorndon").unwrap()
            })
        );
        let bad = AbilityArgs::Bribe { target: "pluto".into() };
        assert_eq!(
            bad.to_invocation(&board),
            Err(NotationError::UnknownTerritory("pluto".into()))
        );
    }

    #[test]
    fn ally_forms() {
        assert_eq!(
            parse("ally accept klingon federation"),
            Command::Ally {
                action: AllianceAction::Accept,
                actor: Faction::Klingon,
                other: Faction::Federation
            }
        );
        assert_eq!(
            parse_command("ally betray klingon federation"),
            Err(CommandError::UnknownAllianceAction("betray".into()))
        );
        assert!(matches!(parse_command("ally break klingon"), Err(CommandError::Usage { .. })));
    }
}
