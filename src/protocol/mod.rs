//! External interface types.
//!
//! Order notation, the string-id submission format, JSON turn reports, and
//! the command parser for the line driver.

pub mod notation;
pub mod parser;
pub mod report;
pub mod submission;

pub use notation::{format_order, format_orders, parse_order, parse_orders, NotationError};
pub use parser::{parse_command, AbilityArgs, AllianceAction, Command, CommandError};
pub use report::{OutcomeReport, StatusReport, SubmissionSummary, TurnReport};
pub use submission::{OrderSubmission, OrderType};
