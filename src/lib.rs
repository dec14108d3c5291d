//! Quadrant adjudication engine library.
//!
//! Seven-faction galactic Diplomacy: the board model, order intake, faction
//! abilities, the adjudicator, economy, alliances, victory rules, and the
//! phase state machine that ties them together. The binaries and integration
//! tests drive everything through [`game::Game`] and [`session::TurnCoordinator`].

pub mod abilities;
pub mod alliance;
pub mod board;
pub mod config;
pub mod economy;
pub mod error;
pub mod game;
pub mod intake;
pub mod movegen;
pub mod protocol;
pub mod resolve;
pub mod session;
pub mod simulate;
pub mod victory;
