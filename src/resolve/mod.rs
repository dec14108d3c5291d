//! Order resolution.
//!
//! Resolves a set of simultaneous orders into outcomes using guess-and-check
//! adjudication, then handles the retreat and build phases that follow.

pub mod adjudicator;
pub mod build;
pub mod phase;
pub mod retreat;

pub use adjudicator::{
    apply_resolution, resolve_orders, Dislodgement, NoModifiers, OrderResult, Resolution,
    ResolvedOrder, Resolver, StrengthHooks,
};
pub use build::{
    adjustment, adjustments, apply_builds, build_sites, needs_build_phase, resolve_builds,
    Adjustment, BuildResult,
};
pub use phase::{advance_state, next_phase, update_sc_ownership};
pub use retreat::{apply_retreats, resolve_retreats, retreat_destinations, RetreatResult};
