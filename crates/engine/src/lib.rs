//! Keeper Discover Engine — keeper-league analytics
//!
//! Self-contained crate with the four analytic subsystems plus the ESPN
//! fetch client:
//! - Keeper Ledger — reconstructs per-player keep streaks from draft history
//! - Eligibility & Cost Calculator — escalating keeper pricing
//! - Position Rank Engine — within-position performance ranks
//! - What-If Scenario Generator — power-set exploration of keeper selections
//! - OIWP Calculator — all-play win percentage and schedule luck
//!
//! Every subsystem is a pure function over an immutable per-season snapshot;
//! all I/O lives in [`api`].

pub mod api;
pub mod keeper;
pub mod ledger;
pub mod oiwp;
pub mod positions;
pub mod ranking;
pub mod types;
pub mod whatif;

// Re-exports for convenience
pub use api::EspnClient;
pub use keeper::{evaluate_all, evaluate_streak};
pub use ledger::build_streaks;
pub use oiwp::calculate_oiwp;
pub use positions::position_name;
pub use ranking::{rank_positions, rank_positions_with};
pub use types::*;
pub use whatif::{enumerate_scenarios, ScenarioIter};
