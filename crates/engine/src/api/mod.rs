//! League data API clients

pub mod espn;

pub use espn::{EspnClient, LeagueTeam};
