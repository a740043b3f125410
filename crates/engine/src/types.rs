//! Types for the keeper-league analytics engine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sortable stand-in cost for players who can no longer be kept.
///
/// Internally an ineligible player carries `next_cost: None`; this sentinel
/// only appears where a consumer needs a total numeric order (sortable
/// tables, CSV export). It must compare greater than any real keeper cost.
pub const INELIGIBLE_COST_SENTINEL: u32 = 999;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid league rules: {0}")]
    InvalidRules(String),

    #[error("Invalid what-if config: {0}")]
    InvalidWhatIfConfig(String),

    #[error("Too many what-if candidates ({count}); pre-filter to a shortlist of at most 63")]
    TooManyCandidates { count: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;

// ---------------------------------------------------------------------------
// League rules configuration
// ---------------------------------------------------------------------------

/// League keeper rules, threaded explicitly into every subsystem call so one
/// process can serve multiple leagues without cross-contamination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueRules {
    /// Maximum consecutive seasons a player may be kept
    pub max_keep_years: u8,
    /// Keep-year index → dollar increment over the original draft cost
    pub increments: BTreeMap<u8, u32>,
    /// Seasons of history to reconstruct (current season included)
    pub go_back_years: usize,
    /// Drop-to-pickup window in milliseconds; a waiver add after a longer
    /// gap counts as clearing waivers and breaks keeper continuity
    pub drop_to_pickup_ms: i64,
    /// Default auction budget
    pub budget: i64,
    /// Default roster size
    pub roster_size: i64,
}

impl Default for LeagueRules {
    fn default() -> Self {
        Self {
            max_keep_years: 3,
            increments: BTreeMap::from([(1, 5), (2, 10), (3, 15)]),
            go_back_years: 3,
            drop_to_pickup_ms: chrono::Duration::days(7).num_milliseconds(),
            budget: 200,
            roster_size: 15,
        }
    }
}

impl LeagueRules {
    /// Fail fast on a configuration that would make downstream math nonsense.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_keep_years == 0 {
            return Err(EngineError::InvalidRules(
                "max_keep_years must be at least 1".into(),
            ));
        }
        if self.increments.is_empty() {
            return Err(EngineError::InvalidRules(
                "increment table must not be empty".into(),
            ));
        }
        if self.go_back_years == 0 {
            return Err(EngineError::InvalidRules(
                "go_back_years must be at least 1".into(),
            ));
        }
        if self.budget < 0 {
            return Err(EngineError::InvalidRules("budget must not be negative".into()));
        }
        if self.roster_size < 1 {
            return Err(EngineError::InvalidRules(
                "roster_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Increment for keeping a player into keep-year `year` (1-based).
    /// Past the end of the table the final (`max_keep_years`) increment applies.
    pub fn increment_for(&self, year: u8) -> u32 {
        if let Some(&inc) = self.increments.get(&year) {
            return inc;
        }
        if let Some(&inc) = self.increments.get(&self.max_keep_years) {
            return inc;
        }
        // Table is non-empty after validate(); fall back to its last entry
        self.increments.values().next_back().copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Snapshot inputs (supplied by the fetch collaborator)
// ---------------------------------------------------------------------------

/// One draft (or synthetic waiver-acquisition) record per player per season.
/// `draft_cost` is the amount paid the season the player was acquired; a $0
/// waiver pickup is represented as a $0 record with `keeper = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDraftRecord {
    pub player_id: u64,
    pub player_name: String,
    pub position_id: u32,
    pub owning_team_id: u32,
    pub draft_cost: u32,
    pub season_year: u16,
    /// True when this acquisition was a keeper designation rather than a
    /// fresh draft/waiver pickup
    pub keeper: bool,
}

/// League transaction kinds relevant to keeper continuity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Add,
    Drop,
    Waiver,
    Trade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub player_id: u64,
    pub kind: TransactionKind,
    /// Epoch milliseconds, as reported by the league API
    pub timestamp_ms: i64,
}

/// Draft records for one season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonDraft {
    pub season_year: u16,
    pub picks: Vec<PlayerDraftRecord>,
}

/// Transactions for one season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonTransactions {
    pub season_year: u16,
    pub transactions: Vec<TransactionRecord>,
}

/// Immutable multi-season snapshot, newest season first.
/// `seasons[0]` is the current season and defines the rosters under analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueHistory {
    pub seasons: Vec<SeasonDraft>,
    pub transactions: Vec<SeasonTransactions>,
}

impl LeagueHistory {
    pub fn current_season(&self) -> Option<&SeasonDraft> {
        self.seasons.first()
    }
}

/// Season-cumulative scoring for one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSeasonStat {
    pub player_id: u64,
    pub player_name: String,
    pub position_id: u32,
    pub total_points: f64,
}

/// One team-week of head-to-head scoring. Every matchup produces two
/// mirrored rows, one per side. `points_for == 0` marks an unplayed week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamWeekScore {
    pub team_id: u32,
    pub week: u32,
    pub points_for: f64,
    pub opponent_id: u32,
    pub opponent_points: f64,
}

// ---------------------------------------------------------------------------
// Derived outputs
// ---------------------------------------------------------------------------

/// Reconstructed keep streak for one rostered player.
/// The three history vectors run newest season first, `go_back_years` long.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperStreak {
    pub player_id: u64,
    pub player_name: String,
    pub owning_team_id: u32,
    pub position_id: u32,
    /// Consecutive seasons already kept, capped at `max_keep_years`
    pub years_kept: u8,
    /// Cost recorded the season the streak began; re-keeping never resets it
    pub original_draft_cost: u32,
    /// Cost recorded in the current season, if the player was drafted
    pub last_cost: Option<u32>,
    pub drafted_history: Vec<bool>,
    pub kept_history: Vec<bool>,
    pub cleared_waivers: Vec<bool>,
}

/// Keeper eligibility and next-season cost for one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperEligibility {
    pub player_id: u64,
    pub player_name: String,
    pub team_id: u32,
    pub position_id: u32,
    pub years_kept: u8,
    pub years_remaining: u8,
    pub eligible: bool,
    /// Next-season keeper cost; `None` iff ineligible
    pub next_cost: Option<u32>,
    pub last_cost: Option<u32>,
}

impl KeeperEligibility {
    /// Numeric cost for total-order contexts: real cost for eligible
    /// players, [`INELIGIBLE_COST_SENTINEL`] otherwise (sorts last).
    pub fn sortable_cost(&self) -> u32 {
        self.next_cost.unwrap_or(INELIGIBLE_COST_SENTINEL)
    }
}

/// Within-position performance rank; `None` when the player has no positive
/// season total and is excluded from ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRank {
    pub player_id: u64,
    pub position_id: u32,
    pub rank: Option<u32>,
}

/// One keeper the what-if generator may select
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperCandidate {
    pub player_id: u64,
    pub cost: u32,
}

/// Budget/roster configuration for what-if exploration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WhatIfConfig {
    pub budget: i64,
    pub roster_size: i64,
}

impl Default for WhatIfConfig {
    fn default() -> Self {
        Self {
            budget: 200,
            roster_size: 15,
        }
    }
}

impl WhatIfConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.budget < 0 {
            return Err(EngineError::InvalidWhatIfConfig(
                "budget must not be negative".into(),
            ));
        }
        if self.roster_size < 1 {
            return Err(EngineError::InvalidWhatIfConfig(
                "roster_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// One explored keeper selection with its affordability metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfScenario {
    pub selected_player_ids: Vec<u64>,
    pub total_cost: i64,
    pub remaining_budget: i64,
    pub remaining_roster_spots: i64,
    /// Largest single additional bid affordable while reserving $1 per
    /// remaining open roster spot
    pub max_single_bid: i64,
    /// Selection uses more roster spots than exist
    pub roster_exceeded: bool,
    /// Remaining budget cannot cover $1 per remaining open spot
    pub budget_crisis: bool,
}

/// All-play results for one team-season. Percentage fields are `None` for a
/// team with zero played weeks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OiwpResult {
    pub team_id: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub actual_win_pct: Option<f64>,
    pub oiwp: Option<f64>,
    /// `actual_win_pct - oiwp`; sums to zero across the league
    pub luck: Option<f64>,
    /// Wins an OIWP-average schedule would have produced
    pub predicted_wins: Option<u32>,
    /// Actual wins minus predicted wins; positive means a soft schedule
    pub schedule_wins: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        assert!(LeagueRules::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let mut rules = LeagueRules::default();
        rules.roster_size = 0;
        assert!(matches!(
            rules.validate(),
            Err(EngineError::InvalidRules(_))
        ));

        let mut rules = LeagueRules::default();
        rules.budget = -1;
        assert!(rules.validate().is_err());

        let mut rules = LeagueRules::default();
        rules.increments.clear();
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_increment_past_table_uses_final_year() {
        let rules = LeagueRules::default();
        assert_eq!(rules.increment_for(1), 5);
        assert_eq!(rules.increment_for(2), 10);
        assert_eq!(rules.increment_for(3), 15);
        // Beyond the defined range the max_keep_years increment applies
        assert_eq!(rules.increment_for(4), 15);
    }

    #[test]
    fn test_sentinel_sorts_after_real_costs() {
        let eligible = KeeperEligibility {
            player_id: 1,
            player_name: "A".into(),
            team_id: 1,
            position_id: 2,
            years_kept: 0,
            years_remaining: 3,
            eligible: true,
            next_cost: Some(205),
            last_cost: Some(200),
        };
        let ineligible = KeeperEligibility {
            player_id: 2,
            player_name: "B".into(),
            team_id: 1,
            position_id: 2,
            years_kept: 3,
            years_remaining: 0,
            eligible: false,
            next_cost: None,
            last_cost: Some(40),
        };
        assert!(ineligible.sortable_cost() > eligible.sortable_cost());
        assert_eq!(ineligible.sortable_cost(), INELIGIBLE_COST_SENTINEL);
    }

    #[test]
    fn test_whatif_config_validation() {
        assert!(WhatIfConfig::default().validate().is_ok());
        assert!(WhatIfConfig {
            budget: -5,
            roster_size: 15
        }
        .validate()
        .is_err());
        assert!(WhatIfConfig {
            budget: 200,
            roster_size: 0
        }
        .validate()
        .is_err());
    }
}
