//! Eligibility & Cost Calculator — keeper eligibility flags and escalating
//! next-season costs.
//!
//! Pricing is additive from the original draft cost: cheap waiver finds stay
//! cheap to keep while expensive stars grow progressively more expensive.

use tracing::debug;

use crate::types::{EngineResult, KeeperEligibility, KeeperStreak, LeagueRules};

/// Evaluate a single reconstructed streak against the league rules.
pub fn evaluate_streak(streak: &KeeperStreak, rules: &LeagueRules) -> KeeperEligibility {
    let years_remaining = rules.max_keep_years.saturating_sub(streak.years_kept);
    let eligible = streak.years_kept < rules.max_keep_years;

    // Cost for keeping into NEXT season, hence years_kept + 1
    let next_cost = eligible.then(|| {
        let increment = rules.increment_for(streak.years_kept + 1);
        streak.original_draft_cost + increment
    });

    debug!(
        player = %streak.player_name,
        years_kept = streak.years_kept,
        eligible,
        next_cost = ?next_cost,
        "Evaluated keeper eligibility"
    );

    KeeperEligibility {
        player_id: streak.player_id,
        player_name: streak.player_name.clone(),
        team_id: streak.owning_team_id,
        position_id: streak.position_id,
        years_kept: streak.years_kept,
        years_remaining,
        eligible,
        next_cost,
        last_cost: streak.last_cost,
    }
}

/// Evaluate a whole ledger. Fails fast on invalid rules before touching any
/// streak.
pub fn evaluate_all(
    streaks: &[KeeperStreak],
    rules: &LeagueRules,
) -> EngineResult<Vec<KeeperEligibility>> {
    rules.validate()?;
    Ok(streaks.iter().map(|s| evaluate_streak(s, rules)).collect())
}
