//! Keeper Ledger — reconstructs per-player keep streaks from draft and
//! transaction history.
//!
//! The snapshot's newest season defines the rosters under analysis. Walking
//! backward season by season, a streak continues only while the same team
//! re-acquired the same player via a keeper designation without the player
//! clearing waivers in between.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::types::{
    EngineResult, KeeperStreak, LeagueHistory, LeagueRules, PlayerDraftRecord, TransactionKind,
    TransactionRecord,
};

/// Build a [`KeeperStreak`] for every player in the snapshot's current
/// season, deduplicated by player id.
pub fn build_streaks(
    history: &LeagueHistory,
    rules: &LeagueRules,
) -> EngineResult<Vec<KeeperStreak>> {
    rules.validate()?;

    let Some(current) = history.current_season() else {
        return Ok(Vec::new());
    };

    info!(
        season = current.season_year,
        players = current.picks.len(),
        seasons = history.seasons.len(),
        "Building keeper ledger"
    );

    let mut seen: HashSet<u64> = HashSet::new();
    let mut streaks = Vec::with_capacity(current.picks.len());

    for pick in &current.picks {
        if !seen.insert(pick.player_id) {
            continue;
        }
        streaks.push(analyze_player(pick, history, rules));
    }

    Ok(streaks)
}

fn analyze_player(
    current: &PlayerDraftRecord,
    history: &LeagueHistory,
    rules: &LeagueRules,
) -> KeeperStreak {
    let span = rules.go_back_years;

    // Per-season record lookups, newest first; index 0 is the current season
    let records: Vec<Option<&PlayerDraftRecord>> = (0..span)
        .map(|i| {
            history
                .seasons
                .get(i)
                .and_then(|s| s.picks.iter().find(|p| p.player_id == current.player_id))
        })
        .collect();

    let drafted_history: Vec<bool> = records.iter().map(|r| r.is_some()).collect();
    let kept_history: Vec<bool> = records
        .iter()
        .map(|r| r.map(|p| p.keeper).unwrap_or(false))
        .collect();

    let cleared_waivers: Vec<bool> = (0..span)
        .map(|i| {
            history
                .transactions
                .get(i)
                .map(|t| did_clear_waivers(&t.transactions, current.player_id, rules))
                .unwrap_or(false)
        })
        .collect();

    // Streak: consecutive seasons (newest first) the same team re-acquired
    // the player as a keeper without a waiver clear. Stops at the first
    // fresh draft, team change, waiver clear, or missing record.
    let mut streak = 0usize;
    for i in 0..span {
        let continued = records[i]
            .map(|r| r.keeper && r.owning_team_id == current.owning_team_id)
            .unwrap_or(false);
        if continued && !cleared_waivers[i] {
            streak += 1;
        } else {
            break;
        }
    }

    // The streak began the season of the first non-keeper acquisition. When
    // the streak extends past available history, the oldest known record's
    // cost is the best anchor we have.
    let original_draft_cost = records
        .get(streak)
        .and_then(|r| *r)
        .map(|r| r.draft_cost)
        .or_else(|| records.iter().rev().find_map(|r| r.map(|p| p.draft_cost)))
        .unwrap_or(0);

    let years_kept = (streak as u8).min(rules.max_keep_years);

    debug!(
        player = %current.player_name,
        years_kept,
        original_draft_cost,
        "Analyzed keeper streak"
    );

    KeeperStreak {
        player_id: current.player_id,
        player_name: current.player_name.clone(),
        owning_team_id: current.owning_team_id,
        position_id: current.position_id,
        years_kept,
        original_draft_cost,
        last_cost: records[0].map(|r| r.draft_cost),
        drafted_history,
        kept_history,
        cleared_waivers,
    }
}

/// A player cleared waivers in a season if they were added straight from
/// free agency, or re-added off waivers more than the drop-to-pickup window
/// after the preceding transaction.
fn did_clear_waivers(
    transactions: &[TransactionRecord],
    player_id: u64,
    rules: &LeagueRules,
) -> bool {
    let mut player_trans: Vec<&TransactionRecord> = transactions
        .iter()
        .filter(|t| t.player_id == player_id)
        .collect();
    // Newest first
    player_trans.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));

    for (i, trans) in player_trans.iter().enumerate() {
        match trans.kind {
            TransactionKind::Add => return true,
            TransactionKind::Waiver => {
                if let Some(prev) = player_trans.get(i + 1) {
                    if trans.timestamp_ms - prev.timestamp_ms > rules.drop_to_pickup_ms {
                        return true;
                    }
                }
            }
            TransactionKind::Drop | TransactionKind::Trade => {}
        }
    }

    false
}
