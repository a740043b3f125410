//! OIWP Calculator — opponent-independent winning percentage.
//!
//! OIWP is a team's win rate had it faced every other team each week
//! instead of only its scheduled opponent; the gap to the actual win
//! percentage is schedule luck. Tied scores award half a win to each side,
//! in both the head-to-head and the all-play tally, which keeps league-wide
//! luck zero-sum by construction.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::types::{OiwpResult, TeamWeekScore};

/// Per-team accumulator across the season
#[derive(Debug, Default)]
struct TeamTally {
    wins: u32,
    losses: u32,
    ties: u32,
    all_play_wins: f64,
    all_play_possible: f64,
}

/// Compute one [`OiwpResult`] per team from a season of mirrored matchup
/// rows, sorted by OIWP descending. Weeks where a team scored zero are
/// treated as unplayed and excluded everywhere.
pub fn calculate_oiwp(scores: &[TeamWeekScore]) -> Vec<OiwpResult> {
    let teams: BTreeSet<u32> = scores.iter().map(|s| s.team_id).collect();
    let mut tallies: BTreeMap<u32, TeamTally> = teams
        .iter()
        .map(|&id| (id, TeamTally::default()))
        .collect();

    // Head-to-head record over played weeks
    let mut counted: BTreeSet<(u32, u32)> = BTreeSet::new();
    for row in scores {
        if row.points_for <= 0.0 || !counted.insert((row.team_id, row.week)) {
            continue;
        }
        let tally = tallies.get_mut(&row.team_id).expect("team registered");
        if row.points_for > row.opponent_points {
            tally.wins += 1;
        } else if row.points_for < row.opponent_points {
            tally.losses += 1;
        } else {
            tally.ties += 1;
        }
    }

    // All-play: per week, each participant against every other participant
    let mut week_scores: BTreeMap<u32, BTreeMap<u32, f64>> = BTreeMap::new();
    for row in scores {
        if row.points_for > 0.0 {
            week_scores
                .entry(row.week)
                .or_default()
                .entry(row.team_id)
                .or_insert(row.points_for);
        }
    }

    for participants in week_scores.values() {
        let opponents = participants.len().saturating_sub(1) as f64;
        for (&team_id, &points) in participants {
            let mut wins = 0.0;
            for (&other_id, &other_points) in participants {
                if other_id == team_id {
                    continue;
                }
                if points > other_points {
                    wins += 1.0;
                } else if points == other_points {
                    wins += 0.5;
                }
            }
            let tally = tallies.get_mut(&team_id).expect("team registered");
            tally.all_play_wins += wins;
            tally.all_play_possible += opponents;
        }
    }

    let mut results: Vec<OiwpResult> = tallies
        .into_iter()
        .map(|(team_id, tally)| finalize(team_id, &tally))
        .collect();

    // OIWP descending, unplayed teams last, ties by team id
    results.sort_by(|a, b| {
        b.oiwp
            .unwrap_or(-1.0)
            .partial_cmp(&a.oiwp.unwrap_or(-1.0))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.team_id.cmp(&b.team_id))
    });

    info!(
        teams = results.len(),
        weeks = week_scores.len(),
        "OIWP calculated"
    );
    validate_results(&results);

    results
}

fn finalize(team_id: u32, tally: &TeamTally) -> OiwpResult {
    let games = tally.wins + tally.losses + tally.ties;

    let actual_win_pct = (games > 0)
        .then(|| (tally.wins as f64 + 0.5 * tally.ties as f64) / games as f64);

    let oiwp = (tally.all_play_possible > 0.0)
        .then(|| tally.all_play_wins / tally.all_play_possible);

    let luck = match (actual_win_pct, oiwp) {
        (Some(wp), Some(oi)) => Some(wp - oi),
        _ => None,
    };

    let predicted_wins = oiwp.map(|oi| (oi * games as f64).round() as u32);
    let schedule_wins = predicted_wins.map(|p| tally.wins as i64 - p as i64);

    OiwpResult {
        team_id,
        wins: tally.wins,
        losses: tally.losses,
        ties: tally.ties,
        actual_win_pct,
        oiwp,
        luck,
        predicted_wins,
        schedule_wins,
    }
}

/// Sanity checks mirroring the zero-sum construction; data-quality problems
/// surface as warnings, never as faults.
fn validate_results(results: &[OiwpResult]) {
    let played: Vec<&OiwpResult> = results.iter().filter(|r| r.luck.is_some()).collect();
    if played.is_empty() {
        return;
    }

    for r in &played {
        for (label, value) in [("wp", r.actual_win_pct), ("oiwp", r.oiwp)] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    warn!(team_id = r.team_id, metric = label, value = v, "Value out of [0, 1]");
                }
            }
        }
    }

    let luck_sum: f64 = played.iter().filter_map(|r| r.luck).sum();
    if luck_sum.abs() > 0.01 * played.len() as f64 {
        warn!(luck_sum, "League luck does not sum to zero; check input data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(team_id: u32, week: u32, pf: f64, opp: u32, pa: f64) -> TeamWeekScore {
        TeamWeekScore {
            team_id,
            week,
            points_for: pf,
            opponent_id: opp,
            opponent_points: pa,
        }
    }

    /// Both mirrored rows for one matchup
    fn matchup(week: u32, a: u32, pa: f64, b: u32, pb: f64) -> Vec<TeamWeekScore> {
        vec![row(a, week, pa, b, pb), row(b, week, pb, a, pa)]
    }

    fn find(results: &[OiwpResult], team_id: u32) -> &OiwpResult {
        results.iter().find(|r| r.team_id == team_id).unwrap()
    }

    #[test]
    fn test_three_team_week_all_play_counts() {
        // A:100 beats 1 of 2, B:90 beats 0, C:110 beats 2
        let mut rows = matchup(1, 1, 100.0, 2, 90.0);
        rows.extend(matchup(1, 3, 110.0, 4, 0.0));

        let results = calculate_oiwp(&rows);
        // Team 4 never played; three participants that week
        let a = find(&results, 1);
        assert_eq!(a.oiwp, Some(0.5));
        let c = find(&results, 3);
        assert_eq!(c.oiwp, Some(1.0));
        let b = find(&results, 2);
        assert_eq!(b.oiwp, Some(0.0));
        for r in &results {
            if let Some(oi) = r.oiwp {
                assert!((0.0..=1.0).contains(&oi));
            }
        }
    }

    #[test]
    fn test_luck_sums_to_zero() {
        let mut rows = Vec::new();
        // Four teams, three full weeks with varied outcomes
        for (week, (s1, s2, s3, s4)) in [
            (1, (101.0, 88.0, 95.0, 120.0)),
            (2, (87.0, 92.0, 130.0, 76.0)),
            (3, (99.0, 99.5, 85.0, 110.0)),
        ] {
            rows.extend(matchup(week, 1, s1, 2, s2));
            rows.extend(matchup(week, 3, s3, 4, s4));
        }

        let results = calculate_oiwp(&rows);
        let luck_sum: f64 = results.iter().filter_map(|r| r.luck).sum();
        assert!(luck_sum.abs() < 1e-9);
    }

    #[test]
    fn test_tied_week_splits_all_play_win() {
        let rows = matchup(1, 1, 100.0, 2, 100.0);
        let results = calculate_oiwp(&rows);

        for team in [1, 2] {
            let r = find(&results, team);
            assert_eq!(r.ties, 1);
            assert_eq!(r.actual_win_pct, Some(0.5));
            assert_eq!(r.oiwp, Some(0.5));
            assert_eq!(r.luck, Some(0.0));
        }
    }

    #[test]
    fn test_zero_score_week_excluded() {
        let mut rows = matchup(1, 1, 100.0, 2, 90.0);
        // Week 2 not yet played: both sides at zero
        rows.extend(matchup(2, 1, 0.0, 2, 0.0));

        let results = calculate_oiwp(&rows);
        let a = find(&results, 1);
        assert_eq!(a.wins, 1);
        assert_eq!(a.losses, 0);
        assert_eq!(a.actual_win_pct, Some(1.0));
        assert_eq!(a.oiwp, Some(1.0));
    }

    #[test]
    fn test_team_with_no_played_weeks_reports_null() {
        let mut rows = matchup(1, 1, 100.0, 2, 90.0);
        rows.push(row(3, 1, 0.0, 4, 0.0));
        rows.push(row(4, 1, 0.0, 3, 0.0));

        let results = calculate_oiwp(&rows);
        let idle = find(&results, 3);
        assert_eq!(idle.actual_win_pct, None);
        assert_eq!(idle.oiwp, None);
        assert_eq!(idle.luck, None);
        assert_eq!(idle.predicted_wins, None);
        // Unplayed teams sort after everyone with an OIWP
        assert!(results.last().unwrap().oiwp.is_none());
    }

    #[test]
    fn test_schedule_wins_reflect_matchup_luck() {
        // Team 1 always second-best but scheduled against the weakest team
        let mut rows = Vec::new();
        for week in 1..=4 {
            rows.extend(matchup(week, 1, 100.0, 2, 80.0));
            rows.extend(matchup(week, 3, 110.0, 4, 105.0));
        }

        let results = calculate_oiwp(&rows);
        let lucky = find(&results, 1);
        // 4-0 actual, but all-play only beats 1 of 3 opponents weekly
        assert_eq!(lucky.wins, 4);
        let oiwp = lucky.oiwp.unwrap();
        assert!((oiwp - (1.0 / 3.0)).abs() < 1e-9);
        assert!(lucky.luck.unwrap() > 0.0);
        assert_eq!(lucky.predicted_wins, Some(1));
        assert_eq!(lucky.schedule_wins, Some(3));
    }

    #[test]
    fn test_results_sorted_by_oiwp_descending() {
        let mut rows = Vec::new();
        for week in 1..=2 {
            rows.extend(matchup(week, 1, 80.0, 2, 120.0));
            rows.extend(matchup(week, 3, 100.0, 4, 90.0));
        }

        let results = calculate_oiwp(&rows);
        let oiwps: Vec<f64> = results.iter().filter_map(|r| r.oiwp).collect();
        for pair in oiwps.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert_eq!(results[0].team_id, 2);
    }

    #[test]
    fn test_duplicate_rows_counted_once() {
        let mut rows = matchup(1, 1, 100.0, 2, 90.0);
        rows.extend(matchup(1, 1, 100.0, 2, 90.0));

        let results = calculate_oiwp(&rows);
        let a = find(&results, 1);
        assert_eq!(a.wins, 1);
        assert_eq!(a.oiwp, Some(1.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(calculate_oiwp(&[]).is_empty());
    }
}
