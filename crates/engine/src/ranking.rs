//! Position Rank Engine — within-position performance ranks from season
//! point totals.
//!
//! Grouping and ordering are explicit: players are bucketed by position,
//! sorted by total points descending, and assigned ranks `1..=k`. Players
//! without a positive season total get no rank.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{PlayerSeasonStat, PositionRank};

/// Rank with the documented tie-break convention: equal point totals order
/// by ascending player id.
pub fn rank_positions(stats: &[PlayerSeasonStat]) -> Vec<PositionRank> {
    rank_positions_with(stats, |p| p.player_id)
}

/// Rank with a caller-supplied secondary sort key for exact-tie ordering.
pub fn rank_positions_with<K, F>(stats: &[PlayerSeasonStat], tie_break: F) -> Vec<PositionRank>
where
    K: Ord,
    F: Fn(&PlayerSeasonStat) -> K,
{
    // Explicit grouping: position id → players with a rankable total
    let mut groups: BTreeMap<u32, Vec<&PlayerSeasonStat>> = BTreeMap::new();
    for stat in stats {
        if stat.total_points.is_finite() && stat.total_points > 0.0 {
            groups.entry(stat.position_id).or_default().push(stat);
        }
    }

    let mut ranks: BTreeMap<u64, u32> = BTreeMap::new();
    for (position_id, mut players) in groups {
        players.sort_by(|a, b| {
            b.total_points
                .partial_cmp(&a.total_points)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| tie_break(a).cmp(&tie_break(b)))
        });
        debug!(position_id, ranked = players.len(), "Ranked position group");
        for (i, player) in players.iter().enumerate() {
            ranks.insert(player.player_id, (i + 1) as u32);
        }
    }

    stats
        .iter()
        .map(|stat| PositionRank {
            player_id: stat.player_id,
            position_id: stat.position_id,
            rank: ranks.get(&stat.player_id).copied(),
        })
        .collect()
}
