//! What-If Scenario Generator — enumerates every possible keeper selection
//! and its draft-budget impact.
//!
//! The scenario space is the full power set of the candidate list (`2^n`
//! including the empty selection). Keeper-eligible rosters are small, so
//! `2^n` stays tractable; there is no implicit capping. Callers with a
//! large candidate pool are expected to pre-filter to a shortlist first —
//! the subset mask is a `u64`, so `n` is hard-limited to 63.

use tracing::info;

use crate::types::{
    EngineError, EngineResult, KeeperCandidate, WhatIfConfig, WhatIfScenario,
};

/// Lazy iterator over all `2^n` scenarios, in subset-mask order (the empty
/// selection first). Bounds peak memory: scenarios are produced one at a
/// time rather than materialized.
pub struct ScenarioIter<'a> {
    candidates: &'a [KeeperCandidate],
    config: WhatIfConfig,
    next_mask: u64,
    end_mask: u64,
}

impl<'a> ScenarioIter<'a> {
    pub fn new(candidates: &'a [KeeperCandidate], config: WhatIfConfig) -> EngineResult<Self> {
        config.validate()?;
        if candidates.len() >= 64 {
            return Err(EngineError::TooManyCandidates {
                count: candidates.len(),
            });
        }

        info!(
            candidates = candidates.len(),
            scenarios = 1u64 << candidates.len(),
            budget = config.budget,
            roster_size = config.roster_size,
            "Enumerating keeper scenarios"
        );

        Ok(Self {
            candidates,
            config,
            next_mask: 0,
            end_mask: 1u64 << candidates.len(),
        })
    }

    fn scenario_for(&self, mask: u64) -> WhatIfScenario {
        let mut selected_player_ids = Vec::with_capacity(mask.count_ones() as usize);
        let mut total_cost: i64 = 0;

        for (i, candidate) in self.candidates.iter().enumerate() {
            if mask & (1 << i) != 0 {
                selected_player_ids.push(candidate.player_id);
                total_cost += candidate.cost as i64;
            }
        }

        let remaining_budget = self.config.budget - total_cost;
        let remaining_roster_spots = self.config.roster_size - selected_player_ids.len() as i64;

        // Every open spot must stay fillable for at least $1; with no open
        // spots the whole remaining budget is biddable
        let max_single_bid = if remaining_roster_spots <= 0 {
            remaining_budget.max(0)
        } else {
            (remaining_budget - remaining_roster_spots).max(0)
        };

        WhatIfScenario {
            selected_player_ids,
            total_cost,
            remaining_budget,
            remaining_roster_spots,
            max_single_bid,
            roster_exceeded: remaining_roster_spots < 0,
            budget_crisis: remaining_roster_spots > remaining_budget,
        }
    }
}

impl Iterator for ScenarioIter<'_> {
    type Item = WhatIfScenario;

    fn next(&mut self) -> Option<WhatIfScenario> {
        if self.next_mask >= self.end_mask {
            return None;
        }
        let scenario = self.scenario_for(self.next_mask);
        self.next_mask += 1;
        Some(scenario)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end_mask - self.next_mask) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScenarioIter<'_> {}

/// Materialize every scenario. Convenience over [`ScenarioIter`] for small
/// candidate lists.
pub fn enumerate_scenarios(
    candidates: &[KeeperCandidate],
    config: WhatIfConfig,
) -> EngineResult<Vec<WhatIfScenario>> {
    Ok(ScenarioIter::new(candidates, config)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(player_id: u64, cost: u32) -> KeeperCandidate {
        KeeperCandidate { player_id, cost }
    }

    fn config(budget: i64, roster_size: i64) -> WhatIfConfig {
        WhatIfConfig {
            budget,
            roster_size,
        }
    }

    #[test]
    fn test_power_set_size_including_empty() {
        let candidates = vec![candidate(1, 45), candidate(2, 35), candidate(3, 40)];
        let scenarios = enumerate_scenarios(&candidates, config(200, 15)).unwrap();
        assert_eq!(scenarios.len(), 8);

        let empty: Vec<_> = scenarios.iter().filter(|s| s.total_cost == 0).collect();
        assert_eq!(empty.len(), 1);
        assert!(empty[0].selected_player_ids.is_empty());
    }

    #[test]
    fn test_full_selection_metrics() {
        // budget=200, roster=15, keepers at {45, 35, 40}
        let candidates = vec![candidate(1, 45), candidate(2, 35), candidate(3, 40)];
        let scenarios = enumerate_scenarios(&candidates, config(200, 15)).unwrap();

        let all = scenarios
            .iter()
            .find(|s| s.selected_player_ids.len() == 3)
            .unwrap();
        assert_eq!(all.total_cost, 120);
        assert_eq!(all.remaining_budget, 80);
        assert_eq!(all.remaining_roster_spots, 12);
        assert_eq!(all.max_single_bid, 68);
        assert!(!all.roster_exceeded);
        assert!(!all.budget_crisis);
    }

    #[test]
    fn test_budget_crisis_flagged_not_dropped() {
        // 12 open spots but only $5 left: max bid 0, crisis flagged
        let candidates = vec![candidate(1, 100), candidate(2, 95)];
        let scenarios = enumerate_scenarios(&candidates, config(200, 14)).unwrap();

        let crisis = scenarios
            .iter()
            .find(|s| s.selected_player_ids.len() == 2)
            .unwrap();
        assert_eq!(crisis.remaining_budget, 5);
        assert_eq!(crisis.remaining_roster_spots, 12);
        assert_eq!(crisis.max_single_bid, 0);
        assert!(crisis.budget_crisis);
    }

    #[test]
    fn test_zero_spots_frees_whole_budget() {
        let candidates = vec![candidate(1, 20), candidate(2, 30)];
        let scenarios = enumerate_scenarios(&candidates, config(200, 2)).unwrap();

        let full = scenarios
            .iter()
            .find(|s| s.selected_player_ids.len() == 2)
            .unwrap();
        assert_eq!(full.remaining_roster_spots, 0);
        assert_eq!(full.max_single_bid, full.remaining_budget);
        assert_eq!(full.max_single_bid, 150);
    }

    #[test]
    fn test_roster_exceeded_flagged() {
        let candidates = vec![candidate(1, 10), candidate(2, 10), candidate(3, 10)];
        let scenarios = enumerate_scenarios(&candidates, config(200, 2)).unwrap();

        let over = scenarios
            .iter()
            .find(|s| s.selected_player_ids.len() == 3)
            .unwrap();
        assert_eq!(over.remaining_roster_spots, -1);
        assert!(over.roster_exceeded);
        // No spots to reserve for, but budget never goes below zero
        assert_eq!(over.max_single_bid, over.remaining_budget.max(0));
    }

    #[test]
    fn test_lazy_iteration_reports_length() {
        let candidates: Vec<KeeperCandidate> =
            (0..10).map(|i| candidate(i, 10)).collect();
        let iter = ScenarioIter::new(&candidates, config(200, 15)).unwrap();
        assert_eq!(iter.len(), 1024);
        // Consume a few without materializing the rest
        assert_eq!(iter.take(3).count(), 3);
    }

    #[test]
    fn test_invalid_config_fails_before_enumeration() {
        let candidates = vec![candidate(1, 10)];
        assert!(matches!(
            enumerate_scenarios(&candidates, config(-1, 15)),
            Err(EngineError::InvalidWhatIfConfig(_))
        ));
        assert!(enumerate_scenarios(&candidates, config(200, 0)).is_err());
    }

    #[test]
    fn test_candidate_limit_enforced() {
        let candidates: Vec<KeeperCandidate> =
            (0..64).map(|i| candidate(i, 1)).collect();
        assert!(matches!(
            ScenarioIter::new(&candidates, config(200, 15)),
            Err(EngineError::TooManyCandidates { count: 64 })
        ));
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let candidates = vec![candidate(1, 45), candidate(2, 35)];
        let a = enumerate_scenarios(&candidates, config(200, 15)).unwrap();
        let b = enumerate_scenarios(&candidates, config(200, 15)).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.selected_player_ids, y.selected_player_ids);
            assert_eq!(x.max_single_bid, y.max_single_bid);
        }
    }
}
