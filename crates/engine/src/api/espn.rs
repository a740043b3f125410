//! ESPN Fantasy Football API client — read-only league endpoints
//!
//! Uses `lm-api-reads.fantasy.espn.com` for rosters, draft history,
//! transactions, weekly matchups, and player season totals. Private leagues
//! need the `espn_s2`/`SWID` cookie pair. Supplies the immutable snapshots
//! the analytic subsystems consume; retry, backoff, and caching are out of
//! scope here.

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::types::{
    LeagueHistory, LeagueRules, PlayerDraftRecord, PlayerSeasonStat, SeasonDraft,
    SeasonTransactions, TeamWeekScore, TransactionKind, TransactionRecord,
};

const BASE_URL: &str = "https://lm-api-reads.fantasy.espn.com/apis/v3/games/ffl";

/// ESPN Fantasy API client for one league
#[derive(Clone)]
pub struct EspnClient {
    client: Client,
    league_id: u64,
    season: u16,
    cookie_header: Option<String>,
}

/// A league team, for id → name mapping and report headers
#[derive(Debug, Clone, serde::Serialize)]
pub struct LeagueTeam {
    pub team_id: u32,
    pub team_name: String,
}

// ---------------------------------------------------------------------------
// Deserialization structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeagueResponse {
    #[serde(default)]
    teams: Vec<TeamEntry>,
    draft_detail: Option<DraftDetail>,
    #[serde(default)]
    schedule: Vec<ScheduleGame>,
    scoring_period_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamEntry {
    id: u32,
    name: Option<String>,
    location: Option<String>,
    roster: Option<Roster>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Roster {
    #[serde(default)]
    entries: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterEntry {
    player_pool_entry: PlayerPoolEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerPoolEntry {
    player: PlayerData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerData {
    id: u64,
    full_name: Option<String>,
    default_position_id: Option<u32>,
    #[serde(default)]
    stats: Vec<StatLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatLine {
    stat_source_id: Option<u8>,
    stat_split_type_id: Option<u8>,
    applied_total: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftDetail {
    #[serde(default)]
    picks: Vec<PickData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickData {
    player_id: u64,
    team_id: u32,
    #[serde(default)]
    keeper: bool,
    #[serde(default)]
    bid_amount: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleGame {
    matchup_period_id: u32,
    away: Option<MatchupSide>,
    home: Option<MatchupSide>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchupSide {
    team_id: u32,
    #[serde(default)]
    total_points: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCardEntry {
    player: PlayerData,
    #[serde(default)]
    transactions: Vec<TransactionData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionData {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    items: Vec<TransactionItem>,
    processed_date: Option<i64>,
    proposed_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    player_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Client implementation
// ---------------------------------------------------------------------------

impl EspnClient {
    pub fn new(
        league_id: u64,
        season: u16,
        espn_s2: Option<String>,
        swid: Option<String>,
    ) -> Self {
        // SWID must be uppercase in the cookie header
        let cookie_header = match (espn_s2, swid) {
            (Some(s2), Some(swid)) => Some(format!("espn_s2={s2}; SWID={swid}")),
            _ => None,
        };

        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            league_id,
            season,
            cookie_header,
        }
    }

    pub fn season(&self) -> u16 {
        self.season
    }

    fn league_url(&self, year: u16) -> String {
        format!(
            "{}/seasons/{}/segments/0/leagues/{}",
            BASE_URL, year, self.league_id
        )
    }

    async fn get_league(&self, url: &str, filter: Option<&str>) -> Result<reqwest::Response> {
        let mut req = self.client.get(url);
        if let Some(cookie) = &self.cookie_header {
            req = req.header(reqwest::header::COOKIE, cookie.clone());
        }
        if let Some(filter) = filter {
            req = req.header("x-fantasy-filter", filter);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("ESPN API error {}: {}", status, body);
        }
        Ok(resp)
    }

    /// All teams in the league
    pub async fn get_teams(&self) -> Result<Vec<LeagueTeam>> {
        let url = format!("{}?view=mTeam", self.league_url(self.season));
        debug!(url, "Fetching teams");

        let league: LeagueResponse = self.get_league(&url, None).await?.json().await?;
        let teams = league
            .teams
            .into_iter()
            .map(|t| LeagueTeam {
                team_id: t.id,
                team_name: t
                    .name
                    .or(t.location)
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect::<Vec<_>>();

        debug!(count = teams.len(), "Teams fetched");
        Ok(teams)
    }

    /// Current scoring period (week) of the season
    pub async fn get_current_week(&self) -> Result<u32> {
        let url = format!("{}?view=mSettings", self.league_url(self.season));
        let league: LeagueResponse = self.get_league(&url, None).await?.json().await?;
        Ok(league.scoring_period_id.unwrap_or(1))
    }

    /// Mirrored matchup rows for every week up to the current one
    pub async fn get_matchups(&self) -> Result<Vec<TeamWeekScore>> {
        let current_week = self.get_current_week().await?;
        let mut rows = Vec::new();

        for week in 1..=current_week {
            let url = format!(
                "{}?view=mMatchup&scoringPeriodId={}",
                self.league_url(self.season),
                week
            );
            debug!(week, "Fetching matchups");
            let league: LeagueResponse = self.get_league(&url, None).await?.json().await?;

            for game in league.schedule {
                if game.matchup_period_id != week {
                    continue;
                }
                let (Some(away), Some(home)) = (game.away, game.home) else {
                    continue;
                };
                rows.push(TeamWeekScore {
                    team_id: away.team_id,
                    week,
                    points_for: away.total_points,
                    opponent_id: home.team_id,
                    opponent_points: home.total_points,
                });
                rows.push(TeamWeekScore {
                    team_id: home.team_id,
                    week,
                    points_for: home.total_points,
                    opponent_id: away.team_id,
                    opponent_points: away.total_points,
                });
            }
        }

        debug!(rows = rows.len(), "Matchups fetched");
        Ok(rows)
    }

    /// Draft picks for one season, with names resolved from team rosters
    pub async fn get_draft_picks(&self, year: u16) -> Result<Vec<PlayerDraftRecord>> {
        let url = format!(
            "{}?view=mDraftDetail&view=mTeam&view=mRoster",
            self.league_url(year)
        );
        debug!(year, "Fetching draft picks");
        let league: LeagueResponse = self.get_league(&url, None).await?.json().await?;

        // Player id → (name, position) from all rosters
        let mut players = std::collections::HashMap::new();
        for team in &league.teams {
            let Some(roster) = &team.roster else { continue };
            for entry in &roster.entries {
                let p = &entry.player_pool_entry.player;
                players.insert(
                    p.id,
                    (
                        p.full_name.clone().unwrap_or_else(|| "Unknown".to_string()),
                        p.default_position_id.unwrap_or(0),
                    ),
                );
            }
        }

        let picks = league
            .draft_detail
            .map(|d| d.picks)
            .unwrap_or_default()
            .into_iter()
            .map(|pick| {
                let (name, position_id) = players
                    .get(&pick.player_id)
                    .cloned()
                    .unwrap_or_else(|| (format!("Unknown (ID: {})", pick.player_id), 0));
                PlayerDraftRecord {
                    player_id: pick.player_id,
                    player_name: name,
                    position_id,
                    owning_team_id: pick.team_id,
                    draft_cost: pick.bid_amount,
                    season_year: year,
                    keeper: pick.keeper,
                }
            })
            .collect::<Vec<_>>();

        debug!(year, picks = picks.len(), "Draft picks fetched");
        Ok(picks)
    }

    /// Add/drop/waiver transactions for one season
    pub async fn get_transactions(&self, year: u16) -> Result<Vec<TransactionRecord>> {
        let url = format!("{}/players?view=kona_playercard", self.league_url(year));
        debug!(year, "Fetching transactions");
        let entries: Vec<PlayerCardEntry> = self
            .get_league(&url, Some(r#"{"filterActive":{"value":true}}"#))
            .await?
            .json()
            .await?;

        let mut records = Vec::new();
        for entry in entries {
            for trans in entry.transactions {
                if trans.kind.as_deref() == Some("DRAFT") {
                    continue;
                }
                let timestamp_ms = trans.processed_date.or(trans.proposed_date).unwrap_or(0);

                for item in trans.items {
                    let Some(player_id) = item.player_id else {
                        continue;
                    };
                    let kind = match (trans.kind.as_deref(), item.kind.as_deref()) {
                        (Some("WAIVER"), Some("ADD")) => TransactionKind::Waiver,
                        (_, Some("ADD")) => TransactionKind::Add,
                        (_, Some("DROP")) => TransactionKind::Drop,
                        (_, Some("TRADE")) => TransactionKind::Trade,
                        _ => continue,
                    };
                    records.push(TransactionRecord {
                        player_id,
                        kind,
                        timestamp_ms,
                    });
                }
            }
        }

        debug!(year, records = records.len(), "Transactions fetched");
        Ok(records)
    }

    /// Season point totals for every rostered player
    pub async fn get_player_stats(&self) -> Result<Vec<PlayerSeasonStat>> {
        let url = format!("{}?view=mRoster&view=mTeam", self.league_url(self.season));
        debug!("Fetching player stats");
        let league: LeagueResponse = self.get_league(&url, None).await?.json().await?;

        let mut stats = Vec::new();
        for team in league.teams {
            let Some(roster) = team.roster else { continue };
            for entry in roster.entries {
                let p = entry.player_pool_entry.player;
                stats.push(PlayerSeasonStat {
                    player_id: p.id,
                    player_name: p.full_name.unwrap_or_else(|| "Unknown".to_string()),
                    position_id: p.default_position_id.unwrap_or(0),
                    total_points: season_total(&p.stats),
                });
            }
        }

        debug!(players = stats.len(), "Player stats fetched");
        Ok(stats)
    }

    /// Draft and transaction snapshots for the current season and prior
    /// seasons, newest first, as the keeper ledger expects.
    pub async fn league_history(&self, rules: &LeagueRules) -> Result<LeagueHistory> {
        let mut history = LeagueHistory::default();

        for offset in 0..rules.go_back_years {
            let year = self.season - offset as u16;
            history.seasons.push(SeasonDraft {
                season_year: year,
                picks: self.get_draft_picks(year).await?,
            });
            history.transactions.push(SeasonTransactions {
                season_year: year,
                transactions: self.get_transactions(year).await?,
            });
        }

        Ok(history)
    }
}

/// Season-cumulative applied total: source 0, split 0. Multiple lines can
/// carry the same ids; the last one is the most recent.
fn season_total(stats: &[StatLine]) -> f64 {
    let mut total = 0.0;
    for stat in stats {
        if stat.stat_source_id == Some(0) && stat.stat_split_type_id == Some(0) {
            total = stat.applied_total.unwrap_or(0.0);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_total_takes_last_matching_line() {
        let stats = vec![
            StatLine {
                stat_source_id: Some(0),
                stat_split_type_id: Some(0),
                applied_total: Some(120.0),
            },
            StatLine {
                stat_source_id: Some(1),
                stat_split_type_id: Some(0),
                applied_total: Some(300.0),
            },
            StatLine {
                stat_source_id: Some(0),
                stat_split_type_id: Some(0),
                applied_total: Some(185.4),
            },
        ];
        assert_eq!(season_total(&stats), 185.4);
    }

    #[test]
    fn test_season_total_defaults_to_zero() {
        assert_eq!(season_total(&[]), 0.0);
        let projected_only = vec![StatLine {
            stat_source_id: Some(1),
            stat_split_type_id: Some(1),
            applied_total: Some(12.0),
        }];
        assert_eq!(season_total(&projected_only), 0.0);
    }
}
