//! Keeper-Discover — keeper-league analytics over the ESPN Fantasy API
//!
//! Usage:
//!   keeper-discover serve --port 3001      — Launch the JSON API server
//!   keeper-discover keepers --team 4       — Keeper eligibility report
//!   keeper-discover whatif --team 4        — Explore keeper selections
//!   keeper-discover oiwp                   — All-play standings and luck

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use clap::{Parser, Subcommand};
use engine::{
    build_streaks, calculate_oiwp, enumerate_scenarios, evaluate_all, position_name,
    rank_positions, EspnClient, KeeperCandidate, KeeperEligibility, LeagueRules, OiwpResult,
    PlayerSeasonStat, PositionRank, WhatIfConfig, WhatIfScenario,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "keeper-discover")]
#[command(about = "Keeper-league analytics for ESPN fantasy football", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the analytics JSON API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 3001)]
        port: u16,
    },
    /// Keeper eligibility and cost report
    Keepers {
        /// Limit the report to one team id
        #[arg(long)]
        team: Option<u32>,
    },
    /// Enumerate keeper what-if scenarios for a team
    Whatif {
        /// Team id to analyze
        #[arg(long)]
        team: u32,
        /// Auction budget
        #[arg(long, default_value_t = 200)]
        budget: i64,
        /// Roster size
        #[arg(long, default_value_t = 15)]
        roster_size: i64,
        /// Candidate shortlist size (cheapest first); the scenario space is
        /// 2^n, so keep this small
        #[arg(long, default_value_t = 12)]
        max_candidates: usize,
        /// Number of scenarios to print, best max bid first
        #[arg(long, default_value_t = 20)]
        top_n: usize,
    },
    /// Within-position performance ranks for rostered players
    Ranks,
    /// All-play standings: OIWP and schedule luck
    Oiwp,
}

#[derive(Clone)]
struct AppState {
    espn: Arc<EspnClient>,
    rules: Arc<LeagueRules>,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,keeper_discover=debug")
    } else {
        EnvFilter::new("info,engine=info,keeper_discover=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

/// Build the ESPN client from environment configuration
fn load_client() -> anyhow::Result<EspnClient> {
    let league_id: u64 = std::env::var("KEEPER_LEAGUE_ID")
        .map_err(|_| anyhow::anyhow!("KEEPER_LEAGUE_ID must be set"))?
        .parse()?;
    let season: u16 = std::env::var("KEEPER_SEASON")
        .map_err(|_| anyhow::anyhow!("KEEPER_SEASON must be set"))?
        .parse()?;
    let espn_s2 = std::env::var("KEEPER_ESPN_S2").ok();
    let swid = std::env::var("KEEPER_SWID").ok();

    if espn_s2.is_none() || swid.is_none() {
        warn!("No ESPN cookies configured; private leagues will return 401/403");
    }

    Ok(EspnClient::new(league_id, season, espn_s2, swid))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(&host, port).await?,
        Commands::Keepers { team } => cmd_keepers(team).await?,
        Commands::Whatif {
            team,
            budget,
            roster_size,
            max_candidates,
            top_n,
        } => cmd_whatif(team, budget, roster_size, max_candidates, top_n).await?,
        Commands::Ranks => cmd_ranks().await?,
        Commands::Oiwp => cmd_oiwp().await?,
    }

    Ok(())
}

// ============================================================================
// Presentation rows — the engine emits typed values; formatting and the
// cost sentinel live at this boundary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct KeeperRow {
    player_id: u64,
    player_name: String,
    team_id: u32,
    team_name: String,
    position: String,
    years_kept: u8,
    years_remaining: u8,
    eligible: bool,
    /// Real next-season cost, or the ineligible sentinel so the column
    /// stays totally ordered
    keeper_cost: u32,
    last_cost: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct RankRow {
    player_id: u64,
    player_name: String,
    position: String,
    total_points: f64,
    rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct OiwpRow {
    team_id: u32,
    team_name: String,
    record: String,
    predicted_record: Option<String>,
    wp: Option<f64>,
    oiwp: Option<f64>,
    luck: Option<f64>,
    schedule_wins: Option<i64>,
}

fn keeper_rows(
    eligibilities: &[KeeperEligibility],
    team_names: &HashMap<u32, String>,
) -> Vec<KeeperRow> {
    let mut rows: Vec<KeeperRow> = eligibilities
        .iter()
        .map(|e| KeeperRow {
            player_id: e.player_id,
            player_name: e.player_name.clone(),
            team_id: e.team_id,
            team_name: team_names
                .get(&e.team_id)
                .cloned()
                .unwrap_or_else(|| format!("Team {}", e.team_id)),
            position: position_name(e.position_id),
            years_kept: e.years_kept,
            years_remaining: e.years_remaining,
            eligible: e.eligible,
            keeper_cost: e.sortable_cost(),
            last_cost: e.last_cost,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.team_id
            .cmp(&b.team_id)
            .then(a.keeper_cost.cmp(&b.keeper_cost))
            .then(a.player_id.cmp(&b.player_id))
    });
    rows
}

fn rank_rows(stats: &[PlayerSeasonStat], ranks: &[PositionRank]) -> Vec<RankRow> {
    let mut rows: Vec<RankRow> = stats
        .iter()
        .zip(ranks)
        .map(|(s, r)| RankRow {
            player_id: s.player_id,
            player_name: s.player_name.clone(),
            position: position_name(s.position_id),
            total_points: s.total_points,
            rank: r.rank,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then(a.rank.unwrap_or(u32::MAX).cmp(&b.rank.unwrap_or(u32::MAX)))
    });
    rows
}

fn oiwp_rows(results: &[OiwpResult], team_names: &HashMap<u32, String>) -> Vec<OiwpRow> {
    results
        .iter()
        .map(|r| {
            let games = r.wins + r.losses + r.ties;
            OiwpRow {
                team_id: r.team_id,
                team_name: team_names
                    .get(&r.team_id)
                    .cloned()
                    .unwrap_or_else(|| format!("Team {}", r.team_id)),
                record: format!("{}-{}", r.wins, r.losses),
                predicted_record: r
                    .predicted_wins
                    .map(|w| format!("{}-{}", w, games.saturating_sub(w))),
                wp: r.actual_win_pct,
                oiwp: r.oiwp,
                luck: r.luck,
                schedule_wins: r.schedule_wins,
            }
        })
        .collect()
}

// ============================================================================
// Fetch + compute pipelines shared by CLI and API
// ============================================================================

async fn keeper_report(espn: &EspnClient, rules: &LeagueRules) -> anyhow::Result<Vec<KeeperRow>> {
    let history = espn.league_history(rules).await?;
    let streaks = build_streaks(&history, rules)?;
    let eligibilities = evaluate_all(&streaks, rules)?;

    let teams = espn.get_teams().await?;
    let team_names: HashMap<u32, String> =
        teams.into_iter().map(|t| (t.team_id, t.team_name)).collect();

    Ok(keeper_rows(&eligibilities, &team_names))
}

async fn rank_report(espn: &EspnClient) -> anyhow::Result<Vec<RankRow>> {
    let stats = espn.get_player_stats().await?;
    let ranks = rank_positions(&stats);
    Ok(rank_rows(&stats, &ranks))
}

async fn oiwp_report(espn: &EspnClient) -> anyhow::Result<Vec<OiwpRow>> {
    let scores = espn.get_matchups().await?;
    let results = calculate_oiwp(&scores);

    let teams = espn.get_teams().await?;
    let team_names: HashMap<u32, String> =
        teams.into_iter().map(|t| (t.team_id, t.team_name)).collect();

    Ok(oiwp_rows(&results, &team_names))
}

/// Eligible keepers for one team, cheapest first, shortlisted so the 2^n
/// scenario space stays tractable
async fn whatif_candidates(
    espn: &EspnClient,
    rules: &LeagueRules,
    team: u32,
    max_candidates: usize,
) -> anyhow::Result<Vec<KeeperCandidate>> {
    let history = espn.league_history(rules).await?;
    let streaks = build_streaks(&history, rules)?;
    let eligibilities = evaluate_all(&streaks, rules)?;

    let mut candidates: Vec<KeeperCandidate> = eligibilities
        .iter()
        .filter(|e| e.team_id == team && e.eligible)
        .filter_map(|e| {
            e.next_cost.map(|cost| KeeperCandidate {
                player_id: e.player_id,
                cost,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.cost.cmp(&b.cost).then(a.player_id.cmp(&b.player_id)));
    if candidates.len() > max_candidates {
        warn!(
            total = candidates.len(),
            kept = max_candidates,
            "Shortlisting what-if candidates"
        );
        candidates.truncate(max_candidates);
    }

    Ok(candidates)
}

async fn whatif_report(
    espn: &EspnClient,
    rules: &LeagueRules,
    team: u32,
    config: WhatIfConfig,
    max_candidates: usize,
) -> anyhow::Result<Vec<WhatIfScenario>> {
    let candidates = whatif_candidates(espn, rules, team, max_candidates).await?;
    let scenarios = enumerate_scenarios(&candidates, config)?;
    Ok(scenarios)
}

// ============================================================================
// Serve command — Axum JSON API
// ============================================================================

async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    info!("Keeper-Discover v{} starting...", APP_VERSION);

    let espn = load_client()?;
    let rules = LeagueRules::default();
    rules.validate()?;

    let state = AppState {
        espn: Arc::new(espn),
        rules: Arc::new(rules),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(api_health))
        .route("/keepers", get(api_keepers))
        .route("/ranks", get(api_ranks))
        .route("/whatif", get(api_whatif))
        .route("/oiwp", get(api_oiwp))
        .with_state(state);

    let app = Router::new().nest("/api", api_routes).layer(cors);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Keeper-Discover v{} ===", APP_VERSION);
    println!("Keeper League Analytics Server");
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET /api/health    - Health check");
    println!("  GET /api/keepers   - Keeper eligibility and costs");
    println!("  GET /api/ranks     - Within-position performance ranks");
    println!("  GET /api/whatif    - Keeper scenarios (?team=&budget=&roster_size=)");
    println!("  GET /api/oiwp      - All-play standings and schedule luck");
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// GET /api/health
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "keeper-discover",
        "version": APP_VERSION,
    }))
}

/// GET /api/keepers — eligibility rows for every rostered player
async fn api_keepers(State(state): State<AppState>) -> Json<serde_json::Value> {
    match keeper_report(&state.espn, &state.rules).await {
        Ok(rows) => Json(serde_json::json!({ "success": true, "data": rows })),
        Err(e) => error_json(e),
    }
}

/// GET /api/ranks — position ranks for every rostered player
async fn api_ranks(State(state): State<AppState>) -> Json<serde_json::Value> {
    match rank_report(&state.espn).await {
        Ok(rows) => Json(serde_json::json!({ "success": true, "data": rows })),
        Err(e) => error_json(e),
    }
}

/// GET /api/whatif?team=&budget=&roster_size=&max_candidates=
async fn api_whatif(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let Some(team) = params.get("team").and_then(|s| s.parse().ok()) else {
        return Json(serde_json::json!({
            "success": false,
            "error": "team query parameter is required",
        }));
    };
    let config = WhatIfConfig {
        budget: params
            .get("budget")
            .and_then(|s| s.parse().ok())
            .unwrap_or(state.rules.budget),
        roster_size: params
            .get("roster_size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(state.rules.roster_size),
    };
    let max_candidates: usize = params
        .get("max_candidates")
        .and_then(|s| s.parse().ok())
        .unwrap_or(12);

    match whatif_report(&state.espn, &state.rules, team, config, max_candidates).await {
        Ok(scenarios) => Json(serde_json::json!({
            "success": true,
            "scenarios": scenarios.len(),
            "data": scenarios,
        })),
        Err(e) => error_json(e),
    }
}

/// GET /api/oiwp — all-play standings
async fn api_oiwp(State(state): State<AppState>) -> Json<serde_json::Value> {
    match oiwp_report(&state.espn).await {
        Ok(rows) => Json(serde_json::json!({ "success": true, "data": rows })),
        Err(e) => error_json(e),
    }
}

fn error_json(e: anyhow::Error) -> Json<serde_json::Value> {
    tracing::error!("Request failed: {e:#}");
    Json(serde_json::json!({ "success": false, "error": e.to_string() }))
}

// ============================================================================
// CLI report commands
// ============================================================================

async fn cmd_keepers(team: Option<u32>) -> anyhow::Result<()> {
    let espn = load_client()?;
    let rules = LeagueRules::default();

    println!("\n=== Keeper-Discover v{} ===", APP_VERSION);
    println!(
        "Keeper eligibility for {} (looking back {} seasons)\n",
        espn.season(),
        rules.go_back_years
    );

    let mut rows = keeper_report(&espn, &rules).await?;
    if let Some(team) = team {
        rows.retain(|r| r.team_id == team);
    }

    println!(
        "  {:<24} {:<18} {:<5} {:>5} {:>5} {:>8} {:>6}",
        "Player", "Team", "Pos", "Kept", "Left", "Cost", "Elig"
    );
    println!("  {}", "-".repeat(78));
    for row in &rows {
        let cost = if row.eligible {
            format!("${}", row.keeper_cost)
        } else {
            "-".to_string()
        };
        println!(
            "  {:<24} {:<18} {:<5} {:>5} {:>5} {:>8} {:>6}",
            row.player_name,
            row.team_name,
            row.position,
            row.years_kept,
            row.years_remaining,
            cost,
            if row.eligible { "yes" } else { "no" },
        );
    }
    println!("\n{} players analyzed", rows.len());

    Ok(())
}

async fn cmd_whatif(
    team: u32,
    budget: i64,
    roster_size: i64,
    max_candidates: usize,
    top_n: usize,
) -> anyhow::Result<()> {
    let espn = load_client()?;
    let rules = LeagueRules::default();
    let config = WhatIfConfig {
        budget,
        roster_size,
    };
    config.validate()?;

    println!("\n=== Keeper-Discover v{} ===", APP_VERSION);
    println!(
        "What-if scenarios for team {} (budget ${}, roster {})\n",
        team, budget, roster_size
    );

    let mut scenarios = whatif_report(&espn, &rules, team, config, max_candidates).await?;
    let total = scenarios.len();

    // Best room for a single additional bid first; crisis scenarios last
    scenarios.sort_by(|a, b| {
        a.budget_crisis
            .cmp(&b.budget_crisis)
            .then(b.max_single_bid.cmp(&a.max_single_bid))
            .then(a.selected_player_ids.len().cmp(&b.selected_player_ids.len()))
    });

    println!(
        "  {:>3}  {:>7} {:>8} {:>8} {:>6} {:>8}  {}",
        "#", "Keepers", "Cost", "Budget", "Spots", "MaxBid", "Flags"
    );
    println!("  {}", "-".repeat(66));
    for (i, s) in scenarios.iter().take(top_n).enumerate() {
        let flags = match (s.roster_exceeded, s.budget_crisis) {
            (true, _) => "roster!",
            (_, true) => "budget!",
            _ => "",
        };
        println!(
            "  {:>3}  {:>7} {:>8} {:>8} {:>6} {:>8}  {}",
            i + 1,
            s.selected_player_ids.len(),
            format!("${}", s.total_cost),
            format!("${}", s.remaining_budget),
            s.remaining_roster_spots,
            format!("${}", s.max_single_bid),
            flags,
        );
    }
    println!("\n{} scenarios explored", total);

    Ok(())
}

async fn cmd_ranks() -> anyhow::Result<()> {
    let espn = load_client()?;

    println!("\n=== Keeper-Discover v{} ===", APP_VERSION);
    println!("Position ranks for {}\n", espn.season());

    let rows = rank_report(&espn).await?;

    println!(
        "  {:<24} {:<5} {:>8} {:>6}",
        "Player", "Pos", "Points", "Rank"
    );
    println!("  {}", "-".repeat(48));
    for row in &rows {
        println!(
            "  {:<24} {:<5} {:>8.1} {:>6}",
            row.player_name,
            row.position,
            row.total_points,
            row.rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".into()),
        );
    }
    println!("\n{} players ranked", rows.len());

    Ok(())
}

async fn cmd_oiwp() -> anyhow::Result<()> {
    let espn = load_client()?;

    println!("\n=== Keeper-Discover v{} ===", APP_VERSION);
    println!("All-play standings for {}\n", espn.season());

    let rows = oiwp_report(&espn).await?;

    println!(
        "  {:<20} {:>7} {:>9} {:>7} {:>7} {:>7} {:>6}",
        "Team", "Record", "Predicted", "WP", "OIWP", "Luck", "SchW"
    );
    println!("  {}", "-".repeat(70));
    for row in &rows {
        println!(
            "  {:<20} {:>7} {:>9} {:>7} {:>7} {:>7} {:>6}",
            row.team_name,
            row.record,
            row.predicted_record.as_deref().unwrap_or("-"),
            row.wp.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".into()),
            row.oiwp.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".into()),
            row.luck
                .map(|v| format!("{v:+.3}"))
                .unwrap_or_else(|| "-".into()),
            row.schedule_wins
                .map(|v| format!("{v:+}"))
                .unwrap_or_else(|| "-".into()),
        );
    }

    Ok(())
}
