use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::pipeline::{PipelineCtx, StageReport};
use crate::store::NewFixture;

// The source wraps every list endpoint in the same envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub results: i64,
    #[serde(default)]
    pub response: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct LeagueItem {
    pub league: LeagueInfo,
    pub country: CountryInfo,
}

#[derive(Debug, Deserialize)]
pub struct LeagueInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CountryInfo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamItem {
    pub team: TeamInfo,
}

#[derive(Debug, Deserialize)]
pub struct TeamInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoachItem {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FixtureItem {
    pub fixture: FixtureInfo,
    pub teams: FixtureTeams,
    pub goals: FixtureGoals,
}

#[derive(Debug, Deserialize)]
pub struct FixtureInfo {
    pub id: i64,
    pub date: String,
    pub status: FixtureStatusInfo,
}

#[derive(Debug, Deserialize)]
pub struct FixtureStatusInfo {
    pub short: String,
}

#[derive(Debug, Deserialize)]
pub struct FixtureTeams {
    pub home: FixtureTeam,
    pub away: FixtureTeam,
}

#[derive(Debug, Deserialize)]
pub struct FixtureTeam {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FixtureGoals {
    pub home: Option<i64>,
    pub away: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TeamStatsResponse {
    pub fixtures: StatsFixtures,
    pub goals: StatsGoals,
}

#[derive(Debug, Deserialize)]
pub struct StatsFixtures {
    pub played: StatsTotals,
    pub wins: StatsTotals,
    pub draws: StatsTotals,
    pub loses: StatsTotals,
}

#[derive(Debug, Deserialize)]
pub struct StatsTotals {
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatsGoals {
    #[serde(rename = "for")]
    pub scored: GoalsSide,
    pub against: GoalsSide,
}

#[derive(Debug, Deserialize)]
pub struct GoalsSide {
    pub total: GoalsTotal,
}

#[derive(Debug, Deserialize)]
pub struct GoalsTotal {
    #[serde(default)]
    pub total: i64,
}

pub fn parse_leagues_json(raw: &str) -> Result<Vec<LeagueItem>> {
    parse_envelope(raw).context("invalid leagues json")
}

pub fn parse_teams_json(raw: &str) -> Result<Vec<TeamItem>> {
    parse_envelope(raw).context("invalid teams json")
}

pub fn parse_coaches_json(raw: &str) -> Result<Vec<CoachItem>> {
    parse_envelope(raw).context("invalid coaches json")
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<FixtureItem>> {
    parse_envelope(raw).context("invalid fixtures json")
}

/// The statistics endpoint returns a single object, or an empty array when
/// the source has nothing for the (team, league, season) triple.
pub fn parse_team_stats_json(raw: &str) -> Result<Option<TeamStatsResponse>> {
    let root: Value =
        serde_json::from_str(raw.trim()).context("invalid team statistics json")?;
    let Some(response) = root.get("response") else {
        return Ok(None);
    };
    if !response.is_object() {
        return Ok(None);
    }
    let stats = serde_json::from_value(response.clone())
        .context("unexpected team statistics shape")?;
    Ok(Some(stats))
}

fn parse_envelope<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(raw.trim())?;
    Ok(envelope.response)
}

pub fn points_per_game(wins: i64, draws: i64, played: i64) -> f64 {
    if played <= 0 {
        return 0.0;
    }
    (wins * 3 + draws) as f64 / played as f64
}

/// Season-count rating: 1500 base, +20 per win, -10 per loss.
pub fn season_rating(wins: i64, losses: i64) -> f64 {
    1500.0 + 20.0 * wins as f64 - 10.0 * losses as f64
}

pub fn sync_leagues(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Syncing leagues...");
    let mut report = StageReport::default();
    for league in &ctx.cfg.leagues {
        // Present leagues are not refetched; their country never changes.
        if ctx.store.league_id_by_api(league.api_id)?.is_some() {
            report.processed += 1;
            continue;
        }
        let body = match ctx
            .api
            .get(ctx.store, "leagues", &[("id", league.api_id.to_string())])
        {
            Ok(body) => body,
            Err(err) => {
                println!("  league {}: {err:#}", league.api_id);
                report.skipped += 1;
                continue;
            }
        };
        let items = match parse_leagues_json(&body) {
            Ok(items) => items,
            Err(err) => {
                println!("  league {}: {err:#}", league.api_id);
                report.skipped += 1;
                continue;
            }
        };
        let Some(item) = items.first() else {
            println!("  league {}: empty response", league.api_id);
            report.skipped += 1;
            continue;
        };
        let name = league.name.as_deref().unwrap_or(&item.league.name);
        ctx.store
            .upsert_league(league.api_id, name, &item.country.name)?;
        println!("  added league {name}");
        report.processed += 1;
    }
    Ok(report)
}

pub fn sync_teams(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Syncing teams...");
    let mut report = StageReport::default();
    for league in ctx.store.leagues()? {
        let params = [
            ("league", league.api_id.to_string()),
            ("season", ctx.cfg.season.clone()),
        ];
        let items = match ctx
            .api
            .get(ctx.store, "teams", &params)
            .and_then(|body| parse_teams_json(&body))
        {
            Ok(items) => items,
            Err(err) => {
                println!("  league {}: {err:#}", league.name);
                report.skipped += 1;
                continue;
            }
        };
        if items.is_empty() {
            println!("  league {}: no teams returned", league.name);
            report.skipped += 1;
            continue;
        }
        for item in items {
            ctx.store.upsert_team(
                item.team.id,
                &item.team.name,
                league.id,
                item.team.logo.as_deref(),
            )?;
            report.processed += 1;
        }
    }
    Ok(report)
}

pub fn sync_managers(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Syncing managers...");
    let mut report = StageReport::default();
    for team in ctx.store.teams()? {
        let params = [("team", team.api_id.to_string())];
        let items = match ctx
            .api
            .get(ctx.store, "coachs", &params)
            .and_then(|body| parse_coaches_json(&body))
        {
            Ok(items) => items,
            Err(err) => {
                println!("  team {}: {err:#}", team.name);
                report.skipped += 1;
                continue;
            }
        };
        if items.is_empty() {
            println!("  team {}: no coach returned", team.name);
            report.skipped += 1;
            continue;
        }
        for coach in items {
            ctx.store.upsert_manager(coach.id, &coach.name, team.id)?;
            report.processed += 1;
        }
    }
    Ok(report)
}

pub fn sync_fixtures(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Syncing fixtures...");
    let mut report = StageReport::default();
    for league in ctx.store.leagues()? {
        let params = [
            ("league", league.api_id.to_string()),
            ("season", ctx.cfg.season.clone()),
        ];
        let items = match ctx
            .api
            .get(ctx.store, "fixtures", &params)
            .and_then(|body| parse_fixtures_json(&body))
        {
            Ok(items) => items,
            Err(err) => {
                println!("  league {}: {err:#}", league.name);
                report.skipped += 1;
                continue;
            }
        };
        for item in items {
            let home_id = ctx.store.team_id_by_api(item.teams.home.id)?;
            let away_id = ctx.store.team_id_by_api(item.teams.away.id)?;
            let (Some(home_team_id), Some(away_team_id)) = (home_id, away_id) else {
                println!(
                    "  fixture {} vs {}: teams not resolved yet",
                    item.teams.home.name, item.teams.away.name
                );
                report.skipped += 1;
                continue;
            };
            ctx.store.upsert_fixture(&NewFixture {
                api_id: item.fixture.id,
                home_team_id,
                away_team_id,
                league_id: league.id,
                season: &ctx.cfg.season,
                match_date: &item.fixture.date,
                home_score: item.goals.home,
                away_score: item.goals.away,
                status: &item.fixture.status.short,
            })?;
            report.processed += 1;
        }
    }
    Ok(report)
}

pub fn sync_team_stats(ctx: &PipelineCtx<'_>) -> Result<StageReport> {
    println!("Syncing team statistics...");
    let mut report = StageReport::default();
    for team in ctx.store.teams()? {
        let Some(league) = ctx.store.league_by_id(team.league_id)? else {
            println!("  team {}: league not resolved", team.name);
            report.skipped += 1;
            continue;
        };
        let params = [
            ("team", team.api_id.to_string()),
            ("league", league.api_id.to_string()),
            ("season", ctx.cfg.season.clone()),
        ];
        let stats = match ctx
            .api
            .get(ctx.store, "teams/statistics", &params)
            .and_then(|body| parse_team_stats_json(&body))
        {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                println!("  team {}: no statistics returned", team.name);
                report.skipped += 1;
                continue;
            }
            Err(err) => {
                println!("  team {}: {err:#}", team.name);
                report.skipped += 1;
                continue;
            }
        };
        let ppg = points_per_game(
            stats.fixtures.wins.total,
            stats.fixtures.draws.total,
            stats.fixtures.played.total,
        );
        let rating = season_rating(stats.fixtures.wins.total, stats.fixtures.loses.total);
        ctx.store.upsert_team_stats(
            team.id,
            &ctx.cfg.season,
            rating,
            stats.goals.scored.total.total,
            stats.goals.against.total.total,
            ppg,
        )?;
        report.processed += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{points_per_game, season_rating};

    #[test]
    fn ppg_guards_zero_played() {
        assert_eq!(points_per_game(0, 0, 0), 0.0);
        assert!((points_per_game(10, 4, 20) - 1.7).abs() < 1e-12);
    }

    #[test]
    fn rating_counts_wins_and_losses() {
        assert_eq!(season_rating(0, 0), 1500.0);
        assert_eq!(season_rating(10, 4), 1500.0 + 200.0 - 40.0);
    }
}
