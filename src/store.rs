use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::entities::{
    EnhancedFeatures, EnhancedMatch, Fixture, League, Manager, MatchupMetrics, ModelOutput,
    Prediction, TacticalMatchup, TacticalMetrics, TacticalVector, Team, TeamSeasonStats,
};

/// Single-writer repository over SQLite. Surrogate ids are assigned on first
/// insert and never rewritten; every upsert is keyed by the external id (or
/// the composite natural key) and touches mutable columns only.
pub struct Store {
    conn: Connection,
}

#[derive(Debug, Clone, Copy)]
pub struct ApiCallRecord<'a> {
    pub endpoint: &'a str,
    pub parameters: &'a str,
    pub status_code: Option<u16>,
    pub response_size: usize,
    pub execution_time: f64,
}

#[derive(Debug, Clone)]
pub struct NewFixture<'a> {
    pub api_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub league_id: i64,
    pub season: &'a str,
    pub match_date: &'a str,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub status: &'a str,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite db {}", path.display()))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                PRAGMA journal_mode = WAL;
                CREATE TABLE IF NOT EXISTS leagues (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    country TEXT NOT NULL,
                    api_id INTEGER NOT NULL UNIQUE,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS teams (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    league_id INTEGER NOT NULL REFERENCES leagues(id),
                    logo_url TEXT NULL,
                    api_id INTEGER NOT NULL UNIQUE,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS managers (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    team_id INTEGER NOT NULL REFERENCES teams(id),
                    api_id INTEGER NOT NULL UNIQUE,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS fixtures (
                    id INTEGER PRIMARY KEY,
                    home_team_id INTEGER NOT NULL REFERENCES teams(id),
                    away_team_id INTEGER NOT NULL REFERENCES teams(id),
                    league_id INTEGER NOT NULL REFERENCES leagues(id),
                    season TEXT NOT NULL,
                    match_date TEXT NOT NULL,
                    home_score INTEGER NULL,
                    away_score INTEGER NULL,
                    status TEXT NOT NULL,
                    api_id INTEGER NOT NULL UNIQUE,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_fixtures_status ON fixtures(status);
                CREATE TABLE IF NOT EXISTS team_stats (
                    id INTEGER PRIMARY KEY,
                    team_id INTEGER NOT NULL REFERENCES teams(id),
                    season TEXT NOT NULL,
                    elo_rating REAL NOT NULL,
                    goals_scored INTEGER NOT NULL,
                    goals_conceded INTEGER NOT NULL,
                    points_per_game REAL NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(team_id, season)
                );
                CREATE TABLE IF NOT EXISTS tactical_vectors (
                    id INTEGER PRIMARY KEY,
                    manager_id INTEGER NOT NULL UNIQUE REFERENCES managers(id),
                    pressing_intensity REAL NOT NULL,
                    possession_control REAL NOT NULL,
                    counter_attack_focus REAL NOT NULL,
                    defensive_line_height REAL NOT NULL,
                    defensive_aggression REAL NOT NULL,
                    defensive_width REAL NOT NULL,
                    offensive_width REAL NOT NULL,
                    offensive_depth REAL NOT NULL,
                    buildup_speed REAL NOT NULL,
                    buildup_passing_directness REAL NOT NULL,
                    buildup_initiation REAL NOT NULL,
                    chance_creation_method REAL NOT NULL,
                    defensive_organization REAL NOT NULL,
                    wing_play_emphasis REAL NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS tactical_matchups (
                    id INTEGER PRIMARY KEY,
                    fixture_id INTEGER NOT NULL UNIQUE REFERENCES fixtures(id),
                    cosine_similarity REAL NOT NULL,
                    euclidean_distance REAL NOT NULL,
                    pressing_mismatch REAL NOT NULL,
                    possession_defense_mismatch REAL NOT NULL,
                    counter_defense_mismatch REAL NOT NULL,
                    buildup_pressing_mismatch REAL NOT NULL,
                    wing_width_mismatch REAL NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS enhanced_matches (
                    id INTEGER PRIMARY KEY,
                    fixture_id INTEGER NOT NULL UNIQUE REFERENCES fixtures(id),
                    cosine_similarity REAL NOT NULL,
                    euclidean_distance REAL NOT NULL,
                    pressing_mismatch REAL NOT NULL,
                    possession_defense_mismatch REAL NOT NULL,
                    counter_defense_mismatch REAL NOT NULL,
                    buildup_pressing_mismatch REAL NOT NULL,
                    wing_width_mismatch REAL NOT NULL,
                    elo_difference REAL NOT NULL,
                    goal_diff_difference REAL NOT NULL,
                    ppg_difference REAL NOT NULL,
                    home_elo REAL NOT NULL,
                    away_elo REAL NOT NULL,
                    home_goals_scored INTEGER NOT NULL,
                    away_goals_scored INTEGER NOT NULL,
                    home_goals_conceded INTEGER NOT NULL,
                    away_goals_conceded INTEGER NOT NULL,
                    home_ppg REAL NOT NULL,
                    away_ppg REAL NOT NULL,
                    result INTEGER NULL,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS predictions (
                    id INTEGER PRIMARY KEY,
                    fixture_id INTEGER NOT NULL REFERENCES fixtures(id),
                    model_name TEXT NOT NULL,
                    home_win_probability REAL NOT NULL,
                    draw_probability REAL NOT NULL,
                    away_win_probability REAL NOT NULL,
                    predicted_result INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE(fixture_id, model_name)
                );
                CREATE TABLE IF NOT EXISTS api_calls (
                    id INTEGER PRIMARY KEY,
                    endpoint TEXT NOT NULL,
                    parameters TEXT NOT NULL,
                    status_code INTEGER NULL,
                    response_size INTEGER NOT NULL,
                    execution_time REAL NOT NULL,
                    created_at TEXT NOT NULL
                );
                "#,
            )
            .context("create sqlite schema")?;
        Ok(())
    }

    // --- audit log ---

    pub fn log_api_call(&self, rec: &ApiCallRecord<'_>) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO api_calls (endpoint, parameters, status_code, response_size, execution_time, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rec.endpoint,
                    rec.parameters,
                    rec.status_code,
                    rec.response_size as i64,
                    rec.execution_time,
                    now(),
                ],
            )
            .context("insert api call log")?;
        Ok(())
    }

    pub fn api_call_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM api_calls", [], |row| row.get(0))
            .context("count api calls")
    }

    // --- leagues ---

    pub fn upsert_league(&self, api_id: i64, name: &str, country: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO leagues (name, country, api_id, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(api_id) DO UPDATE SET
                     name = excluded.name,
                     country = excluded.country,
                     updated_at = excluded.updated_at",
                params![name, country, api_id, now()],
            )
            .context("upsert league")?;
        self.league_id_by_api(api_id)?
            .ok_or_else(|| anyhow!("league {api_id} missing after upsert"))
    }

    pub fn league_id_by_api(&self, api_id: i64) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM leagues WHERE api_id = ?1",
                params![api_id],
                |row| row.get(0),
            )
            .optional()
            .context("lookup league by api id")
    }

    pub fn league_by_id(&self, id: i64) -> Result<Option<League>> {
        self.conn
            .query_row(
                "SELECT id, name, country, api_id FROM leagues WHERE id = ?1",
                params![id],
                league_from_row,
            )
            .optional()
            .context("lookup league by id")
    }

    pub fn leagues(&self) -> Result<Vec<League>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, country, api_id FROM leagues ORDER BY id ASC")
            .context("prepare leagues query")?;
        let rows = stmt
            .query_map([], league_from_row)
            .context("query leagues")?;
        collect_rows(rows)
    }

    // --- teams ---

    pub fn upsert_team(
        &self,
        api_id: i64,
        name: &str,
        league_id: i64,
        logo_url: Option<&str>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO teams (name, league_id, logo_url, api_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(api_id) DO UPDATE SET
                     name = excluded.name,
                     league_id = excluded.league_id,
                     logo_url = excluded.logo_url,
                     updated_at = excluded.updated_at",
                params![name, league_id, logo_url, api_id, now()],
            )
            .context("upsert team")?;
        self.team_id_by_api(api_id)?
            .ok_or_else(|| anyhow!("team {api_id} missing after upsert"))
    }

    pub fn team_id_by_api(&self, api_id: i64) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM teams WHERE api_id = ?1",
                params![api_id],
                |row| row.get(0),
            )
            .optional()
            .context("lookup team by api id")
    }

    pub fn teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, league_id, logo_url, api_id FROM teams ORDER BY id ASC")
            .context("prepare teams query")?;
        let rows = stmt.query_map([], team_from_row).context("query teams")?;
        collect_rows(rows)
    }

    // --- managers ---

    pub fn upsert_manager(&self, api_id: i64, name: &str, team_id: i64) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO managers (name, team_id, api_id, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(api_id) DO UPDATE SET
                     name = excluded.name,
                     team_id = excluded.team_id,
                     updated_at = excluded.updated_at",
                params![name, team_id, api_id, now()],
            )
            .context("upsert manager")?;
        self.conn
            .query_row(
                "SELECT id FROM managers WHERE api_id = ?1",
                params![api_id],
                |row| row.get(0),
            )
            .optional()
            .context("lookup manager by api id")?
            .ok_or_else(|| anyhow!("manager {api_id} missing after upsert"))
    }

    /// Directory order is ascending surrogate id; the profile resolver's
    /// first-match policy depends on this being stable.
    pub fn managers(&self) -> Result<Vec<Manager>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, team_id, api_id FROM managers ORDER BY id ASC")
            .context("prepare managers query")?;
        let rows = stmt
            .query_map([], manager_from_row)
            .context("query managers")?;
        collect_rows(rows)
    }

    pub fn manager_for_team(&self, team_id: i64) -> Result<Option<Manager>> {
        self.conn
            .query_row(
                "SELECT id, name, team_id, api_id FROM managers WHERE team_id = ?1
                 ORDER BY id ASC LIMIT 1",
                params![team_id],
                manager_from_row,
            )
            .optional()
            .context("lookup manager for team")
    }

    // --- fixtures ---

    pub fn upsert_fixture(&self, fixture: &NewFixture<'_>) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO fixtures (home_team_id, away_team_id, league_id, season, match_date,
                                       home_score, away_score, status, api_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(api_id) DO UPDATE SET
                     home_score = excluded.home_score,
                     away_score = excluded.away_score,
                     status = excluded.status,
                     updated_at = excluded.updated_at",
                params![
                    fixture.home_team_id,
                    fixture.away_team_id,
                    fixture.league_id,
                    fixture.season,
                    fixture.match_date,
                    fixture.home_score,
                    fixture.away_score,
                    fixture.status,
                    fixture.api_id,
                    now(),
                ],
            )
            .context("upsert fixture")?;
        self.conn
            .query_row(
                "SELECT id FROM fixtures WHERE api_id = ?1",
                params![fixture.api_id],
                |row| row.get(0),
            )
            .optional()
            .context("lookup fixture by api id")?
            .ok_or_else(|| anyhow!("fixture {} missing after upsert", fixture.api_id))
    }

    pub fn fixtures(&self) -> Result<Vec<Fixture>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, home_team_id, away_team_id, league_id, season, match_date,
                        home_score, away_score, status, api_id
                 FROM fixtures ORDER BY id ASC",
            )
            .context("prepare fixtures query")?;
        let rows = stmt
            .query_map([], fixture_from_row)
            .context("query fixtures")?;
        collect_rows(rows)
    }

    // --- team season stats ---

    pub fn upsert_team_stats(
        &self,
        team_id: i64,
        season: &str,
        elo_rating: f64,
        goals_scored: i64,
        goals_conceded: i64,
        points_per_game: f64,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO team_stats (team_id, season, elo_rating, goals_scored, goals_conceded,
                                         points_per_game, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(team_id, season) DO UPDATE SET
                     elo_rating = excluded.elo_rating,
                     goals_scored = excluded.goals_scored,
                     goals_conceded = excluded.goals_conceded,
                     points_per_game = excluded.points_per_game,
                     updated_at = excluded.updated_at",
                params![
                    team_id,
                    season,
                    elo_rating,
                    goals_scored,
                    goals_conceded,
                    points_per_game,
                    now(),
                ],
            )
            .context("upsert team stats")?;
        self.conn
            .query_row(
                "SELECT id FROM team_stats WHERE team_id = ?1 AND season = ?2",
                params![team_id, season],
                |row| row.get(0),
            )
            .optional()
            .context("lookup team stats")?
            .ok_or_else(|| anyhow!("team stats ({team_id}, {season}) missing after upsert"))
    }

    pub fn team_stats(&self, team_id: i64, season: &str) -> Result<Option<TeamSeasonStats>> {
        self.conn
            .query_row(
                "SELECT id, team_id, season, elo_rating, goals_scored, goals_conceded, points_per_game
                 FROM team_stats WHERE team_id = ?1 AND season = ?2",
                params![team_id, season],
                stats_from_row,
            )
            .optional()
            .context("lookup team stats")
    }

    // --- tactical vectors ---

    pub fn upsert_tactical_vector(&self, manager_id: i64, m: &TacticalMetrics) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO tactical_vectors (
                     manager_id, pressing_intensity, possession_control, counter_attack_focus,
                     defensive_line_height, defensive_aggression, defensive_width,
                     offensive_width, offensive_depth, buildup_speed, buildup_passing_directness,
                     buildup_initiation, chance_creation_method, defensive_organization,
                     wing_play_emphasis, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                 ON CONFLICT(manager_id) DO UPDATE SET
                     pressing_intensity = excluded.pressing_intensity,
                     possession_control = excluded.possession_control,
                     counter_attack_focus = excluded.counter_attack_focus,
                     defensive_line_height = excluded.defensive_line_height,
                     defensive_aggression = excluded.defensive_aggression,
                     defensive_width = excluded.defensive_width,
                     offensive_width = excluded.offensive_width,
                     offensive_depth = excluded.offensive_depth,
                     buildup_speed = excluded.buildup_speed,
                     buildup_passing_directness = excluded.buildup_passing_directness,
                     buildup_initiation = excluded.buildup_initiation,
                     chance_creation_method = excluded.chance_creation_method,
                     defensive_organization = excluded.defensive_organization,
                     wing_play_emphasis = excluded.wing_play_emphasis,
                     updated_at = excluded.updated_at",
                params![
                    manager_id,
                    m.pressing_intensity,
                    m.possession_control,
                    m.counter_attack_focus,
                    m.defensive_line_height,
                    m.defensive_aggression,
                    m.defensive_width,
                    m.offensive_width,
                    m.offensive_depth,
                    m.buildup_speed,
                    m.buildup_passing_directness,
                    m.buildup_initiation,
                    m.chance_creation_method,
                    m.defensive_organization,
                    m.wing_play_emphasis,
                    now(),
                ],
            )
            .context("upsert tactical vector")?;
        self.conn
            .query_row(
                "SELECT id FROM tactical_vectors WHERE manager_id = ?1",
                params![manager_id],
                |row| row.get(0),
            )
            .optional()
            .context("lookup tactical vector")?
            .ok_or_else(|| anyhow!("tactical vector for manager {manager_id} missing after upsert"))
    }

    pub fn tactical_vector(&self, manager_id: i64) -> Result<Option<TacticalVector>> {
        self.conn
            .query_row(
                "SELECT id, manager_id, pressing_intensity, possession_control,
                        counter_attack_focus, defensive_line_height, defensive_aggression,
                        defensive_width, offensive_width, offensive_depth, buildup_speed,
                        buildup_passing_directness, buildup_initiation, chance_creation_method,
                        defensive_organization, wing_play_emphasis
                 FROM tactical_vectors WHERE manager_id = ?1",
                params![manager_id],
                vector_from_row,
            )
            .optional()
            .context("lookup tactical vector")
    }

    // --- tactical matchups (create-once) ---

    pub fn matchup(&self, fixture_id: i64) -> Result<Option<TacticalMatchup>> {
        self.conn
            .query_row(
                "SELECT id, fixture_id, cosine_similarity, euclidean_distance, pressing_mismatch,
                        possession_defense_mismatch, counter_defense_mismatch,
                        buildup_pressing_mismatch, wing_width_mismatch
                 FROM tactical_matchups WHERE fixture_id = ?1",
                params![fixture_id],
                matchup_from_row,
            )
            .optional()
            .context("lookup tactical matchup")
    }

    pub fn insert_matchup(&self, fixture_id: i64, m: &MatchupMetrics) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO tactical_matchups (fixture_id, cosine_similarity, euclidean_distance,
                     pressing_mismatch, possession_defense_mismatch, counter_defense_mismatch,
                     buildup_pressing_mismatch, wing_width_mismatch, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    fixture_id,
                    m.cosine_similarity,
                    m.euclidean_distance,
                    m.pressing_mismatch,
                    m.possession_defense_mismatch,
                    m.counter_defense_mismatch,
                    m.buildup_pressing_mismatch,
                    m.wing_width_mismatch,
                    now(),
                ],
            )
            .context("insert tactical matchup")?;
        Ok(self.conn.last_insert_rowid())
    }

    // --- enhanced matches (create-once) ---

    pub fn enhanced(&self, fixture_id: i64) -> Result<Option<EnhancedMatch>> {
        self.conn
            .query_row(
                "SELECT id, fixture_id, cosine_similarity, euclidean_distance, pressing_mismatch,
                        possession_defense_mismatch, counter_defense_mismatch,
                        buildup_pressing_mismatch, wing_width_mismatch, elo_difference,
                        goal_diff_difference, ppg_difference, home_elo, away_elo,
                        home_goals_scored, away_goals_scored, home_goals_conceded,
                        away_goals_conceded, home_ppg, away_ppg, result
                 FROM enhanced_matches WHERE fixture_id = ?1",
                params![fixture_id],
                enhanced_from_row,
            )
            .optional()
            .context("lookup enhanced match")
    }

    pub fn insert_enhanced(&self, fixture_id: i64, f: &EnhancedFeatures) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO enhanced_matches (fixture_id, cosine_similarity, euclidean_distance,
                     pressing_mismatch, possession_defense_mismatch, counter_defense_mismatch,
                     buildup_pressing_mismatch, wing_width_mismatch, elo_difference,
                     goal_diff_difference, ppg_difference, home_elo, away_elo, home_goals_scored,
                     away_goals_scored, home_goals_conceded, away_goals_conceded, home_ppg,
                     away_ppg, result, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                         ?17, ?18, ?19, ?20, ?21)",
                params![
                    fixture_id,
                    f.matchup.cosine_similarity,
                    f.matchup.euclidean_distance,
                    f.matchup.pressing_mismatch,
                    f.matchup.possession_defense_mismatch,
                    f.matchup.counter_defense_mismatch,
                    f.matchup.buildup_pressing_mismatch,
                    f.matchup.wing_width_mismatch,
                    f.elo_difference,
                    f.goal_diff_difference,
                    f.ppg_difference,
                    f.home_elo,
                    f.away_elo,
                    f.home_goals_scored,
                    f.away_goals_scored,
                    f.home_goals_conceded,
                    f.away_goals_conceded,
                    f.home_ppg,
                    f.away_ppg,
                    f.result,
                    now(),
                ],
            )
            .context("insert enhanced match")?;
        Ok(self.conn.last_insert_rowid())
    }

    // --- predictions (create-once per (fixture, model)) ---

    pub fn has_prediction(&self, fixture_id: i64, model_name: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM predictions WHERE fixture_id = ?1 AND model_name = ?2",
                params![fixture_id, model_name],
                |row| row.get(0),
            )
            .context("probe prediction")?;
        Ok(count > 0)
    }

    pub fn insert_prediction(
        &self,
        fixture_id: i64,
        model_name: &str,
        output: &ModelOutput,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO predictions (fixture_id, model_name, home_win_probability,
                     draw_probability, away_win_probability, predicted_result, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    fixture_id,
                    model_name,
                    output.home_win_probability,
                    output.draw_probability,
                    output.away_win_probability,
                    output.predicted_result,
                    now(),
                ],
            )
            .context("insert prediction")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn prediction(&self, fixture_id: i64, model_name: &str) -> Result<Option<Prediction>> {
        self.conn
            .query_row(
                "SELECT id, fixture_id, model_name, home_win_probability, draw_probability,
                        away_win_probability, predicted_result
                 FROM predictions WHERE fixture_id = ?1 AND model_name = ?2",
                params![fixture_id, model_name],
                prediction_from_row,
            )
            .optional()
            .context("lookup prediction")
    }

    // --- summary ---

    pub fn entity_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        const TABLES: &[&str] = &[
            "leagues",
            "teams",
            "managers",
            "fixtures",
            "team_stats",
            "tactical_vectors",
            "tactical_matchups",
            "enhanced_matches",
            "predictions",
        ];
        let mut out = Vec::with_capacity(TABLES.len());
        for table in TABLES {
            let count: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .with_context(|| format!("count rows in {table}"))?;
            out.push((*table, count));
        }
        Ok(out)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode row")?);
    }
    Ok(out)
}

fn league_from_row(row: &Row<'_>) -> rusqlite::Result<League> {
    Ok(League {
        id: row.get(0)?,
        name: row.get(1)?,
        country: row.get(2)?,
        api_id: row.get(3)?,
    })
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        league_id: row.get(2)?,
        logo_url: row.get(3)?,
        api_id: row.get(4)?,
    })
}

fn manager_from_row(row: &Row<'_>) -> rusqlite::Result<Manager> {
    Ok(Manager {
        id: row.get(0)?,
        name: row.get(1)?,
        team_id: row.get(2)?,
        api_id: row.get(3)?,
    })
}

fn fixture_from_row(row: &Row<'_>) -> rusqlite::Result<Fixture> {
    Ok(Fixture {
        id: row.get(0)?,
        home_team_id: row.get(1)?,
        away_team_id: row.get(2)?,
        league_id: row.get(3)?,
        season: row.get(4)?,
        match_date: row.get(5)?,
        home_score: row.get(6)?,
        away_score: row.get(7)?,
        status: row.get(8)?,
        api_id: row.get(9)?,
    })
}

fn stats_from_row(row: &Row<'_>) -> rusqlite::Result<TeamSeasonStats> {
    Ok(TeamSeasonStats {
        id: row.get(0)?,
        team_id: row.get(1)?,
        season: row.get(2)?,
        elo_rating: row.get(3)?,
        goals_scored: row.get(4)?,
        goals_conceded: row.get(5)?,
        points_per_game: row.get(6)?,
    })
}

fn vector_from_row(row: &Row<'_>) -> rusqlite::Result<TacticalVector> {
    Ok(TacticalVector {
        id: row.get(0)?,
        manager_id: row.get(1)?,
        metrics: TacticalMetrics {
            pressing_intensity: row.get(2)?,
            possession_control: row.get(3)?,
            counter_attack_focus: row.get(4)?,
            defensive_line_height: row.get(5)?,
            defensive_aggression: row.get(6)?,
            defensive_width: row.get(7)?,
            offensive_width: row.get(8)?,
            offensive_depth: row.get(9)?,
            buildup_speed: row.get(10)?,
            buildup_passing_directness: row.get(11)?,
            buildup_initiation: row.get(12)?,
            chance_creation_method: row.get(13)?,
            defensive_organization: row.get(14)?,
            wing_play_emphasis: row.get(15)?,
        },
    })
}

fn matchup_from_row(row: &Row<'_>) -> rusqlite::Result<TacticalMatchup> {
    Ok(TacticalMatchup {
        id: row.get(0)?,
        fixture_id: row.get(1)?,
        metrics: MatchupMetrics {
            cosine_similarity: row.get(2)?,
            euclidean_distance: row.get(3)?,
            pressing_mismatch: row.get(4)?,
            possession_defense_mismatch: row.get(5)?,
            counter_defense_mismatch: row.get(6)?,
            buildup_pressing_mismatch: row.get(7)?,
            wing_width_mismatch: row.get(8)?,
        },
    })
}

fn enhanced_from_row(row: &Row<'_>) -> rusqlite::Result<EnhancedMatch> {
    Ok(EnhancedMatch {
        id: row.get(0)?,
        fixture_id: row.get(1)?,
        features: EnhancedFeatures {
            matchup: MatchupMetrics {
                cosine_similarity: row.get(2)?,
                euclidean_distance: row.get(3)?,
                pressing_mismatch: row.get(4)?,
                possession_defense_mismatch: row.get(5)?,
                counter_defense_mismatch: row.get(6)?,
                buildup_pressing_mismatch: row.get(7)?,
                wing_width_mismatch: row.get(8)?,
            },
            elo_difference: row.get(9)?,
            goal_diff_difference: row.get(10)?,
            ppg_difference: row.get(11)?,
            home_elo: row.get(12)?,
            away_elo: row.get(13)?,
            home_goals_scored: row.get(14)?,
            away_goals_scored: row.get(15)?,
            home_goals_conceded: row.get(16)?,
            away_goals_conceded: row.get(17)?,
            home_ppg: row.get(18)?,
            away_ppg: row.get(19)?,
            result: row.get(20)?,
        },
    })
}

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<Prediction> {
    Ok(Prediction {
        id: row.get(0)?,
        fixture_id: row.get(1)?,
        model_name: row.get(2)?,
        home_win_probability: row.get(3)?,
        draw_probability: row.get(4)?,
        away_win_probability: row.get(5)?,
        predicted_result: row.get(6)?,
    })
}
