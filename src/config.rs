use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://v3.football.api-sports.io";
pub const DEFAULT_SEASON: &str = "2024-2025";

const DEFAULT_LEAGUES: &[(&str, i64)] = &[
    ("Premier League", 39),
    ("La Liga", 140),
    ("Serie A", 135),
    ("Bundesliga", 78),
    ("Ligue 1", 61),
];

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUOTA_FLOOR: i64 = 5;
const DEFAULT_COOLDOWN_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct LeagueRef {
    /// Display name used on first insert; ids supplied via env carry no name
    /// and fall back to the name the API reports.
    pub name: Option<String>,
    pub api_id: i64,
}

/// All process configuration, resolved once at startup and passed by
/// reference into every component. No component reads the environment itself.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub season: String,
    pub leagues: Vec<LeagueRef>,
    pub db_path: PathBuf,
    pub profile_path: PathBuf,
    pub model_dir: PathBuf,
    pub request_timeout: Duration,
    pub quota_floor: i64,
    pub quota_cooldown: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("API_FOOTBALL_KEY")
            .context("API_FOOTBALL_KEY is not set (put it in .env or the environment)")?;

        let api_base_url = env_or("API_FOOTBALL_URL", DEFAULT_API_BASE_URL);
        let season = env_or("APP_SEASON", DEFAULT_SEASON);

        let leagues = match std::env::var("APP_LEAGUE_IDS") {
            Ok(raw) if !raw.trim().is_empty() => parse_ids(&raw)
                .into_iter()
                .map(|api_id| LeagueRef { name: None, api_id })
                .collect(),
            _ => DEFAULT_LEAGUES
                .iter()
                .map(|(name, api_id)| LeagueRef {
                    name: Some((*name).to_string()),
                    api_id: *api_id,
                })
                .collect(),
        };

        Ok(Self {
            api_base_url,
            api_key,
            season,
            leagues,
            db_path: PathBuf::from(env_or("APP_DB_PATH", "tactico.sqlite")),
            profile_path: PathBuf::from(env_or(
                "APP_PROFILE_CSV",
                "manager_tactical_vectors.csv",
            )),
            model_dir: PathBuf::from(env_or("APP_MODEL_DIR", "model")),
            request_timeout: Duration::from_secs(env_u64(
                "APP_REQUEST_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
            quota_floor: env_u64("APP_QUOTA_FLOOR", DEFAULT_QUOTA_FLOOR as u64) as i64,
            quota_cooldown: Duration::from_secs(env_u64(
                "APP_QUOTA_COOLDOWN_SECS",
                DEFAULT_COOLDOWN_SECS,
            )),
        })
    }

    /// Host header value expected by the API, derived from the base url.
    pub fn api_host(&self) -> &str {
        self.api_base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => default.to_string(),
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_ids(raw: &str) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    raw.split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .filter(|id| *id != 0)
        .filter(|id| seen.insert(*id))
        .collect()
}
