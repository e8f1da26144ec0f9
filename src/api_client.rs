use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;

use crate::config::AppConfig;
use crate::store::{ApiCallRecord, Store};

/// Blocking client for the football data source. Every call is audited into
/// the store's api_calls log, and the client self-throttles when the
/// remaining-quota header drops below the configured floor.
pub struct ApiClient {
    http: Client,
    base_url: String,
    host: String,
    api_key: String,
    quota_floor: i64,
    cooldown: Duration,
}

impl ApiClient {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            host: cfg.api_host().to_string(),
            api_key: cfg.api_key.clone(),
            quota_floor: cfg.quota_floor,
            cooldown: cfg.quota_cooldown,
        })
    }

    /// One synchronous GET. Non-2xx and transport faults are errors the
    /// caller treats as item-skip; the audit row is written either way and
    /// a failed audit write never fails the call.
    pub fn get(&self, store: &Store, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let query = encode_params(params);
        let started = Instant::now();

        let resp = self
            .http
            .get(&url)
            .query(params)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send();

        let resp = match resp {
            Ok(resp) => resp,
            Err(err) => {
                self.audit(store, endpoint, &query, None, 0, started);
                return Err(err).context("request failed");
            }
        };

        let status = resp.status();
        let remaining = quota_remaining(resp.headers());

        let body = match resp.text() {
            Ok(body) => body,
            Err(err) => {
                self.audit(store, endpoint, &query, Some(status.as_u16()), 0, started);
                return Err(err).context("failed reading body");
            }
        };
        self.audit(
            store,
            endpoint,
            &query,
            Some(status.as_u16()),
            body.len(),
            started,
        );

        // Throttle before surfacing the outcome so a failing burst cannot
        // burn through the remaining quota.
        if let Some(remaining) = remaining
            && remaining < self.quota_floor
        {
            println!("Warning: API rate limit approaching, {remaining} requests remaining");
            std::thread::sleep(self.cooldown);
        }

        if !status.is_success() {
            return Err(anyhow!("http {}: {}", status, body.trim()));
        }
        Ok(body)
    }

    fn audit(
        &self,
        store: &Store,
        endpoint: &str,
        parameters: &str,
        status_code: Option<u16>,
        response_size: usize,
        started: Instant,
    ) {
        let record = ApiCallRecord {
            endpoint,
            parameters,
            status_code,
            response_size,
            execution_time: started.elapsed().as_secs_f64(),
        };
        if let Err(err) = store.log_api_call(&record) {
            // Best-effort side channel; never affects control flow.
            println!("Warning: failed to log api call: {err:#}");
        }
    }
}

pub fn quota_remaining(headers: &HeaderMap) -> Option<i64> {
    for name in ["x-ratelimit-requests-remaining", "x-ratelimit-remaining"] {
        if let Some(value) = headers.get(name)
            && let Ok(raw) = value.to_str()
            && let Ok(remaining) = raw.trim().parse::<i64>()
        {
            return Some(remaining);
        }
    }
    None
}

fn encode_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}
