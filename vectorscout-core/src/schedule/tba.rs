//! The Blue Alliance v3 schedule client.
//!
//! Only qualification matches (`comp_level == "qm"`) are kept. Team keys look
//! like `frc5460`; a key that does not parse becomes team 0, which session
//! auto-fill ignores.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;

use crate::config::{ScheduleConfig, TBA_API_KEY_ENV};
use crate::error::{Error, Result};

use super::MatchScheduleEntry;

/// Header carrying the read API key.
const AUTH_HEADER: &str = "X-TBA-Auth-Key";

/// Source of remote schedules.
pub trait ScheduleFetcher {
    /// Qualification matches of an event, or `None` if the event is unknown.
    fn fetch_matches(
        &self,
        event_code: &str,
    ) -> impl Future<Output = Result<Option<Vec<MatchScheduleEntry>>>> + Send;
}

#[derive(Debug, Deserialize)]
struct TbaMatch {
    comp_level: String,
    match_number: u32,
    alliances: TbaAlliances,
}

#[derive(Debug, Deserialize)]
struct TbaAlliances {
    red: TbaAlliance,
    blue: TbaAlliance,
}

#[derive(Debug, Deserialize)]
struct TbaAlliance {
    team_keys: Vec<String>,
}

/// Parse a TBA `/event/{key}/matches` response.
///
/// The document must be a JSON array. Entries that are not well-formed
/// qualification matches are skipped.
pub fn parse_tba_matches(json: &str) -> Result<Vec<MatchScheduleEntry>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| Error::Schedule(format!("expected a JSON array of matches: {}", e)))?;

    let mut matches: Vec<MatchScheduleEntry> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<TbaMatch>(value) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed match");
                None
            }
        })
        .filter(|m| m.comp_level == "qm")
        .filter_map(to_entry)
        .collect();

    matches.sort_by_key(|m| m.match_number);
    Ok(matches)
}

fn to_entry(m: TbaMatch) -> Option<MatchScheduleEntry> {
    let red = &m.alliances.red.team_keys;
    let blue = &m.alliances.blue.team_keys;
    if red.len() < 3 || blue.len() < 3 {
        tracing::debug!(match_number = m.match_number, "skipping match without full alliances");
        return None;
    }
    Some(MatchScheduleEntry {
        match_number: m.match_number,
        red1: parse_team_key(&red[0]),
        red2: parse_team_key(&red[1]),
        red3: parse_team_key(&red[2]),
        blue1: parse_team_key(&blue[0]),
        blue2: parse_team_key(&blue[1]),
        blue3: parse_team_key(&blue[2]),
    })
}

/// `frc5460` -> 5460; anything else -> 0.
fn parse_team_key(key: &str) -> u32 {
    key.strip_prefix("frc")
        .unwrap_or(key)
        .parse()
        .unwrap_or(0)
}

/// HTTP client for The Blue Alliance API
pub struct TbaClient {
    config: ScheduleConfig,
    http_client: reqwest::Client,
    base_url: String,
}

impl TbaClient {
    /// Create a client from configuration.
    ///
    /// Fails if no API key is configured or set in `TBA_API_KEY`.
    pub fn new(config: ScheduleConfig) -> Result<Self> {
        config.validate()?;

        let api_key = config.resolved_api_key().ok_or_else(|| {
            Error::Config(format!(
                "schedule.api_key or {} is required to fetch schedules",
                TBA_API_KEY_ENV
            ))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTH_HEADER,
            HeaderValue::from_str(&api_key)
                .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            config,
            http_client,
            base_url,
        })
    }

    /// Fetch the qualification schedule of an event.
    ///
    /// Returns None if the event doesn't exist on the server.
    pub async fn fetch_event_matches(
        &self,
        event_code: &str,
    ) -> Result<Option<Vec<MatchScheduleEntry>>> {
        let url = format!(
            "{}/event/{}/matches",
            self.base_url,
            urlencoding::encode(event_code)
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Schedule(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| Error::Schedule(format!("failed to read response: {}", e)))?;
            Ok(Some(parse_tba_matches(&body)?))
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Schedule(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }

    /// Fetch with retry logic
    ///
    /// Retries transient failures (5xx, timeouts) with exponential backoff.
    pub async fn fetch_event_matches_with_retry(
        &self,
        event_code: &str,
    ) -> Result<Option<Vec<MatchScheduleEntry>>> {
        let mut last_error = None;
        let mut delay = Duration::from_millis(500);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "Retrying schedule fetch (attempt {}/{}), waiting {:?}",
                    attempt + 1,
                    self.config.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }

            match self.fetch_event_matches(event_code).await {
                Ok(matches) => return Ok(matches),
                Err(e) => {
                    if is_retryable_error(&e) {
                        tracing::warn!("Transient error fetching schedule: {}", e);
                        last_error = Some(e);
                        continue;
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Schedule("max retries exceeded".to_string())))
    }
}

impl ScheduleFetcher for TbaClient {
    async fn fetch_matches(&self, event_code: &str) -> Result<Option<Vec<MatchScheduleEntry>>> {
        self.fetch_event_matches_with_retry(event_code).await
    }
}

/// Check if an error is retryable (transient)
fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Schedule(msg) => {
            msg.contains("API error (5")
                || msg.contains("timeout")
                || msg.contains("connection")
                || msg.contains("request failed")
        }
        _ => false,
    }
}
