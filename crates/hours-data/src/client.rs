//! HTTP client for the Teamup `events` endpoint.
//!
//! Requests are retried on transport errors and 5xx answers with a short
//! linear back-off; 4xx answers fail immediately. The calendar key is part of
//! the URL path and is masked in every log line and error message.

use std::time::Duration;

use chrono::NaiveDate;
use hours_core::{Result, RosterError};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::teamup::EventsResponse;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum number of fetch attempts before giving up.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Back-off step: attempt `n` waits `n × step` before firing.
pub const RETRY_STEP: Duration = Duration::from_millis(100);

const KEY_MASK: &str = "<calendar-key>";

/// Parameters of one `events` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// IANA timezone the calendar should express times in.
    pub timezone: String,
}

pub struct TeamupClient {
    client: Client,
    base_url: String,
    calendar_key: String,
    max_attempts: u32,
    retry_step: Duration,
}

impl TeamupClient {
    pub fn new(base_url: impl Into<String>, calendar_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("volunteer-hours/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RosterError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            calendar_key: calendar_key.into(),
            max_attempts: MAX_RETRY_ATTEMPTS,
            retry_step: RETRY_STEP,
        })
    }

    /// Override the retry policy. `max_attempts` is clamped to at least 1.
    pub fn with_retry(mut self, max_attempts: u32, retry_step: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_step = retry_step;
        self
    }

    /// Full URL of the query, key included.
    pub fn events_url(&self, query: &EventQuery) -> Result<Url> {
        let raw = format!(
            "{}/{}/events",
            self.base_url.trim_end_matches('/'),
            self.calendar_key
        );
        let start = query.start.format("%Y-%m-%d").to_string();
        let end = query.end.format("%Y-%m-%d").to_string();
        Url::parse_with_params(
            &raw,
            &[
                ("startDate", start.as_str()),
                ("endDate", end.as_str()),
                ("tz", query.timezone.as_str()),
            ],
        )
        .map_err(|e| RosterError::Config(format!("invalid calendar URL: {e}")))
    }

    /// Fetch the raw JSON body of the query.
    pub async fn fetch_raw(&self, query: &EventQuery) -> Result<String> {
        let url = self.events_url(query)?;
        let shown = self.mask(url.as_str());
        let mut last_err = RosterError::Request("no attempt made".to_string());

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let wait = self.retry_step * attempt;
                debug!(attempt, wait_ms = wait.as_millis() as u64, "retrying fetch after back-off");
                tokio::time::sleep(wait).await;
            }

            match self.fetch_once(url.clone(), &shown).await {
                Ok(body) => {
                    debug!(url = %shown, bytes = body.len(), "calendar events fetched");
                    return Ok(body);
                }
                Err(e) if is_retryable(&e) => {
                    warn!(attempt, error = %e, "fetch attempt failed");
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err)
    }

    /// Fetch and decode the query.
    pub async fn fetch_events(&self, query: &EventQuery) -> Result<EventsResponse> {
        let body = self.fetch_raw(query).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_once(&self, url: Url, shown: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RosterError::Request(self.mask(&e.without_url().to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RosterError::Api {
                status: status.as_u16(),
                url: shown.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| RosterError::Request(self.mask(&e.without_url().to_string())))
    }

    fn mask(&self, text: &str) -> String {
        if self.calendar_key.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.calendar_key, KEY_MASK)
        }
    }
}

fn is_retryable(err: &RosterError) -> bool {
    match err {
        RosterError::Request(_) => true,
        RosterError::Api { status, .. } => StatusCode::from_u16(*status)
            .map(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
            .unwrap_or(false),
        _ => false,
    }
}
