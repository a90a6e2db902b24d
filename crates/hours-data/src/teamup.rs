//! Wire model of the Teamup `events` endpoint and the operation filter.
//!
//! Only the fields the reports need are modelled; everything else in the
//! payload is ignored.

use hours_core::models::{EventSpan, SignupRecord};
use hours_core::settings::{DEFAULT_SUBCALENDAR_ID, DEFAULT_TITLE_PREFIX};
use hours_core::time_utils::TimezoneHandler;
use hours_core::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Custom field holding the number of members a shift needs.
pub const REQUESTED_MEMBERS_FIELD: &str = "nombre_de_membres_ne_cessaires";

/// Top-level body returned by `GET /{calendar}/events`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<TeamupEvent>,
}

/// One calendar event (a shift).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamupEvent {
    /// Event id; Teamup sends strings, older exports plain numbers.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start_dt: String,
    pub end_dt: String,
    #[serde(default)]
    pub subcalendar_ids: Vec<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub signups: Vec<TeamupSignup>,
    /// Calendar-specific custom fields.
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

/// A volunteer's registration on an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamupSignup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub email_hash: Option<String>,
}

impl TeamupEvent {
    /// Parse the event's start and end timestamps.
    pub fn span(&self, tz: &TimezoneHandler) -> Result<EventSpan> {
        let start = tz.parse_timestamp(&self.start_dt)?;
        let end = tz.parse_timestamp(&self.end_dt)?;
        Ok(EventSpan::new(start, end))
    }

    /// Sign-ups of this event as records carrying `span`, in listed order.
    pub fn signup_records(&self, span: EventSpan) -> Vec<SignupRecord> {
        self.signups
            .iter()
            .map(|s| SignupRecord {
                email_hash: s.email_hash.clone(),
                display_name: s.name.clone(),
                event_span: span,
            })
            .collect()
    }

    /// Location part of the title: the text after the first `-`, trimmed.
    ///
    /// `"OPÉRATION NOBLE CAUSE - Hôtel Dieu"` → `"Hôtel Dieu"`.
    pub fn location(&self) -> &str {
        self.title
            .split_once('-')
            .map(|(_, rest)| rest.trim())
            .unwrap_or("")
    }

    /// Number of members requested for the shift; `0` when absent or not a
    /// whole number.
    pub fn requested_members(&self) -> u32 {
        match self.custom.get(REQUESTED_MEMBERS_FIELD) {
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0),
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

// ── EventFilter ───────────────────────────────────────────────────────────────

/// Selects the events that belong to the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub subcalendar_id: u64,
    pub title_prefix: String,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            subcalendar_id: DEFAULT_SUBCALENDAR_ID,
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
        }
    }
}

impl EventFilter {
    pub fn new(subcalendar_id: u64, title_prefix: impl Into<String>) -> Self {
        Self {
            subcalendar_id,
            title_prefix: title_prefix.into(),
        }
    }

    /// `true` when the event sits on the sub-calendar and its title has the
    /// prefix.
    pub fn matches(&self, event: &TeamupEvent) -> bool {
        event.subcalendar_ids.contains(&self.subcalendar_id)
            && event.title.starts_with(&self.title_prefix)
    }
}

// ── serde helpers ─────────────────────────────────────────────────────────────

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
