use chrono::{Duration, NaiveDate};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, RosterError};
use crate::time_utils::{self, DEFAULT_TIMEZONE};

/// Sub-calendar holding the operation's shifts.
pub const DEFAULT_SUBCALENDAR_ID: u64 = 14169839;

/// Title prefix shared by every shift of the operation.
pub const DEFAULT_TITLE_PREFIX: &str = "OPÉRATION NOBLE CAUSE";

/// Base URL of the calendar API.
pub const DEFAULT_API_BASE: &str = "https://teamup.com";

/// Days before and after today covered when no date range is given.
const DEFAULT_WINDOW_DAYS: i64 = 30;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Volunteer hours and shift coverage from a Teamup calendar
#[derive(Parser, Debug, Clone)]
#[command(
    name = "volunteer-hours",
    about = "Volunteer hours and shift coverage from a Teamup calendar",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Teamup calendar key (never persisted)
    #[arg(long, env = "TEAMUP_CALENDAR_KEY", hide_env_values = true)]
    pub calendar_key: Option<String>,

    /// First day to fetch (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day to fetch (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Timezone for the calendar query and report dates ("auto" = system)
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,

    /// Sub-calendar whose events are counted
    #[arg(long, default_value_t = DEFAULT_SUBCALENDAR_ID)]
    pub subcalendar_id: u64,

    /// Only events whose title starts with this prefix are counted
    #[arg(long, default_value = DEFAULT_TITLE_PREFIX)]
    pub title_prefix: String,

    /// Read events from a saved JSON file or directory instead of the API
    #[arg(long)]
    pub events_file: Option<PathBuf>,

    /// Save the fetched calendar response into the cache directory
    #[arg(long)]
    pub save_snapshot: bool,

    /// Calendar API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

/// Report to produce.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Hours volunteered per member
    Hours {
        /// Also print every alias and e-mail hash of each member
        #[arg(long)]
        details: bool,
    },
    /// Signed-up versus requested members for every shift
    Coverage,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.volunteer-hours/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcalendar_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_prefix: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".volunteer-hours").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> std::result::Result<Self, clap::Error> {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with an explicit argument
    /// list and config path, so tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> std::result::Result<Self, clap::Error> {
        let matches = Settings::command().try_get_matches_from(args)?;
        let mut settings = Settings::from_arg_matches(&matches)?;

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Ok(Self::resolve_auto_values(settings));
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "start_date") && settings.start_date.is_none() {
            settings.start_date = last.start_date;
        }
        if !is_arg_explicitly_set(&matches, "end_date") && settings.end_date.is_none() {
            settings.end_date = last.end_date;
        }
        if !is_arg_explicitly_set(&matches, "subcalendar_id") {
            if let Some(v) = last.subcalendar_id {
                settings.subcalendar_id = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "title_prefix") {
            if let Some(v) = last.title_prefix {
                settings.title_prefix = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used params");
        }

        Ok(settings)
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = time_utils::get_system_timezone();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// The date range to query, defaulting to a window around `today`.
    ///
    /// Fails when a date does not parse or the range is reversed.
    pub fn date_range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let start = match &self.start_date {
            Some(s) => time_utils::parse_date(s)?,
            None => today - Duration::days(DEFAULT_WINDOW_DAYS),
        };
        let end = match &self.end_date {
            Some(s) => time_utils::parse_date(s)?,
            None => today + Duration::days(DEFAULT_WINDOW_DAYS),
        };
        if end < start {
            return Err(RosterError::Config(format!(
                "end date {end} precedes start date {start}"
            )));
        }
        Ok((start, end))
    }

    /// The calendar key, or [`RosterError::MissingCalendarKey`].
    pub fn require_calendar_key(&self) -> Result<&str> {
        self.calendar_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(RosterError::MissingCalendarKey)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            timezone: Some(s.timezone.clone()),
            start_date: s.start_date.clone(),
            end_date: s.end_date.clone(),
            subcalendar_id: Some(s.subcalendar_id),
            title_prefix: Some(s.title_prefix.clone()),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
