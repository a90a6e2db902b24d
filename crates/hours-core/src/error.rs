use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the volunteer-hours crates.
#[derive(Error, Debug)]
pub enum RosterError {
    /// An event ends before it starts; its hours cannot be counted.
    #[error("Malformed event span: end {end} precedes start {start}")]
    MalformedEventSpan { start: String, end: String },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The calendar API answered with a non-success status.
    #[error("Calendar API returned HTTP {status} for {url}")]
    Api { status: u16, url: String },

    /// The HTTP request itself failed (connect, timeout, body decode).
    #[error("Request failed: {0}")]
    Request(String),

    /// No calendar key was given on the command line or in the environment.
    #[error("No calendar key configured (use --calendar-key or TEAMUP_CALENDAR_KEY)")]
    MissingCalendarKey,

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the hours crates.
pub type Result<T> = std::result::Result<T, RosterError>;
