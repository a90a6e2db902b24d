use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Result, RosterError};

/// Timezone the calendar and reports use unless told otherwise.
pub const DEFAULT_TIMEZONE: &str = "America/Toronto";

const WEEKDAYS_FR: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Parses calendar timestamps and converts them for display.
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler with the given IANA timezone name as the default.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Parse an ISO 8601 timestamp, keeping its UTC offset.
    ///
    /// Accepts RFC 3339 (`Z` or `±HH:MM`) and naive `YYYY-MM-DDTHH:MM:SS`
    /// forms; naive values are read in the handler's default timezone.
    pub fn parse_timestamp(&self, s: &str) -> Result<DateTime<FixedOffset>> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RosterError::TimestampParse(s.to_string()));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt);
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FMTS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, fmt) {
                use chrono::TimeZone as _;
                if let chrono::LocalResult::Single(dt) =
                    self.default_tz.from_local_datetime(&naive)
                {
                    return Ok(dt.fixed_offset());
                }
            }
        }

        Err(RosterError::TimestampParse(s.to_string()))
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Express any instant in the handler's timezone.
    pub fn to_local<O: chrono::TimeZone>(&self, dt: &DateTime<O>) -> DateTime<Tz> {
        dt.with_timezone(&self.default_tz)
    }

    /// Current time in the handler's timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.default_tz)
    }

    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// Parse a `YYYY-MM-DD` calendar date, as accepted by the calendar API.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| RosterError::Config(format!("invalid date \"{s}\": {e}")))
}

/// French long form used on shift listings, e.g. `"lundi 8 décembre 18h"`.
pub fn format_date_fr<Z: chrono::TimeZone>(dt: &DateTime<Z>) -> String {
    let weekday = WEEKDAYS_FR[dt.weekday().num_days_from_monday() as usize];
    let month = MONTHS_FR[dt.month0() as usize];
    format!("{} {} {} {:02}h", weekday, dt.day(), month, dt.hour())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
