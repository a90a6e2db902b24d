use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};

/// Start and end of a scheduled shift, with the calendar's UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpan {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl EventSpan {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    /// Length of the span in hours.
    ///
    /// Fails with [`RosterError::MalformedEventSpan`] when `end` precedes
    /// `start`. A zero-length span is valid and yields `0.0`.
    pub fn duration_hours(&self) -> Result<f64> {
        if self.end < self.start {
            return Err(RosterError::MalformedEventSpan {
                start: self.start.to_rfc3339(),
                end: self.end.to_rfc3339(),
            });
        }
        let secs = (self.end - self.start).num_seconds() as f64;
        Ok(secs / 3600.0)
    }
}

/// One person's registration to one shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRecord {
    /// Opaque hash of the e-mail used to sign up. May be absent or blank.
    #[serde(default)]
    pub email_hash: Option<String>,
    /// Free-text inscription typed by the volunteer.
    pub display_name: String,
    /// Span of the shift the sign-up belongs to.
    pub event_span: EventSpan,
}

impl SignupRecord {
    /// The e-mail hash, or `None` when it is missing or only whitespace.
    pub fn usable_email_hash(&self) -> Option<&str> {
        self.email_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

/// Organisational unit a member belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    #[default]
    Unknown,
    Code(String),
}

impl Division {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Division::Unknown)
    }

    /// Adopt `other` if this division is still unknown.
    ///
    /// Returns `true` when the value changed. A known division is never
    /// overwritten.
    pub fn merge_from(&mut self, other: &Division) -> bool {
        if self.is_unknown() && !other.is_unknown() {
            *self = other.clone();
            return true;
        }
        false
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Division::Unknown => f.write_str("unknown"),
            Division::Code(code) => f.write_str(code),
        }
    }
}

/// A resolved volunteer identity with the hours accumulated across shifts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    aliases: Vec<String>,
    email_hashes: Vec<String>,
    total_hours: f64,
    division: Division,
}

impl Member {
    /// Start a member from its first sign-up.
    pub fn new(
        alias: impl Into<String>,
        email_hash: Option<&str>,
        hours: f64,
        division: Division,
    ) -> Self {
        Self {
            aliases: vec![alias.into()],
            email_hashes: email_hash.map(str::to_string).into_iter().collect(),
            total_hours: hours,
            division,
        }
    }

    /// Every inscription seen for this member, in first-seen order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Every e-mail hash attached to this member, in first-seen order.
    pub fn email_hashes(&self) -> &[String] {
        &self.email_hashes
    }

    pub fn total_hours(&self) -> f64 {
        self.total_hours
    }

    pub fn division(&self) -> &Division {
        &self.division
    }

    /// The shortest alias (by character count); the earliest one on ties.
    pub fn display_alias(&self) -> &str {
        let mut best = self.aliases[0].as_str();
        let mut best_len = best.chars().count();
        for alias in &self.aliases[1..] {
            let len = alias.chars().count();
            if len < best_len {
                best = alias;
                best_len = len;
            }
        }
        best
    }

    pub fn has_email_hash(&self, hash: &str) -> bool {
        self.email_hashes.iter().any(|h| h == hash)
    }

    /// Fold one more shift into this member.
    pub fn absorb(&mut self, alias: &str, hours: f64, division: &Division) {
        self.total_hours += hours;
        if !self.aliases.iter().any(|a| a == alias) {
            self.aliases.push(alias.to_string());
        }
        self.division.merge_from(division);
    }

    /// Attach another e-mail hash. Duplicates are ignored.
    pub fn add_email_hash(&mut self, hash: &str) {
        if !self.has_email_hash(hash) {
            self.email_hashes.push(hash.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    // ── EventSpan ─────────────────────────────────────────────────────────────

    #[test]
    fn test_event_span_duration_hours() {
        let span = EventSpan::new(ts("2025-12-01T18:00:00-05:00"), ts("2025-12-01T21:30:00-05:00"));
        assert!((span.duration_hours().unwrap() - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_event_span_across_offsets() {
        // Same instant expressed in two offsets: 1 hour apart.
        let span = EventSpan::new(ts("2025-12-01T18:00:00-05:00"), ts("2025-12-02T00:00:00+00:00"));
        assert!((span.duration_hours().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_event_span_zero_length() {
        let t = ts("2025-12-01T18:00:00-05:00");
        assert_eq!(EventSpan::new(t, t).duration_hours().unwrap(), 0.0);
    }

    #[test]
    fn test_event_span_end_before_start() {
        let span = EventSpan::new(ts("2025-12-01T21:00:00-05:00"), ts("2025-12-01T18:00:00-05:00"));
        assert!(matches!(
            span.duration_hours(),
            Err(RosterError::MalformedEventSpan { .. })
        ));
    }

    // ── SignupRecord ──────────────────────────────────────────────────────────

    #[test]
    fn test_usable_email_hash_blank() {
        let t = ts("2025-12-01T18:00:00-05:00");
        let mut record = SignupRecord {
            email_hash: Some("   ".to_string()),
            display_name: "Jean".to_string(),
            event_span: EventSpan::new(t, t),
        };
        assert_eq!(record.usable_email_hash(), None);

        record.email_hash = None;
        assert_eq!(record.usable_email_hash(), None);

        record.email_hash = Some("abc123".to_string());
        assert_eq!(record.usable_email_hash(), Some("abc123"));
    }

    // ── Division ──────────────────────────────────────────────────────────────

    #[test]
    fn test_division_merge_from_unknown() {
        let mut div = Division::Unknown;
        assert!(div.merge_from(&Division::Code("1234".to_string())));
        assert_eq!(div, Division::Code("1234".to_string()));
    }

    #[test]
    fn test_division_merge_from_never_overwrites() {
        let mut div = Division::Code("1234".to_string());
        assert!(!div.merge_from(&Division::Code("5678".to_string())));
        assert!(!div.merge_from(&Division::Unknown));
        assert_eq!(div, Division::Code("1234".to_string()));
    }

    #[test]
    fn test_division_display() {
        assert_eq!(Division::Unknown.to_string(), "unknown");
        assert_eq!(Division::Code("prov".to_string()).to_string(), "prov");
    }

    // ── Member ────────────────────────────────────────────────────────────────

    #[test]
    fn test_member_absorb_accumulates() {
        let mut m = Member::new("sg Jean Dupont", Some("h1"), 2.0, Division::Unknown);
        m.absorb("Jean Dupont 1234", 1.5, &Division::Code("1234".to_string()));
        m.absorb("sg Jean Dupont", 0.5, &Division::Unknown);

        assert!((m.total_hours() - 4.0).abs() < f64::EPSILON);
        assert_eq!(m.aliases(), ["sg Jean Dupont", "Jean Dupont 1234"]);
        assert_eq!(m.division(), &Division::Code("1234".to_string()));
    }

    #[test]
    fn test_member_add_email_hash_dedupes() {
        let mut m = Member::new("Jean", Some("h1"), 1.0, Division::Unknown);
        m.add_email_hash("h2");
        m.add_email_hash("h1");
        assert_eq!(m.email_hashes(), ["h1", "h2"]);
    }

    #[test]
    fn test_member_without_email_hash() {
        let m = Member::new("Jean", None, 1.0, Division::Unknown);
        assert!(m.email_hashes().is_empty());
    }

    #[test]
    fn test_member_display_alias_shortest_first_on_tie() {
        let mut m = Member::new("sg Jean Dupont", None, 0.0, Division::Unknown);
        m.absorb("Jean Roy", 0.0, &Division::Unknown);
        m.absorb("Luc Roy", 0.0, &Division::Unknown);
        m.absorb("Max Roy", 0.0, &Division::Unknown);
        assert_eq!(m.display_alias(), "Luc Roy");
    }
}
