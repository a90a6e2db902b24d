//! Shift coverage: how many members signed up against how many were asked
//! for, per shift and per location.

use chrono::{DateTime, FixedOffset, Utc};
use hours_core::time_utils::TimezoneHandler;
use hours_core::Result;
use tracing::warn;

use crate::aggregator::SkippedEvent;
use crate::teamup::{EventFilter, TeamupEvent};

/// Below this many members a large shift is critically short.
const CRITICAL_HEADCOUNT: usize = 4;

/// Staffing state of one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStatus {
    /// Nobody signed up, or a single member on a shift that needs more.
    Unstaffed,
    /// Fewer than four members on a shift that needs more than four.
    CriticallyShort,
    /// Fewer members than requested.
    Short,
    /// At least as many members as requested.
    Complete,
}

impl CoverageStatus {
    /// Classify a shift; the first rule that applies wins.
    pub fn classify(signed_up: usize, requested: u32) -> Self {
        let requested = requested as usize;
        if signed_up == 0 || (signed_up == 1 && requested > 1) {
            CoverageStatus::Unstaffed
        } else if signed_up < CRITICAL_HEADCOUNT && requested > CRITICAL_HEADCOUNT {
            CoverageStatus::CriticallyShort
        } else if signed_up < requested {
            CoverageStatus::Short
        } else {
            CoverageStatus::Complete
        }
    }

    /// Label shown to coordinators.
    pub fn label_fr(&self) -> &'static str {
        match self {
            CoverageStatus::Unstaffed => "Aucun membre ou membre seul",
            CoverageStatus::CriticallyShort => "Manque de membres (< 4)",
            CoverageStatus::Short => "Manque de membres",
            CoverageStatus::Complete => "Complet",
        }
    }
}

/// Coverage of a single shift.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftCoverage {
    pub event_id: String,
    pub location: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub requested: u32,
    pub signed_up: usize,
    /// Inscriptions of the members signed up, in listed order.
    pub names: Vec<String>,
    pub status: CoverageStatus,
    /// The shift ended before `now`.
    pub finished: bool,
}

impl ShiftCoverage {
    pub fn from_event(
        event: &TeamupEvent,
        tz: &TimezoneHandler,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let span = event.span(tz)?;
        let requested = event.requested_members();
        let signed_up = event.signups.len();

        Ok(Self {
            event_id: event.id.clone(),
            location: event.location().to_string(),
            start: span.start,
            end: span.end,
            requested,
            signed_up,
            names: event.signups.iter().map(|s| s.name.clone()).collect(),
            status: CoverageStatus::classify(signed_up, requested),
            finished: span.end < now,
        })
    }

    /// Members still needed; negative when over-staffed.
    pub fn remaining(&self) -> i64 {
        i64::from(self.requested) - self.signed_up as i64
    }

    /// Status label, suffixed when the shift is over.
    pub fn status_label(&self) -> String {
        if self.finished {
            format!("{} - Terminé", self.status.label_fr())
        } else {
            self.status.label_fr().to_string()
        }
    }
}

/// Shifts sharing a location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCoverage {
    pub location: String,
    pub shifts: Vec<ShiftCoverage>,
}

impl LocationCoverage {
    /// Shifts at this location that are neither finished nor complete.
    pub fn open_gaps(&self) -> usize {
        self.shifts
            .iter()
            .filter(|s| !s.finished && s.status != CoverageStatus::Complete)
            .count()
    }
}

/// Coverage of every event selected by `filter`, in input order.
///
/// Events whose timestamps do not parse are returned as skipped.
pub fn build_coverage(
    events: &[TeamupEvent],
    filter: &EventFilter,
    tz: &TimezoneHandler,
    now: DateTime<Utc>,
) -> (Vec<ShiftCoverage>, Vec<SkippedEvent>) {
    let mut shifts = Vec::new();
    let mut skipped = Vec::new();

    for event in events.iter().filter(|e| filter.matches(e)) {
        match ShiftCoverage::from_event(event, tz, now) {
            Ok(shift) => shifts.push(shift),
            Err(e) => {
                warn!(event = %event.id, error = %e, "skipping event in coverage");
                skipped.push(SkippedEvent::new(event, e));
            }
        }
    }

    (shifts, skipped)
}

/// Group shifts by location, keeping first-seen location order and shift
/// order inside each location.
pub fn group_by_location(shifts: Vec<ShiftCoverage>) -> Vec<LocationCoverage> {
    let mut groups: Vec<LocationCoverage> = Vec::new();
    for shift in shifts {
        match groups.iter_mut().find(|g| g.location == shift.location) {
            Some(group) => group.shifts.push(shift),
            None => groups.push(LocationCoverage {
                location: shift.location.clone(),
                shifts: vec![shift],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_event(
        id: &str,
        location: &str,
        day: u32,
        names: &[&str],
        requested: u32,
    ) -> TeamupEvent {
        let signups: Vec<_> = names
            .iter()
            .map(|n| json!({ "name": n, "email_hash": format!("hash-{n}") }))
            .collect();
        serde_json::from_value(json!({
            "id": id,
            "title": format!("OPÉRATION NOBLE CAUSE - {location}"),
            "start_dt": format!("2025-12-{day:02}T18:00:00-05:00"),
            "end_dt": format!("2025-12-{day:02}T22:00:00-05:00"),
            "subcalendar_ids": [14169839],
            "signups": signups,
            "custom": { "nombre_de_membres_ne_cessaires": requested }
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-12-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tz() -> TimezoneHandler {
        TimezoneHandler::new("America/Toronto")
    }

    // ── CoverageStatus::classify ──────────────────────────────────────────────

    #[test]
    fn test_classify_nobody() {
        assert_eq!(CoverageStatus::classify(0, 0), CoverageStatus::Unstaffed);
        assert_eq!(CoverageStatus::classify(0, 3), CoverageStatus::Unstaffed);
    }

    #[test]
    fn test_classify_lone_member() {
        assert_eq!(CoverageStatus::classify(1, 2), CoverageStatus::Unstaffed);
        // Alone on a one-person shift is fine.
        assert_eq!(CoverageStatus::classify(1, 1), CoverageStatus::Complete);
    }

    #[test]
    fn test_classify_critically_short() {
        assert_eq!(CoverageStatus::classify(3, 6), CoverageStatus::CriticallyShort);
        assert_eq!(CoverageStatus::classify(2, 5), CoverageStatus::CriticallyShort);
        // Exactly four requested is not "more than four".
        assert_eq!(CoverageStatus::classify(3, 4), CoverageStatus::Short);
    }

    #[test]
    fn test_classify_short_and_complete() {
        assert_eq!(CoverageStatus::classify(4, 6), CoverageStatus::Short);
        assert_eq!(CoverageStatus::classify(6, 6), CoverageStatus::Complete);
        assert_eq!(CoverageStatus::classify(7, 6), CoverageStatus::Complete);
    }

    // ── ShiftCoverage ─────────────────────────────────────────────────────────

    #[test]
    fn test_shift_from_event() {
        let e = make_event("e1", "Hôtel Dieu", 12, &["Jean", "Lucie", "Marc"], 6);
        let shift = ShiftCoverage::from_event(&e, &tz(), now()).unwrap();

        assert_eq!(shift.location, "Hôtel Dieu");
        assert_eq!(shift.signed_up, 3);
        assert_eq!(shift.requested, 6);
        assert_eq!(shift.remaining(), 3);
        assert_eq!(shift.names, vec!["Jean", "Lucie", "Marc"]);
        assert_eq!(shift.status, CoverageStatus::CriticallyShort);
        assert!(!shift.finished);
        assert_eq!(shift.status_label(), "Manque de membres (< 4)");
    }

    #[test]
    fn test_shift_finished_label() {
        let e = make_event("e1", "YMCA", 1, &["Jean", "Lucie"], 2);
        let shift = ShiftCoverage::from_event(&e, &tz(), now()).unwrap();
        assert!(shift.finished);
        assert_eq!(shift.status_label(), "Complet - Terminé");
    }

    #[test]
    fn test_shift_overstaffed_remaining_negative() {
        let e = make_event("e1", "YMCA", 12, &["A", "B", "C"], 2);
        let shift = ShiftCoverage::from_event(&e, &tz(), now()).unwrap();
        assert_eq!(shift.remaining(), -1);
    }

    // ── build_coverage / group_by_location ────────────────────────────────────

    #[test]
    fn test_build_coverage_filters_and_skips() {
        let mut broken = make_event("e3", "YMCA", 12, &[], 2);
        broken.start_dt = "n/a".to_string();
        let mut foreign = make_event("e4", "YMCA", 12, &[], 2);
        foreign.title = "Réunion - YMCA".to_string();

        let events = vec![
            make_event("e1", "Hôtel Dieu", 11, &["Jean"], 1),
            make_event("e2", "YMCA", 12, &[], 2),
            broken,
            foreign,
        ];

        let (shifts, skipped) = build_coverage(&events, &EventFilter::default(), &tz(), now());
        let ids: Vec<&str> = shifts.iter().map(|s| s.event_id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].event_id, "e3");
    }

    #[test]
    fn test_group_by_location_keeps_order() {
        let events = vec![
            make_event("e1", "YMCA Centre-ville", 11, &["Jean"], 1),
            make_event("e2", "Hôtel Dieu", 1, &[], 2),
            make_event("e3", "YMCA Centre-ville", 12, &[], 2),
            make_event("e4", "Hôtel Dieu", 12, &["A", "B"], 2),
        ];
        let (shifts, _) = build_coverage(&events, &EventFilter::default(), &tz(), now());
        let groups = group_by_location(shifts);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].location, "YMCA Centre-ville");
        assert_eq!(groups[1].location, "Hôtel Dieu");
        let ymca_ids: Vec<&str> = groups[0].shifts.iter().map(|s| s.event_id.as_str()).collect();
        assert_eq!(ymca_ids, vec!["e1", "e3"]);
        // e2 is unstaffed but finished before `now`; e4 is complete.
        assert_eq!(groups[1].open_gaps(), 0);
        assert_eq!(groups[0].open_gaps(), 1);
    }
}
