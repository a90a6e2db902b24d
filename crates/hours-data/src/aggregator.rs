//! Identity resolution and hour accumulation over calendar events.
//!
//! Every sign-up is attached to a [`Member`]: first by exact e-mail hash,
//! then by fuzzy inscription match against every alias already known, and
//! otherwise a new member is created. Members are kept in creation order and
//! are never merged after the fact.

use hours_core::inscription::{compare_inscriptions, extract_division};
use hours_core::models::{Member, SignupRecord};
use hours_core::time_utils::TimezoneHandler;
use hours_core::Result;
use tracing::{debug, warn};

use crate::teamup::{EventFilter, TeamupEvent};

// ── Resolution ────────────────────────────────────────────────────────────────

/// How a sign-up was attached to a member; carries the member's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    ByEmailHash(usize),
    ByInscription(usize),
    Created(usize),
}

impl Resolution {
    pub fn member_index(&self) -> usize {
        match *self {
            Resolution::ByEmailHash(i) | Resolution::ByInscription(i) | Resolution::Created(i) => i,
        }
    }
}

// ── MemberRegistry ────────────────────────────────────────────────────────────

/// The set of members built by one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct MemberRegistry {
    members: Vec<Member>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every member.
    pub fn reset(&mut self) {
        self.members.clear();
    }

    /// Members in creation order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn into_members(self) -> Vec<Member> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Index of the member owning `hash`.
    pub fn find_by_email_hash(&self, hash: &str) -> Option<usize> {
        self.members.iter().position(|m| m.has_email_hash(hash))
    }

    /// Index of the first member with an alias equivalent to `inscription`.
    ///
    /// Members are scanned in creation order and aliases in insertion order,
    /// so the result is deterministic for a given input order.
    pub fn find_by_inscription(&self, inscription: &str) -> Option<usize> {
        self.members.iter().position(|m| {
            m.aliases()
                .iter()
                .any(|alias| compare_inscriptions(inscription, alias))
        })
    }

    /// Attach one sign-up to a member and add its hours.
    ///
    /// Fails with `MalformedEventSpan` before touching any member when the
    /// record's span ends before it starts.
    pub fn resolve_and_accumulate(&mut self, record: &SignupRecord) -> Result<Resolution> {
        let hours = record.event_span.duration_hours()?;
        let division = extract_division(&record.display_name);
        let email_hash = record.usable_email_hash();

        if let Some(idx) = email_hash.and_then(|h| self.find_by_email_hash(h)) {
            self.members[idx].absorb(&record.display_name, hours, &division);
            debug!(member = idx, name = %record.display_name, "matched by email hash");
            return Ok(Resolution::ByEmailHash(idx));
        }

        if let Some(idx) = self.find_by_inscription(&record.display_name) {
            let member = &mut self.members[idx];
            member.absorb(&record.display_name, hours, &division);
            if let Some(hash) = email_hash {
                member.add_email_hash(hash);
            }
            debug!(member = idx, name = %record.display_name, "matched by inscription");
            return Ok(Resolution::ByInscription(idx));
        }

        self.members.push(Member::new(
            record.display_name.clone(),
            email_hash,
            hours,
            division,
        ));
        let idx = self.members.len() - 1;
        debug!(member = idx, name = %record.display_name, "new member");
        Ok(Resolution::Created(idx))
    }

    /// Resolve every sign-up of `event`, in listed order.
    ///
    /// The span is validated first, so a malformed event leaves the registry
    /// untouched. Returns the number of sign-ups recorded.
    pub fn record_event(&mut self, event: &TeamupEvent, tz: &TimezoneHandler) -> Result<usize> {
        let span = event.span(tz)?;
        span.duration_hours()?;

        let records = event.signup_records(span);
        for record in &records {
            self.resolve_and_accumulate(record)?;
        }
        Ok(records.len())
    }
}

// ── Aggregation report ────────────────────────────────────────────────────────

/// An event left out of a report, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    pub event_id: String,
    pub title: String,
    pub reason: String,
}

impl SkippedEvent {
    pub fn new(event: &TeamupEvent, reason: impl ToString) -> Self {
        Self {
            event_id: event.id.clone(),
            title: event.title.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Output of [`HoursAggregator::aggregate`].
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    /// Members in creation order.
    pub members: Vec<Member>,
    /// Events that matched the filter and were counted.
    pub events_counted: usize,
    /// Sign-ups resolved across all counted events.
    pub signups_counted: usize,
    /// Matching events that could not be counted.
    pub skipped: Vec<SkippedEvent>,
}

impl AggregationReport {
    /// Sum of every member's hours.
    pub fn total_hours(&self) -> f64 {
        self.members.iter().map(Member::total_hours).sum()
    }
}

/// Stateless driver running a fresh [`MemberRegistry`] over a batch of events.
pub struct HoursAggregator;

impl HoursAggregator {
    /// Aggregate the events selected by `filter`, in input order.
    ///
    /// A malformed event is reported in [`AggregationReport::skipped`] and
    /// does not stop the remaining events from being counted.
    pub fn aggregate(
        events: &[TeamupEvent],
        filter: &EventFilter,
        tz: &TimezoneHandler,
    ) -> AggregationReport {
        let mut registry = MemberRegistry::new();
        let mut report = AggregationReport::default();

        for event in events.iter().filter(|e| filter.matches(e)) {
            match registry.record_event(event, tz) {
                Ok(count) => {
                    report.events_counted += 1;
                    report.signups_counted += count;
                }
                Err(e) => {
                    warn!(event = %event.id, title = %event.title, error = %e, "skipping event");
                    report.skipped.push(SkippedEvent::new(event, e));
                }
            }
        }

        debug!(
            "Aggregated {} events, {} sign-ups into {} members ({} skipped)",
            report.events_counted,
            report.signups_counted,
            registry.len(),
            report.skipped.len()
        );

        report.members = registry.into_members();
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
