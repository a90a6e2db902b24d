//! Plain-text renderings of the hours and coverage reports.
//!
//! Output is tab-separated so it pastes cleanly into a spreadsheet.

use std::fmt::Write;

use hours_core::formatting::{format_hours, format_ratio, percentage};
use hours_core::time_utils::{format_date_fr, TimezoneHandler};
use hours_data::aggregator::{AggregationReport, SkippedEvent};
use hours_data::coverage::{LocationCoverage, ShiftCoverage};

// ── Hours ─────────────────────────────────────────────────────────────────────

/// One line per member in creation order, then a summary line.
pub fn render_hours(report: &AggregationReport, details: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Membre\tDivision\tHeures");

    for member in &report.members {
        let _ = writeln!(
            out,
            "{}\t{}\t{}",
            member.display_alias(),
            member.division(),
            format_hours(member.total_hours())
        );
        if details {
            let _ = writeln!(out, "\tinscriptions: {}", member.aliases().join(" | "));
            if !member.email_hashes().is_empty() {
                let _ = writeln!(out, "\tcourriels: {}", member.email_hashes().join(", "));
            }
        }
    }

    let _ = writeln!(
        out,
        "\n{} membres, {} quarts, {} heures au total",
        report.members.len(),
        report.events_counted,
        format_hours(report.total_hours())
    );
    write_skipped(&mut out, &report.skipped);
    out
}

// ── Coverage ──────────────────────────────────────────────────────────────────

/// Shifts grouped by location, with dates shown in `tz`.
pub fn render_coverage(
    groups: &[LocationCoverage],
    skipped: &[SkippedEvent],
    tz: &TimezoneHandler,
) -> String {
    let mut out = String::new();

    for group in groups {
        let title = if group.location.is_empty() {
            "(sans lieu)"
        } else {
            group.location.as_str()
        };
        let _ = writeln!(out, "== {} ({} à combler) ==", title, group.open_gaps());
        for shift in &group.shifts {
            write_shift(&mut out, shift, tz);
        }
        out.push('\n');
    }

    let shifts: Vec<&ShiftCoverage> = groups.iter().flat_map(|g| g.shifts.iter()).collect();
    let requested: u32 = shifts.iter().map(|s| s.requested).sum();
    let filled: usize = shifts
        .iter()
        .map(|s| s.signed_up.min(s.requested as usize))
        .sum();
    let _ = writeln!(
        out,
        "{} quarts, {} places comblées ({} %)",
        shifts.len(),
        format_ratio(filled, requested),
        percentage(filled as f64, f64::from(requested), 0)
    );
    write_skipped(&mut out, skipped);
    out
}

fn write_shift(out: &mut String, shift: &ShiftCoverage, tz: &TimezoneHandler) {
    let _ = writeln!(
        out,
        "{}\t{}\treste {}\t{}",
        format_date_fr(&tz.to_local(&shift.start)),
        format_ratio(shift.signed_up, shift.requested),
        shift.remaining(),
        shift.status_label()
    );
    if !shift.names.is_empty() {
        let _ = writeln!(out, "\t{}", shift.names.join(", "));
    }
}

fn write_skipped(out: &mut String, skipped: &[SkippedEvent]) {
    for s in skipped {
        let _ = writeln!(out, "ignoré: {} ({}): {}", s.title, s.event_id, s.reason);
    }
}
