mod bootstrap;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use hours_core::settings::{Command, Settings};
use hours_core::time_utils::TimezoneHandler;
use hours_data::aggregator::HoursAggregator;
use hours_data::client::{EventQuery, TeamupClient};
use hours_data::coverage::{build_coverage, group_by_location};
use hours_data::reader;
use hours_data::teamup::{EventFilter, TeamupEvent};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used().unwrap_or_else(|e| e.exit());

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("volunteer-hours v{} starting", env!("CARGO_PKG_VERSION"));

    let tz = TimezoneHandler::new(&settings.timezone);
    let filter = EventFilter::new(settings.subcalendar_id, settings.title_prefix.clone());

    let events = load_events(&settings, &tz).await?;
    tracing::info!("{} events loaded", events.len());

    match settings.command {
        Command::Hours { details } => {
            let report = HoursAggregator::aggregate(&events, &filter, &tz);
            print!("{}", report::render_hours(&report, details));
        }
        Command::Coverage => {
            let (shifts, skipped) = build_coverage(&events, &filter, &tz, Utc::now());
            let groups = group_by_location(shifts);
            print!("{}", report::render_coverage(&groups, &skipped, &tz));
        }
    }

    Ok(())
}

/// Read events from `--events-file` when given, otherwise fetch them from the
/// calendar API for the configured date range.
async fn load_events(settings: &Settings, tz: &TimezoneHandler) -> Result<Vec<TeamupEvent>> {
    if let Some(path) = &settings.events_file {
        tracing::info!("Reading events from {}", path.display());
        return reader::load_events(path)
            .with_context(|| format!("cannot load events from {}", path.display()));
    }

    let key = settings.require_calendar_key()?;
    let (start, end) = settings.date_range(tz.now().date_naive())?;
    let query = EventQuery {
        start,
        end,
        timezone: tz.default_tz().name().to_string(),
    };

    tracing::info!("Fetching events from {} to {}", start, end);
    let client = TeamupClient::new(settings.api_base.clone(), key)?;
    let raw = client
        .fetch_raw(&query)
        .await
        .context("cannot fetch calendar events")?;

    if settings.save_snapshot {
        match reader::save_snapshot(&bootstrap::cache_dir(), &raw, Utc::now()) {
            Ok(path) => tracing::info!("Snapshot saved to {}", path.display()),
            Err(e) => tracing::warn!("Could not save snapshot: {}", e),
        }
    }

    Ok(reader::parse_events(&raw)?)
}
