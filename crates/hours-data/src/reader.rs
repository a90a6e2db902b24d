//! Offline event sources: saved calendar responses on disk.
//!
//! A source is either one `.json` file or a directory scanned recursively for
//! them. Each file holds an `events` response as returned by the API, or a
//! bare array of events.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hours_core::{Result, RosterError};
use tracing::{debug, warn};

use crate::teamup::{EventsResponse, TeamupEvent};

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` files recursively under `data_path`, sorted by path.
pub fn find_json_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Parse one JSON document into events.
pub fn parse_events(content: &str) -> Result<Vec<TeamupEvent>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        let response: EventsResponse = serde_json::from_value(value)?;
        Ok(response.events)
    }
}

/// Load events from a file or a directory of files.
///
/// A single file must parse. In a directory, files that cannot be read or
/// parsed are skipped with a warning. Events are de-duplicated by id; the
/// first occurrence in path order wins.
pub fn load_events(path: &Path) -> Result<Vec<TeamupEvent>> {
    if path.is_file() {
        let events = read_file(path)?;
        return Ok(dedup_by_id(events));
    }

    if !path.exists() {
        return Err(RosterError::FileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    }

    let files = find_json_files(path);
    if files.is_empty() {
        warn!("No JSON files found in {}", path.display());
    }

    let mut all_events = Vec::new();
    for file in &files {
        match read_file(file) {
            Ok(events) => all_events.extend(events),
            Err(e) => warn!("Skipping {}: {}", file.display(), e),
        }
    }

    let events = dedup_by_id(all_events);
    debug!(
        "Loaded {} events from {} files",
        events.len(),
        files.len()
    );
    Ok(events)
}

/// Write a raw calendar response into `dir` as
/// `events-YYYYMMDDTHHMMSS.json` and return its path.
///
/// The body must be valid JSON; it is written to a temporary file first and
/// renamed into place.
pub fn save_snapshot(dir: &Path, raw: &str, now: DateTime<Utc>) -> Result<PathBuf> {
    serde_json::from_str::<serde_json::Value>(raw)?;

    std::fs::create_dir_all(dir).map_err(|source| RosterError::FileRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("events-{}.json", now.format("%Y%m%dT%H%M%S")));
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, raw)?;
    std::fs::rename(&tmp, &path)?;

    debug!("Saved calendar snapshot to {}", path.display());
    Ok(path)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_file(path: &Path) -> Result<Vec<TeamupEvent>> {
    let content = std::fs::read_to_string(path).map_err(|source| RosterError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_events(&content)
}

fn dedup_by_id(events: Vec<TeamupEvent>) -> Vec<TeamupEvent> {
    let mut seen: HashSet<String> = HashSet::new();
    events
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn event(id: &str, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "start_dt": "2025-12-08T18:00:00-05:00",
            "end_dt": "2025-12-08T22:00:00-05:00",
            "subcalendar_ids": [14169839],
            "signups": []
        })
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-12-10T12:34:56Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    // ── find_json_files ───────────────────────────────────────────────────────

    #[test]
    fn test_find_json_files_recursive_sorted() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "b.json", &json!([]));
        write_json(dir.path(), "sub/a.json", &json!([]));
        write_json(dir.path(), "a.json", &json!([]));
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = find_json_files(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "sub/a.json"]);
    }

    #[test]
    fn test_find_json_files_nonexistent_path() {
        assert!(find_json_files(Path::new("/nonexistent/volunteer-hours")).is_empty());
    }

    // ── parse_events ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_events_response_and_array() {
        let wrapped = json!({ "events": [event("1", "A"), event("2", "B")] }).to_string();
        assert_eq!(parse_events(&wrapped).unwrap().len(), 2);

        let bare = json!([event("3", "C")]).to_string();
        let events = parse_events(&bare).unwrap();
        assert_eq!(events[0].id, "3");
    }

    #[test]
    fn test_parse_events_invalid() {
        assert!(matches!(
            parse_events("{not json"),
            Err(RosterError::JsonParse(_))
        ));
    }

    // ── load_events ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_events_single_file() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            dir.path(),
            "events.json",
            &json!({ "events": [event("1", "A"), event("1", "A bis")] }),
        );

        let events = load_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "A");
    }

    #[test]
    fn test_load_events_single_bad_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{oops").unwrap();
        assert!(load_events(&path).is_err());
    }

    #[test]
    fn test_load_events_directory_skips_bad_and_dedups() {
        let dir = TempDir::new().unwrap();
        write_json(dir.path(), "1.json", &json!({ "events": [event("1", "first")] }));
        std::fs::write(dir.path().join("2.json"), "garbage").unwrap();
        write_json(
            dir.path(),
            "3.json",
            &json!({ "events": [event("1", "second"), event("2", "other")] }),
        );

        let events = load_events(dir.path()).unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(events[0].title, "first");
    }

    #[test]
    fn test_load_events_missing_path() {
        let err = load_events(Path::new("/nonexistent/volunteer-hours/events.json")).unwrap_err();
        match err {
            RosterError::FileRead { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── save_snapshot ─────────────────────────────────────────────────────────

    #[test]
    fn test_save_snapshot_round_trips_through_loader() {
        let dir = TempDir::new().unwrap();
        let raw = json!({ "events": [event("9", "OPÉRATION NOBLE CAUSE - YMCA")] }).to_string();

        let path = save_snapshot(&dir.path().join("cache"), &raw, now()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "events-20251210T123456.json"
        );
        assert!(!path.with_extension("json.tmp").exists());
        let events = load_events(&path).unwrap();
        assert_eq!(events[0].id, "9");
    }

    #[test]
    fn test_save_snapshot_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        assert!(save_snapshot(dir.path(), "<html>", now()).is_err());
        assert!(find_json_files(dir.path()).is_empty());
    }
}
