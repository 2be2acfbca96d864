//! Loading the usage log into a per-user chronological event table.
//!
//! The log is a header-less CSV file with four columns:
//! `timestamp,event,open_type,user_id`. Rows whose timestamp is not a plain
//! decimal number are skipped, which is how a header row (or a corrupt line)
//! is tolerated. Once a row passes that filter it must be well formed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::event::{Event, EventKind, OpenType};

/// Number of columns in a usage log record.
const FIELD_COUNT: usize = 4;

/// Errors that abort loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read usage log: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: expected 4 fields, found {found}")]
    FieldCount { line: u64, found: usize },

    #[error("line {line}: invalid {field} {value:?}")]
    InvalidNumber {
        line: u64,
        field: &'static str,
        value: String,
    },
}

/// Counts of what happened to the raw rows during loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Every record read from the source, including skipped ones.
    pub rows_read: usize,
    /// Rows dropped because the timestamp was not purely numeric.
    pub skipped_non_numeric: usize,
    /// Rows dropped because the event was neither `opened` nor `closed`.
    pub skipped_unknown_kind: usize,
}

/// Events sorted by `(user_id, timestamp)`, with input order breaking ties.
#[derive(Debug, Clone, Default)]
pub struct LoadedEvents {
    events: Vec<Event>,
    report: LoadReport,
}

impl LoadedEvents {
    /// Sorts already-parsed events into session order.
    pub fn from_events(events: Vec<Event>) -> Self {
        let report = LoadReport {
            rows_read: events.len(),
            ..LoadReport::default()
        };
        Self::with_report(events, report)
    }

    fn with_report(mut events: Vec<Event>, report: LoadReport) -> Self {
        // sort_by_key is stable, so duplicate (user, timestamp) keep input order
        events.sort_by_key(|e| (e.user_id, e.timestamp));
        Self { events, report }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub const fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over each user's events as a contiguous slice.
    pub fn sessions(&self) -> impl Iterator<Item = &[Event]> {
        self.events.chunk_by(|a, b| a.user_id == b.user_id)
    }

    /// Distinct user ids in ascending order.
    pub fn user_ids(&self) -> Vec<i64> {
        self.sessions().map(|session| session[0].user_id).collect()
    }

    pub fn user_count(&self) -> usize {
        self.sessions().count()
    }

    /// Returns one user's events, or an empty slice for an unknown user.
    pub fn user_events(&self, user_id: i64) -> &[Event] {
        let start = self.events.partition_point(|e| e.user_id < user_id);
        let end = self.events.partition_point(|e| e.user_id <= user_id);
        &self.events[start..end]
    }
}

/// Loads a usage log from disk.
pub fn load_file(path: &Path) -> Result<LoadedEvents, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = load_events(BufReader::new(file))?;
    tracing::debug!(
        path = ?path,
        events = loaded.len(),
        users = loaded.user_count(),
        "loaded usage log"
    );
    Ok(loaded)
}

/// Loads a usage log from any reader.
pub fn load_events<R: Read>(source: R) -> Result<LoadedEvents, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut report = LoadReport::default();
    let mut events = Vec::new();

    for record in reader.records() {
        let record = record?;
        report.rows_read += 1;
        let line = record.position().map_or(0, csv::Position::line);

        let timestamp = record.get(0).unwrap_or_default();
        if !is_decimal(timestamp) {
            tracing::debug!(line, timestamp, "skipping row with non-numeric timestamp");
            report.skipped_non_numeric += 1;
            continue;
        }

        if record.len() != FIELD_COUNT {
            return Err(LoadError::FieldCount {
                line,
                found: record.len(),
            });
        }

        let Ok(kind) = record[1].parse::<EventKind>() else {
            tracing::debug!(line, event = &record[1], "skipping row with unknown event kind");
            report.skipped_unknown_kind += 1;
            continue;
        };

        events.push(Event {
            timestamp: parse_number(timestamp, line, "timestamp")?,
            kind,
            open_type: OpenType::parse(&record[2]),
            user_id: parse_number(&record[3], line, "user_id")?,
            line,
            raw_open_type: record[2].to_string(),
        });
    }

    Ok(LoadedEvents::with_report(events, report))
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_number(value: &str, line: u64, field: &'static str) -> Result<i64, LoadError> {
    value.parse().map_err(|_| LoadError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}
