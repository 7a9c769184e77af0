use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info};
use serde::Deserialize;
use uuid::Uuid;

use super::{Dataset, FLIGHT_DATE_COLUMN, IncidentRecord, PHASE_COLUMN, RecordSource};
use crate::BirdstrikeError;

// Two digit years come first: `%Y` would also accept "00" as year zero.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%d-%b-%y", "%d-%b-%Y", "%Y/%m/%d",
];
const TIME_SUFFIXES: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];
// ISO 8601 timestamps separate date and time with `T`
const TIME_SEPARATORS: [char; 2] = [' ', 'T'];

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Flight Date")]
    flight_date: String,
    #[serde(rename = "Phase of flight")]
    phase: String,
}

/// Parses a spreadsheet date cell. Returns `None` for anything that is not a
/// recognizable date so the row can be dropped downstream.
pub fn parse_flight_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // timestamps with an offset keep the calendar date they were written with
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.date_naive());
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
        for separator in TIME_SEPARATORS {
            for time in TIME_SUFFIXES {
                let with_time = format!("{}{}{}", format, separator, time);
                if let Ok(date_time) = NaiveDateTime::parse_from_str(value, &with_time) {
                    return Some(date_time.date());
                }
            }
        }
    }
    None
}

/// Parses the CSV text of the incident spreadsheet.
///
/// Both the flight date and phase columns must be present in the header.
/// Rows whose date cannot be parsed are kept with an empty date.
pub fn parse_records(csv_text: &str) -> Result<Dataset, BirdstrikeError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| BirdstrikeError::CsvParseError { source: e })?
        .clone();
    for column in [FLIGHT_DATE_COLUMN, PHASE_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(BirdstrikeError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = result.map_err(|e| BirdstrikeError::CsvParseError { source: e })?;
        let flight_date = parse_flight_date(&raw.flight_date);
        if flight_date.is_none() {
            debug!(
                "Row {}: unparseable flight date '{}', excluded from aggregation",
                row + 1,
                raw.flight_date
            );
        }
        records.push(IncidentRecord::new(flight_date, raw.phase));
    }

    let dataset = Dataset::new(records);
    info!(
        "Parsed {} incident records, {} dropped for unparseable dates",
        dataset.records().len(),
        dataset.dropped_count()
    );
    Ok(dataset)
}

/// Identity of one interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Datasets loaded so far, one per session. Each entry is populated once.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<SessionId, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session's dataset, fetching and parsing it from `source`
    /// the first time. Failures are returned and nothing is cached.
    pub fn get_or_load(
        &mut self,
        session: SessionId,
        source: &mut dyn RecordSource,
    ) -> Result<Arc<Dataset>, BirdstrikeError> {
        if let Some(dataset) = self.entries.get(&session) {
            return Ok(Arc::clone(dataset));
        }

        debug!("Session {}: loading dataset from {}", session, source.describe());
        let dataset = Arc::new(parse_records(&source.fetch()?)?);
        self.entries.insert(session, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn get(&self, session: SessionId) -> Option<Arc<Dataset>> {
        self.entries.get(&session).cloned()
    }

    pub fn evict(&mut self, session: SessionId) {
        self.entries.remove(&session);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
