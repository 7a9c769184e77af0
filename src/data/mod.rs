// Incident data management module
// Fetches bird-strike records from a spreadsheet, parses them and aggregates
// incident counts by year and flight phase

pub mod aggregate;
pub mod loader;
pub mod source;

use chrono::{Datelike, NaiveDate};

// Re-export commonly used types
pub use aggregate::{PhaseCount, aggregate_by_year_and_phase, filter_phases};
pub use loader::{DatasetCache, SessionId, parse_flight_date, parse_records};
pub use source::{CsvFileSource, GoogleSheetSource, RecordSource, SheetCredentials};

/// Header of the flight date column in the spreadsheet
pub const FLIGHT_DATE_COLUMN: &str = "Flight Date";
/// Header of the flight phase column in the spreadsheet
pub const PHASE_COLUMN: &str = "Phase of flight";

/// One spreadsheet row. Columns other than the flight date and phase are ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct IncidentRecord {
    /// Calendar date of the flight, `None` when the spreadsheet value could not be parsed
    pub flight_date: Option<NaiveDate>,
    /// Stage of flight during which the strike happened
    pub phase: String,
}

impl IncidentRecord {
    pub fn new(flight_date: Option<NaiveDate>, phase: impl Into<String>) -> Self {
        Self {
            flight_date,
            phase: phase.into(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.flight_date.map(|date| date.year())
    }
}

/// All records fetched for one session, including the ones with unparseable dates.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<IncidentRecord>,
}

impl Dataset {
    pub fn new(records: Vec<IncidentRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// Records with a usable flight date. Only these take part in aggregation.
    pub fn valid_records(&self) -> impl Iterator<Item = &IncidentRecord> {
        self.records.iter().filter(|r| r.flight_date.is_some())
    }

    pub fn valid_count(&self) -> usize {
        self.valid_records().count()
    }

    pub fn dropped_count(&self) -> usize {
        self.records.len() - self.valid_count()
    }

    pub fn aggregate(&self) -> Vec<PhaseCount> {
        aggregate_by_year_and_phase(self.valid_records())
    }
}
