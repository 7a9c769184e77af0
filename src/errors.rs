// Error types for birdstrikes

use snafu::Snafu;
use std::io;

use crate::experiment::{Action, ExperimentState};

#[derive(Debug, Snafu)]
pub enum BirdstrikeError {
    // Errors while fetching the spreadsheet
    #[snafu(display("Spreadsheet rejected the credentials (HTTP {status})"))]
    AuthenticationFailed { status: u16 },
    #[snafu(display("Spreadsheet is unavailable: {reason}"))]
    SheetUnavailable { reason: String },
    #[snafu(display("Error requesting spreadsheet"))]
    SheetRequestError { source: reqwest::Error },
    #[snafu(display("Could not start the data loading runtime"))]
    RuntimeError { source: io::Error },
    #[snafu(display("No data source configured, provide a sheet id or a CSV file"))]
    NoDataSource,

    // Errors while reading records
    #[snafu(display("Error reading data file"))]
    DataFileError { source: io::Error },
    #[snafu(display("Error parsing incident records"))]
    CsvParseError { source: csv::Error },
    #[snafu(display("Incident records are missing the '{column}' column"))]
    MissingColumn { column: String },

    // Experiment errors
    #[snafu(display("Action '{action}' is not enabled while {state}"))]
    ActionNotEnabled {
        action: Action,
        state: ExperimentState,
    },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Chart export errors
    #[snafu(display("SVG generation failed: {reason}"))]
    SvgGenerationError { reason: String },
    #[snafu(display("Error writing exported chart"))]
    ExportIOError { source: io::Error },
}
