// Library interface for birdstrikes
// This allows integration tests to access internal modules

pub mod charts;
pub mod config;
pub mod data;
pub mod errors;
pub mod experiment;
pub mod ui;

// Re-export commonly used types
pub use charts::{ChartLabel, ChartSet};
pub use config::{AppConfig, SourceOverrides};
pub use data::{Dataset, DatasetCache, IncidentRecord, PhaseCount, RecordSource, SessionId};
pub use errors::BirdstrikeError;
pub use experiment::{Action, ExperimentOutcome, ExperimentSession, ExperimentState, Position};
