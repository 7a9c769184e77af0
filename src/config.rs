use std::fs::File;
use std::path::{Path, PathBuf};

use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::BirdstrikeError;
use crate::data::source::DEFAULT_SHEET_NAME;
use crate::data::{CsvFileSource, GoogleSheetSource, RecordSource, SheetCredentials};

const CONFIG_DIR_NAME: &str = "birdstrikes";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_WINDOW_WIDTH: f32 = 1100.;
const DEFAULT_WINDOW_HEIGHT: f32 = 800.;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub sheet_id: Option<String>,
    pub sheet_name: String,
    pub csv_path: Option<PathBuf>,
    pub excluded_phases: Vec<String>,
    /// Route sheet downloads through `HTTP_PROXY`/`HTTPS_PROXY` when set
    pub use_system_proxy: bool,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheet_id: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            csv_path: None,
            excluded_phases: Vec::new(),
            use_system_proxy: true,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct SourceOverrides {
    pub sheet_id: Option<String>,
    pub sheet_name: Option<String>,
    pub csv_path: Option<PathBuf>,
    pub excluded_phases: Vec<String>,
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        Some(
            dirs::config_dir()?
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        )
    }

    /// Loads the config from the user's config directory. A missing or
    /// unreadable file yields `None`.
    pub fn from_local_file() -> Option<Self> {
        Self::from_file(&Self::default_path()?)
    }

    pub fn from_file(config_path: &Path) -> Option<Self> {
        if !config_path.exists() {
            return None;
        }
        let file = File::open(config_path)
            .map_err(|e| error!("Could not open config file {:?}: {}", config_path, e))
            .ok()?;
        serde_json::from_reader(file)
            .map_err(|e| warn!("Could not parse config file {:?}: {}", config_path, e))
            .ok()
    }

    pub fn save(&self) -> Result<(), BirdstrikeError> {
        let config_path = Self::default_path().ok_or(BirdstrikeError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), BirdstrikeError> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| BirdstrikeError::ConfigIOError { source: e })?;
        }

        let file = File::create(config_path)
            .map_err(|e| BirdstrikeError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| BirdstrikeError::ConfigSerializeError { source: e })
    }

    pub fn with_overrides(mut self, overrides: SourceOverrides) -> Self {
        if let Some(csv_path) = overrides.csv_path {
            self.csv_path = Some(csv_path);
            self.sheet_id = None;
        }
        if let Some(sheet_id) = overrides.sheet_id {
            self.sheet_id = Some(sheet_id);
            self.csv_path = None;
        }
        if let Some(sheet_name) = overrides.sheet_name {
            self.sheet_name = sheet_name;
        }
        if !overrides.excluded_phases.is_empty() {
            self.excluded_phases = overrides.excluded_phases;
        }
        self
    }

    /// Builds the configured data source. A local CSV file wins over a sheet.
    pub fn record_source(
        &self,
        credentials: Option<SheetCredentials>,
    ) -> Result<Box<dyn RecordSource>, BirdstrikeError> {
        if let Some(csv_path) = &self.csv_path {
            return Ok(Box::new(CsvFileSource::new(csv_path)));
        }
        match &self.sheet_id {
            Some(sheet_id) if !sheet_id.trim().is_empty() => Ok(Box::new(
                GoogleSheetSource::new(sheet_id.trim(), &self.sheet_name)
                    .with_credentials(credentials)
                    .with_system_proxy(self.use_system_proxy),
            )),
            _ => Err(BirdstrikeError::NoDataSource),
        }
    }
}
