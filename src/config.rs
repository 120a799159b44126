//! Run configuration for the ingest engine
//!
//! This module contains the immutable protocol configuration (reserved
//! keywords, delimiter, chart pacing threshold) plus the small enums that
//! describe a run's output and chart choices.
//!
//! The protocol configuration is constructed once per run and passed
//! explicitly into the classifier, the cell transformer, and the engine.
//! There is no process-wide mutable state.

use crate::error::{DaqError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Wire-protocol configuration: delimiter, reserved tokens, and the
/// minimum chart redraw interval.
///
/// The defaults replicate the PLX-DAQ line protocol: comma-delimited
/// fields, `CLEARDATA` doubling as the stream-start sentinel, and the
/// `TIME`/`TIMER`/`DATE` field keywords.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Field delimiter, fixed for the whole run
    pub delimiter: char,
    /// Token that marks "header follows next" when seen before streaming.
    /// The same literal also serves as the clear-data directive in-stream.
    pub start_token: String,
    /// First-field token for data rows
    pub data_token: String,
    /// First-field token for label rows
    pub label_token: String,
    /// First-field token for informational messages
    pub message_token: String,
    /// Directive token that resets the elapsed timer
    pub reset_timer_token: String,
    /// Directive token that resets the current output page
    pub clear_data_token: String,
    /// Field keyword substituted with the wall-clock time
    pub time_word: String,
    /// Field keyword substituted with the elapsed timer seconds
    pub timer_word: String,
    /// Field keyword substituted with the wall-clock date
    pub date_word: String,
    /// Minimum number of seconds between live chart redraws
    pub plot_interval: f64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            start_token: "CLEARDATA".to_string(),
            data_token: "DATA".to_string(),
            label_token: "LABEL".to_string(),
            message_token: "MSG".to_string(),
            reset_timer_token: "RESETTIMER".to_string(),
            clear_data_token: "CLEARDATA".to_string(),
            time_word: "TIME".to_string(),
            timer_word: "TIMER".to_string(),
            date_word: "DATE".to_string(),
            plot_interval: 0.5,
        }
    }
}

impl ProtocolConfig {
    /// Load the protocol configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| DaqError::Config(e.to_string()))
    }

    /// Load from the given path, falling back to the defaults on any failure
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(p) => match Self::load(p) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to load protocol config from {:?}: {}", p, e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}

/// How (and whether) the data should be charted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
pub enum GraphMode {
    /// Live chart updated in paced batches while streaming
    Live,
    /// Chart embedded in the output file only (workbook output)
    FileOnly,
    /// No chart at all
    #[default]
    Off,
}

/// Output destination form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Paginated Excel workbook
    Workbook,
    /// Flat delimited-text file
    #[default]
    Csv,
}

impl OutputFormat {
    /// File extension for this output form, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Workbook => ".xlsx",
            OutputFormat::Csv => ".csv",
        }
    }
}

/// Which two columns of each data row feed the chart, chosen once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSelection {
    /// Column index (0-based) for the x axis
    pub x: usize,
    /// Column index (0-based) for the y axis
    pub y: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokens() {
        let cfg = ProtocolConfig::default();
        assert_eq!(cfg.delimiter, ',');
        assert_eq!(cfg.start_token, "CLEARDATA");
        assert_eq!(cfg.start_token, cfg.clear_data_token);
        assert_eq!(cfg.plot_interval, 0.5);
    }

    #[test]
    fn test_load_partial_toml() {
        let cfg: ProtocolConfig = toml::from_str("delimiter = \";\"\n").unwrap();
        assert_eq!(cfg.delimiter, ';');
        // Everything not named keeps its default
        assert_eq!(cfg.data_token, "DATA");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let cfg = ProtocolConfig::load_or_default(Some(Path::new("/nonexistent/daq.toml")));
        assert_eq!(cfg, ProtocolConfig::default());
    }

    #[test]
    fn test_extension() {
        assert_eq!(OutputFormat::Workbook.extension(), ".xlsx");
        assert_eq!(OutputFormat::Csv.extension(), ".csv");
    }
}
