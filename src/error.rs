//! Error handling for serialdaq-rs
//!
//! This module defines the crate-wide error type and a Result alias used
//! throughout the application.

use thiserror::Error;

/// Main error type for serialdaq-rs operations
#[derive(Error, Debug)]
pub enum DaqError {
    /// Errors from the serial port layer
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Errors from the workbook writer
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors related to configuration loading
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to the line source (closed port, exhausted script)
    #[error("Source error: {0}")]
    Source(String),

    /// Errors during stream calibration
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// A sink operation was called against a destination that does not
    /// exist yet. This is a programming-contract violation, not a
    /// recoverable condition.
    #[error("Sink contract violation: {0}")]
    SinkContract(&'static str),
}

/// Result type alias for serialdaq-rs operations
pub type Result<T> = std::result::Result<T, DaqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DaqError::Config("missing delimiter".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing delimiter");
    }

    #[test]
    fn test_sink_contract_display() {
        let err = DaqError::SinkContract("write before new_page");
        assert!(err.to_string().contains("write before new_page"));
    }
}
