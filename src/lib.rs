//! serialdaq-rs: serial data acquisition to Excel or CSV
//!
//! Reads delimited records from a serial device speaking the PLX-DAQ line
//! protocol, classifies each record by its first field, and dispatches it:
//! data rows are resolved cell by cell (the reserved `TIME`/`TIMER`/`DATE`
//! keywords become live values) and written through a [`sink::RecordSink`],
//! directives mutate engine state, and a blank record ends the stream.
//! Optionally a live chart buffer collects two chosen columns and flushes
//! them in paced batches the operator can cancel.
//!
//! # Architecture
//!
//! - [`protocol`]: record classification and reserved-value resolution
//! - [`source`]: line sources (serial port, scripted in tests) and stream
//!   calibration, which measures the device cadence and captures the header
//! - [`sink`]: the output capability trait and its workbook and flat-file
//!   implementations
//! - [`chart`]: bounded double buffering with flush-on-fill and
//!   cancellation-aware pacing
//! - [`engine`]: the ingest state machine tying the above together
//! - [`app`] and [`prompt`]: the interactive session around the engine

pub mod app;
pub mod chart;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod protocol;
pub mod sink;
pub mod source;

pub use config::{AxisSelection, GraphMode, OutputFormat, ProtocolConfig};
pub use engine::{IngestEngine, RunEnd};
pub use error::{DaqError, Result};
