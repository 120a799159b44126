//! Record sources and stream calibration
//!
//! A [`LineSource`] hands the engine one textual record at a time. The
//! shipped implementation reads a serial port; tests substitute a scripted
//! source. A read timeout or a decode failure yields an empty line, which
//! the protocol layer classifies as the end of the stream.

pub mod serial;

pub use serial::{list_ports, SerialLineSource};

use crate::config::ProtocolConfig;
use crate::error::{DaqError, Result};
use std::time::{Duration, Instant};

/// Multiplier applied to the measured sample delay to get the read timeout
const READ_TIMEOUT_FACTOR: f64 = 1.25;

/// Fraction of the sample delay spent paused after each chart flush
const GRAPH_PAUSE_FACTOR: f64 = 0.5;

/// One line-at-a-time record source
pub trait LineSource {
    /// Read the next record, stripped of line endings.
    ///
    /// Returns an empty string when the read times out or the bytes do
    /// not decode; both mean the stream has gone quiet.
    fn read_line(&mut self) -> Result<String>;

    /// Adjust the bounded-read timeout, typically after calibration
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Release the underlying device
    fn close(&mut self) -> Result<()>;
}

/// What calibration learned about the stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTiming {
    /// Header fields captured from the line after the start token
    pub header: Vec<String>,
    /// Measured seconds between consecutive records, rounded to 3 decimals
    pub sample_delay: f64,
    /// Seconds to pause after each chart flush
    pub graph_pause: f64,
}

impl StreamTiming {
    pub fn new(header: Vec<String>, sample_delay: f64) -> Self {
        Self {
            header,
            sample_delay,
            graph_pause: sample_delay * GRAPH_PAUSE_FACTOR,
        }
    }

    /// Bounded-read timeout derived from the sample delay
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs_f64((self.sample_delay * READ_TIMEOUT_FACTOR).max(0.001))
    }
}

/// Measure the stream cadence and capture the header.
///
/// Discards lines until the start token, takes the following line as the
/// header, then timestamps the next two records to measure the delay
/// between them. The caller reopens or rewinds the source afterwards; the
/// device replays its preamble on reconnect.
pub fn calibrate(source: &mut dyn LineSource, cfg: &ProtocolConfig) -> Result<StreamTiming> {
    loop {
        let line = source.read_line()?;
        if line.trim().eq_ignore_ascii_case(&cfg.start_token) {
            break;
        }
        tracing::debug!("calibration: discarding preamble line {:?}", line);
    }

    let header_line = source.read_line()?;
    if header_line.trim().is_empty() {
        return Err(DaqError::Calibration(
            "stream ended before a header line arrived".to_string(),
        ));
    }
    let header: Vec<String> = header_line
        .split(cfg.delimiter)
        .map(|f| f.trim().to_string())
        .collect();

    let first = source.read_line()?;
    if first.trim().is_empty() {
        return Err(DaqError::Calibration(
            "stream ended before the first record".to_string(),
        ));
    }
    let mark = Instant::now();
    let second = source.read_line()?;
    if second.trim().is_empty() {
        return Err(DaqError::Calibration(
            "stream ended before the second record".to_string(),
        ));
    }
    let delay = round3(mark.elapsed().as_secs_f64());

    let timing = StreamTiming::new(header, delay);
    tracing::info!(
        sample_delay = timing.sample_delay,
        graph_pause = timing.graph_pause,
        header = ?timing.header,
        "stream calibrated"
    );
    Ok(timing)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
