//! Reserved-value resolution for individual fields
//!
//! Each field of a data row is resolved independently: the reserved
//! keywords `TIME`, `TIMER`, and `DATE` are swapped for live values at
//! processing time, anything that parses as a number becomes numeric, and
//! everything else stays text. Parse failures are never errors.

use crate::config::ProtocolConfig;
use chrono::{Local, NaiveDate, NaiveTime};
use std::time::Instant;

/// Mutable "timer zero" reference for the `TIMER` keyword.
///
/// Initialized when streaming begins and advanced only by an explicit
/// reset (the RESETTIMER directive). Elapsed readings never decrease
/// between resets.
#[derive(Debug, Clone)]
pub struct TimerReference {
    zero: Instant,
}

impl TimerReference {
    /// Start the timer at the current instant
    pub fn start_now() -> Self {
        Self {
            zero: Instant::now(),
        }
    }

    /// Move timer zero to the current instant
    pub fn reset(&mut self) {
        self.zero = Instant::now();
    }

    /// Seconds elapsed since timer zero, rounded to 3 decimals
    pub fn elapsed_secs(&self) -> f64 {
        round3(self.zero.elapsed().as_secs_f64())
    }
}

/// Round to 3 decimal places
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// One resolved cell of a data row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Wall-clock time (from the `TIME` keyword)
    Time(NaiveTime),
    /// Wall-clock date (from the `DATE` keyword)
    Date(NaiveDate),
    /// Elapsed seconds since timer zero (from the `TIMER` keyword)
    Timer(f64),
    /// A field that parsed as a number. The raw text is kept so flat
    /// output reproduces the device's formatting exactly.
    Number { value: f64, raw: String },
    /// Anything else, original text preserved
    Text(String),
}

impl CellValue {
    /// Time and date cells cannot be handed to a chart or a flat file as
    /// native values; they must be stringified first
    pub fn is_datetime_like(&self) -> bool {
        matches!(self, CellValue::Time(_) | CellValue::Date(_))
    }

    /// The cell's textual form, used for flat output and chart categories
    pub fn display_string(&self) -> String {
        match self {
            CellValue::Time(t) => t.format("%H:%M:%S%.3f").to_string(),
            CellValue::Date(d) => d.format("%m-%d-%Y").to_string(),
            CellValue::Timer(v) => format!("{}", v),
            CellValue::Number { raw, .. } => raw.clone(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Resolve one field's raw text against the reserved keywords.
///
/// Keyword matching is case-insensitive on the trimmed field. A field
/// that matches nothing is parsed as a float; on failure it degrades to
/// text with the original string preserved.
pub fn resolve(raw: &str, timer: &TimerReference, cfg: &ProtocolConfig) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(&cfg.time_word) {
        return CellValue::Time(Local::now().time());
    }
    if trimmed.eq_ignore_ascii_case(&cfg.timer_word) {
        return CellValue::Timer(timer.elapsed_secs());
    }
    if trimmed.eq_ignore_ascii_case(&cfg.date_word) {
        return CellValue::Date(Local::now().date_naive());
    }
    match trimmed.parse::<f64>() {
        Ok(value) => CellValue::Number {
            value,
            raw: raw.to_string(),
        },
        Err(_) => CellValue::Text(raw.to_string()),
    }
}

/// Whether a string parses as a float
pub fn is_numeric_str(s: &str) -> bool {
    s.trim().parse::<f64>().is_ok()
}

/// Whether a string parses as a float that is a whole number.
/// Used by interactive input validation, not by protocol values.
pub fn is_integer_str(s: &str) -> bool {
    match s.trim().parse::<f64>() {
        Ok(x) => x.is_finite() && x.fract() == 0.0,
        Err(_) => false,
    }
}
