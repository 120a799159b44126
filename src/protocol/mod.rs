//! The line protocol: record classification and reserved-value resolution
//!
//! Each input line is split on the run's delimiter into a record of raw
//! text fields. [`classify`](classify::classify) decides what the record
//! is (data, label, message, directive, or blank) and
//! [`resolve`](cell::resolve) turns one field's raw text into a concrete
//! cell value, substituting the reserved `TIME`/`TIMER`/`DATE` keywords.

pub mod cell;
pub mod classify;

pub use cell::{resolve, CellValue, TimerReference};
pub use classify::{classify, Classified, RowKind};
