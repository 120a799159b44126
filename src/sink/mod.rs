//! Output sinks for classified records
//!
//! The engine writes through the [`RecordSink`] capability trait and never
//! branches on the destination form. The workbook implementation supports
//! pages and embedded charts; the flat-text implementation treats those
//! operations as no-ops or truncation, whichever preserves the observable
//! contract.

pub mod flat;
pub mod workbook;

pub use flat::FlatFileSink;
pub use workbook::WorkbookSink;

use crate::error::Result;
use crate::protocol::cell::CellValue;
use std::path::Path;

/// Stateful writer over a paginated workbook or a flat delimited file.
///
/// Position tracking: `rows_written` always equals the number of rows on
/// the current page including the header. Cell-by-cell rows advance the
/// counter only on `end_row`; full-row writes advance immediately.
pub trait RecordSink {
    /// Place one resolved cell at the given column of the current row
    fn write_cell(&mut self, col: u16, value: &CellValue) -> Result<()>;

    /// Finish a cell-by-cell row, advancing the row counter once
    fn end_row(&mut self) -> Result<()>;

    /// Write a full textual row and advance the row counter
    fn write_row(&mut self, fields: &[String]) -> Result<()>;

    /// Start a fresh page. The previous page (if any) is kept but no
    /// longer written to; the row counter restarts at 0. Flat files are
    /// truncated instead.
    fn new_page(&mut self, name: &str) -> Result<()>;

    /// Re-create the current page, rewrite the stored header as row 0,
    /// and set the row counter to 1
    fn reset_page(&mut self) -> Result<()>;

    /// Embed a line chart over the written x/y column ranges.
    /// No-op for flat files.
    fn attach_chart(&mut self, x_col: usize, y_col: usize) -> Result<()>;

    /// Persist the current backing store and switch to a new one at
    /// `path`, re-establishing formatting; the row counter restarts at 0
    fn switch_file(&mut self, path: &Path) -> Result<()>;

    /// Rows written to the current page, header included
    fn rows_written(&self) -> u32;

    /// Whether pages must be named before writing (workbook sheets)
    fn needs_page_name(&self) -> bool;

    /// Names of the pages created so far (empty for flat files).
    /// Used for duplicate checking when the operator names a new page.
    fn page_names(&self) -> Vec<String>;

    /// Flush and close the destination permanently
    fn finish(&mut self) -> Result<()>;
}
