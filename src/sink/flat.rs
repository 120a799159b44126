//! Flat delimited-text sink
//!
//! One line per row, fields joined with the run delimiter, header first.
//! Datetime-like cells are stringified on the way in; numeric cells keep
//! the exact text the device sent. Page operations map to truncation.

use super::RecordSink;
use crate::error::{DaqError, Result};
use crate::protocol::cell::CellValue;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Flat-file implementation of [`RecordSink`]
pub struct FlatFileSink {
    path: PathBuf,
    delimiter: char,
    header: Vec<String>,
    writer: Option<BufWriter<File>>,
    pending: Vec<String>,
    rows: u32,
}

impl FlatFileSink {
    /// Create the sink, truncating any existing file at `path`
    pub fn new(path: impl Into<PathBuf>, header: Vec<String>, delimiter: char) -> Result<Self> {
        let path = path.into();
        let writer = BufWriter::new(File::create(&path)?);
        tracing::info!("Writing flat output to {:?}", path);
        Ok(Self {
            path,
            delimiter,
            header,
            writer: Some(writer),
            pending: Vec::new(),
            rows: 0,
        })
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or(DaqError::SinkContract("write against a closed flat file"))
    }

    fn write_line(&mut self, fields: &[String]) -> Result<()> {
        let delim = self.delimiter;
        let line = fields.join(&delim.to_string());
        let writer = self.writer()?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn truncate(&mut self) -> Result<()> {
        self.writer = Some(BufWriter::new(File::create(&self.path)?));
        self.pending.clear();
        self.rows = 0;
        Ok(())
    }
}

impl RecordSink for FlatFileSink {
    fn write_cell(&mut self, _col: u16, value: &CellValue) -> Result<()> {
        self.pending.push(value.display_string());
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        self.write_line(&pending)?;
        self.rows += 1;
        Ok(())
    }

    fn write_row(&mut self, fields: &[String]) -> Result<()> {
        self.write_line(fields)?;
        self.rows += 1;
        Ok(())
    }

    fn new_page(&mut self, _name: &str) -> Result<()> {
        self.truncate()
    }

    fn reset_page(&mut self) -> Result<()> {
        self.truncate()?;
        let header = self.header.clone();
        self.write_line(&header)?;
        self.rows = 1;
        Ok(())
    }

    fn attach_chart(&mut self, _x_col: usize, _y_col: usize) -> Result<()> {
        Ok(())
    }

    fn switch_file(&mut self, path: &Path) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        self.path = path.to_path_buf();
        self.truncate()?;
        tracing::info!("Switched flat output to {:?}", self.path);
        Ok(())
    }

    fn rows_written(&self) -> u32 {
        self.rows
    }

    fn needs_page_name(&self) -> bool {
        false
    }

    fn page_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
