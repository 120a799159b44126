//! Paginated Excel workbook sink
//!
//! Pages are modeled in memory and rendered with `rust_xlsxwriter` when
//! the workbook is persisted (on finish or when switching files). That
//! keeps `reset_page` simple (the page is replaced outright rather than
//! scrubbed cell by cell) and lets each workbook rebuild its own cell
//! formats.
//!
//! Cosmetics follow the tool's original purpose: time cells formatted as
//! `hh:mm:ss.000`, timer cells as `0.00`, date cells as `mm-dd-yyyy`,
//! columns 1 and 3 widened, one embedded line chart per page on request.

use super::RecordSink;
use crate::error::{DaqError, Result};
use crate::protocol::cell::CellValue;
use rust_xlsxwriter::{Chart, ChartType, Format, Workbook};
use std::path::{Path, PathBuf};

/// One in-memory worksheet: its name, rows, and optional chart request
#[derive(Debug, Clone)]
struct Page {
    name: String,
    rows: Vec<Vec<CellValue>>,
    chart: Option<(usize, usize)>,
}

impl Page {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
            chart: None,
        }
    }
}

/// Workbook implementation of [`RecordSink`]
pub struct WorkbookSink {
    path: PathBuf,
    header: Vec<String>,
    pages: Vec<Page>,
    pending: Vec<(u16, CellValue)>,
    finished: bool,
}

impl WorkbookSink {
    pub fn new(path: impl Into<PathBuf>, header: Vec<String>) -> Self {
        let path = path.into();
        tracing::info!("Writing workbook output to {:?}", path);
        Self {
            path,
            header,
            pages: Vec::new(),
            pending: Vec::new(),
            finished: false,
        }
    }

    fn current_page_mut(&mut self) -> Result<&mut Page> {
        self.pages
            .last_mut()
            .ok_or(DaqError::SinkContract("write before any page was created"))
    }

    /// Render every page into an xlsx file at the current path
    fn render(&self) -> Result<()> {
        if self.pages.is_empty() {
            tracing::warn!("No pages written; skipping {:?}", self.path);
            return Ok(());
        }

        let mut workbook = Workbook::new();
        let format_time = Format::new().set_num_format("hh:mm:ss.000");
        let format_timer = Format::new().set_num_format("0.00");
        let format_date = Format::new().set_num_format("mm-dd-yyyy");

        for page in &self.pages {
            let sheet = workbook.add_worksheet();
            sheet.set_name(&page.name)?;
            sheet.set_column_width(1, 15.0)?;
            sheet.set_column_width(3, 15.0)?;

            for (r, row) in page.rows.iter().enumerate() {
                let r = r as u32;
                for (c, cell) in row.iter().enumerate() {
                    let c = c as u16;
                    match cell {
                        CellValue::Time(t) => {
                            sheet.write_datetime_with_format(r, c, t, &format_time)?;
                        }
                        CellValue::Date(d) => {
                            sheet.write_datetime_with_format(r, c, d, &format_date)?;
                        }
                        CellValue::Timer(v) => {
                            sheet.write_number_with_format(r, c, *v, &format_timer)?;
                        }
                        CellValue::Number { value, .. } => {
                            sheet.write_number(r, c, *value)?;
                        }
                        CellValue::Text(s) => {
                            sheet.write_string(r, c, s)?;
                        }
                    }
                }
            }

            if let Some((x_col, y_col)) = page.chart {
                let last_row = page.rows.len().saturating_sub(1) as u32;
                // A chart needs at least one data row under the header
                if last_row >= 1 {
                    let name = page.name.as_str();
                    let (x_col, y_col) = (x_col as u16, y_col as u16);
                    let mut chart = Chart::new(ChartType::Line);
                    chart
                        .add_series()
                        .set_categories((name, 1, x_col, last_row, x_col))
                        .set_values((name, 1, y_col, last_row, y_col));
                    chart.x_axis().set_name((name, 0, x_col));
                    chart.y_axis().set_name((name, 0, y_col));
                    chart.legend().set_hidden();
                    let chart_col = (self.header.len() + 1) as u16;
                    sheet.insert_chart(1, chart_col, &chart)?;
                }
            }
        }

        workbook.save(&self.path)?;
        tracing::info!("Saved workbook {:?} ({} pages)", self.path, self.pages.len());
        Ok(())
    }
}

impl RecordSink for WorkbookSink {
    fn write_cell(&mut self, col: u16, value: &CellValue) -> Result<()> {
        if self.pages.is_empty() {
            return Err(DaqError::SinkContract("write before any page was created"));
        }
        self.pending.push((col, value.clone()));
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let width = pending
            .iter()
            .map(|(col, _)| *col as usize + 1)
            .max()
            .unwrap_or(0);
        let mut row = vec![CellValue::Text(String::new()); width];
        for (col, value) in pending {
            row[col as usize] = value;
        }
        self.current_page_mut()?.rows.push(row);
        Ok(())
    }

    fn write_row(&mut self, fields: &[String]) -> Result<()> {
        let row = fields
            .iter()
            .map(|f| CellValue::Text(f.clone()))
            .collect();
        self.current_page_mut()?.rows.push(row);
        Ok(())
    }

    fn new_page(&mut self, name: &str) -> Result<()> {
        self.pending.clear();
        self.pages.push(Page::new(name));
        Ok(())
    }

    fn reset_page(&mut self) -> Result<()> {
        self.pending.clear();
        let header = self.header.clone();
        let page = self.current_page_mut()?;
        // Replace the page outright; stale rows and chart requests go with it
        *page = Page::new(&page.name.clone());
        page.rows.push(
            header
                .iter()
                .map(|f| CellValue::Text(f.clone()))
                .collect(),
        );
        Ok(())
    }

    fn attach_chart(&mut self, x_col: usize, y_col: usize) -> Result<()> {
        self.current_page_mut()?.chart = Some((x_col, y_col));
        Ok(())
    }

    fn switch_file(&mut self, path: &Path) -> Result<()> {
        self.render()?;
        self.pages.clear();
        self.pending.clear();
        self.path = path.to_path_buf();
        tracing::info!("Switched workbook output to {:?}", self.path);
        Ok(())
    }

    fn rows_written(&self) -> u32 {
        self.pages.last().map_or(0, |p| p.rows.len() as u32)
    }

    fn needs_page_name(&self) -> bool {
        true
    }

    fn page_names(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.name.clone()).collect()
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.render()?;
        self.finished = true;
        Ok(())
    }
}
