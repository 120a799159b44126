//! The ingest state machine
//!
//! One engine drives one acquisition session: wait for the stream-start
//! sentinel, emit the header, then classify and dispatch records until the
//! stream goes quiet, the operator cancels, or something faults. All three
//! endings funnel through a single teardown and are reported to the caller
//! as a [`RunEnd`] value rather than an error.
//!
//! The engine holds the timer reference across runs: rerunning on a new
//! page or file does not restart the elapsed timer, only an in-stream
//! reset directive does.

use crate::chart::{ChartBuffer, PaceOutcome, PlotValue};
use crate::config::{AxisSelection, ProtocolConfig};
use crate::error::Result;
use crate::protocol::{classify, resolve, RowKind, TimerReference};
use crate::sink::RecordSink;
use crate::source::LineSource;

/// Where the engine is in the stream lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    /// Discarding preamble until the start token arrives
    AwaitingStart,
    /// The next record is the device's header line
    ReadingHeader,
    /// Classifying and dispatching records
    Streaming,
}

/// How a run ended. Every ending is a value, not an exception path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    /// The stream went quiet (blank record, timeout, or disconnect)
    StreamEnded,
    /// The operator cancelled during a chart pacing wait
    Cancelled,
    /// A fatal source or sink error
    Faulted(String),
}

/// Record classification and dispatch engine
pub struct IngestEngine {
    cfg: ProtocolConfig,
    header: Vec<String>,
    axes: Option<AxisSelection>,
    timer: TimerReference,
}

impl IngestEngine {
    /// Build an engine for the given run.
    ///
    /// `header` is the column header captured during calibration; `axes`
    /// selects which two columns feed the chart, if any.
    pub fn new(cfg: ProtocolConfig, header: Vec<String>, axes: Option<AxisSelection>) -> Self {
        Self {
            cfg,
            header,
            axes,
            timer: TimerReference::start_now(),
        }
    }

    /// Column header this engine writes at the top of each page
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Drive one acquisition run to completion.
    ///
    /// The source is closed on every exit path; partial chart buffers are
    /// discarded. The sink keeps its page position for the continuation
    /// protocol.
    pub fn run(
        &mut self,
        source: &mut dyn LineSource,
        sink: &mut dyn RecordSink,
        chart: &mut ChartBuffer,
    ) -> RunEnd {
        let end = match self.run_inner(source, sink, chart) {
            Ok(end) => end,
            Err(e) => {
                tracing::error!("ingest run faulted: {}", e);
                RunEnd::Faulted(e.to_string())
            }
        };
        if let Err(e) = source.close() {
            tracing::warn!("failed to close source: {}", e);
        }
        tracing::info!(rows = sink.rows_written(), "run ended: {:?}", end);
        end
    }

    fn run_inner(
        &mut self,
        source: &mut dyn LineSource,
        sink: &mut dyn RecordSink,
        chart: &mut ChartBuffer,
    ) -> Result<RunEnd> {
        let mut state = EngineState::AwaitingStart;

        loop {
            let line = source.read_line()?;

            match state {
                EngineState::AwaitingStart => {
                    if line.trim().eq_ignore_ascii_case(&self.cfg.start_token) {
                        state = EngineState::ReadingHeader;
                    } else {
                        tracing::debug!("discarding preamble line {:?}", line);
                    }
                }
                EngineState::ReadingHeader => {
                    // The device resends its header; the calibrated copy is
                    // the one written so every page starts identically.
                    sink.write_row(&self.header)?;
                    if let Some(axes) = self.axes {
                        let x = self.header.get(axes.x).map(String::as_str).unwrap_or("");
                        let y = self.header.get(axes.y).map(String::as_str).unwrap_or("");
                        chart.set_axis_labels(x, y);
                    }
                    state = EngineState::Streaming;
                }
                EngineState::Streaming => {
                    let mut fields: Vec<String> = line
                        .split(self.cfg.delimiter)
                        .map(|f| f.to_string())
                        .collect();
                    let classified = classify(&fields, RowKind::Data, &self.cfg);

                    if classified.kind == RowKind::Blank {
                        return Ok(RunEnd::StreamEnded);
                    }

                    if classified.missing_label && classified.kind != RowKind::Message {
                        fields.insert(0, classified.kind.token(&self.cfg).to_string());
                    }

                    match classified.kind {
                        RowKind::Data => {
                            if self.dispatch_data(&fields, sink, chart)? == PaceOutcome::Cancelled {
                                return Ok(RunEnd::Cancelled);
                            }
                        }
                        RowKind::Label => sink.write_row(&fields)?,
                        RowKind::Message => {
                            tracing::debug!("ignoring message record {:?}", fields);
                        }
                        RowKind::ResetTimer => self.timer.reset(),
                        RowKind::ClearData => {
                            sink.reset_page()?;
                            chart.reset();
                        }
                        RowKind::Blank => {
                            tracing::warn!("unreachable record kind {:?}; skipped", classified.kind);
                        }
                    }
                }
            }
        }
    }

    /// Resolve every field of a data row, write the row, and feed the chart
    fn dispatch_data(
        &self,
        fields: &[String],
        sink: &mut dyn RecordSink,
        chart: &mut ChartBuffer,
    ) -> Result<PaceOutcome> {
        let mut plot_x = None;
        let mut plot_y = None;

        for (col, field) in fields.iter().enumerate() {
            let value = resolve(field, &self.timer, &self.cfg);

            if let Some(axes) = self.axes {
                if col == axes.x {
                    plot_x = Some(PlotValue::from(&value));
                }
                if col == axes.y {
                    plot_y = Some(PlotValue::from(&value));
                }
            }

            sink.write_cell(col as u16, &value)?;
        }
        sink.end_row()?;

        if let (Some(x), Some(y)) = (plot_x, plot_y) {
            return Ok(chart.add(x, y));
        }
        Ok(PaceOutcome::Continue)
    }
}
