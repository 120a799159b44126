//! Acquisition session orchestration
//!
//! Wires the interactive prompts, stream calibration, sink construction,
//! and the ingest engine into one session, then runs the continuation
//! loop: after each run the operator can stop, stream onto a new page of
//! the same workbook, or stream into a new file. The elapsed timer is
//! owned by the engine and survives continuations.

use crate::chart::{ChannelPacer, ChartBuffer, LogRenderer};
use crate::config::{AxisSelection, GraphMode, OutputFormat, ProtocolConfig};
use crate::engine::{IngestEngine, RunEnd};
use crate::error::{DaqError, Result};
use crate::prompt::{ensure_extension, stdin_channel, Console, Continuation};
use crate::sink::{FlatFileSink, RecordSink, WorkbookSink};
use crate::source::{calibrate, list_ports, LineSource, SerialLineSource, StreamTiming};
use std::path::PathBuf;
use std::time::Duration;

/// Sample delay substituted when the measured cadence rounds to zero and
/// the operator still wants a live chart
const DELAY_FLOOR_SECS: f64 = 0.001;

/// Read timeout used while calibrating, before the cadence is known
const CALIBRATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the command line may pin down ahead of the prompts
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub port: Option<String>,
    pub baud: u32,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub graph: Option<GraphMode>,
    pub x_col: Option<usize>,
    pub y_col: Option<usize>,
    pub protocol_config: Option<PathBuf>,
}

/// Axis selection from the command line, if both columns were given and
/// fall inside the header
fn axes_from_options(
    x: Option<usize>,
    y: Option<usize>,
    header_len: usize,
) -> Option<AxisSelection> {
    match (x, y) {
        (Some(x), Some(y)) if x < header_len && y < header_len => {
            Some(AxisSelection { x, y })
        }
        (Some(_), Some(_)) => {
            tracing::warn!("axis columns out of range for the header; asking instead");
            None
        }
        _ => None,
    }
}

/// Run one full acquisition session to completion
pub fn run_session(opts: SessionOptions) -> Result<()> {
    let cfg = ProtocolConfig::load_or_default(opts.protocol_config.as_deref());
    let console = Console::new(stdin_channel());

    let port = match opts.port.clone() {
        Some(p) => p,
        None => console.pick_port(&list_ports()?)?,
    };

    // Measure the cadence on a throwaway connection; reopening resets the
    // device, so the stream preamble replays for the real run
    let timing = {
        let mut probe = SerialLineSource::open(&port, opts.baud, CALIBRATION_TIMEOUT)?;
        let timing = calibrate(&mut probe, &cfg);
        probe.close()?;
        timing?
    };
    let timing = resolve_zero_delay(timing, &console)?;
    let header = timing.header.clone();

    let format = match opts.format {
        Some(f) => f,
        None => console.output_format()?,
    };
    let path = match opts.output.clone() {
        Some(p) => {
            let p = ensure_extension(&p.to_string_lossy(), format.extension());
            if let Some(parent) = p.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            p
        }
        None => console.output_path(format)?,
    };

    let mut sink: Box<dyn RecordSink> = match format {
        OutputFormat::Workbook => Box::new(WorkbookSink::new(path, header.clone())),
        OutputFormat::Csv => Box::new(FlatFileSink::new(path, header.clone(), cfg.delimiter)?),
    };

    let graph = match opts.graph {
        Some(g) => g,
        None => console.graph_mode(format == OutputFormat::Workbook)?,
    };
    let axes = if graph == GraphMode::Off {
        None
    } else {
        match axes_from_options(opts.x_col, opts.y_col, header.len()) {
            Some(a) => Some(a),
            None => Some(console.axis_selection(&header)?),
        }
    };

    let mut engine = IngestEngine::new(cfg.clone(), header, axes);

    loop {
        if sink.needs_page_name() {
            let name = console.sheet_name(&sink.page_names())?;
            sink.new_page(&name)?;
        }

        let mut chart = build_chart(graph, &cfg, &timing, &console);
        let mut source = SerialLineSource::open(&port, opts.baud, timing.read_timeout())?;
        let end = engine.run(&mut source, sink.as_mut(), &mut chart);

        if let RunEnd::Faulted(msg) = end {
            sink.finish()?;
            return Err(DaqError::Source(msg));
        }

        if let Some(axes) = axes {
            sink.attach_chart(axes.x, axes.y)?;
        }

        match console.continuation(sink.needs_page_name())? {
            Continuation::Stop => break,
            Continuation::NewPage => {}
            Continuation::NewFile => {
                let next = console.output_path(format)?;
                sink.switch_file(&next)?;
            }
        }
    }

    sink.finish()?;
    Ok(())
}

/// A zero measured delay cannot pace a live chart; offer the floor
fn resolve_zero_delay(timing: StreamTiming, console: &Console) -> Result<StreamTiming> {
    if timing.sample_delay > 0.0 {
        return Ok(timing);
    }
    if console.accept_delay_floor()? {
        Ok(StreamTiming::new(timing.header, DELAY_FLOOR_SECS))
    } else {
        Ok(timing)
    }
}

/// Build the run's chart buffer for the chosen mode and measured cadence
fn build_chart(
    graph: GraphMode,
    cfg: &ProtocolConfig,
    timing: &StreamTiming,
    console: &Console,
) -> ChartBuffer {
    if graph != GraphMode::Live {
        return ChartBuffer::disabled();
    }
    let Some(capacity) = ChartBuffer::capacity_for(cfg.plot_interval, timing.sample_delay)
    else {
        tracing::warn!("sample delay is zero; live charting disabled");
        return ChartBuffer::disabled();
    };
    ChartBuffer::live(
        capacity,
        Duration::from_secs_f64(timing.graph_pause.max(0.0)),
        Box::new(LogRenderer::new()),
        Box::new(ChannelPacer::new(console.input_channel())),
    )
}
