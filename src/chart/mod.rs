//! Live chart buffering with paced batch flushes
//!
//! The chart side of a run is a bounded double buffer of (x, y) plot
//! values. Samples accumulate until the buffer fills, then the whole
//! segment is handed to a [`SegmentRenderer`] and the loop pauses via a
//! [`Pacer`], a cancellation-aware timed wait independent of any
//! rendering toolkit. After a flush the last plotted point is carried
//! over to slot 0 so consecutive segments connect visually.

pub mod live;

pub use live::{ChannelPacer, LogRenderer};

use crate::protocol::cell::CellValue;
use std::time::Duration;

/// A value a chart axis can accept: numeric, or string-categorical.
/// Datetime-like cells arrive here already stringified.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotValue {
    Number(f64),
    Label(String),
}

impl From<&CellValue> for PlotValue {
    fn from(v: &CellValue) -> Self {
        match v {
            CellValue::Timer(n) => PlotValue::Number(*n),
            CellValue::Number { value, .. } => PlotValue::Number(*value),
            CellValue::Time(_) | CellValue::Date(_) => PlotValue::Label(v.display_string()),
            CellValue::Text(s) => PlotValue::Label(s.clone()),
        }
    }
}

/// Result of a pacing wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceOutcome {
    /// The interval elapsed; keep streaming
    Continue,
    /// The operator asked to stop; terminate the ingest loop cleanly
    Cancelled,
}

/// Renders one flushed segment of the live chart
pub trait SegmentRenderer {
    /// Called once when the axis labels become known, and again if they change
    fn set_axis_labels(&mut self, _x: &str, _y: &str) {}

    /// Render one contiguous line segment
    fn render_segment(&mut self, points: &[(PlotValue, PlotValue)]);
}

/// A bounded wait between chart redraws that an operator can cut short
pub trait Pacer {
    /// Block up to `timeout`, returning whether cancellation was requested
    fn pause(&mut self, timeout: Duration) -> PaceOutcome;
}

/// Bounded double buffer of (x, y) samples with flush-on-fill semantics.
///
/// A disabled buffer (no live chart) accepts `add` calls as no-ops so the
/// engine never branches on the chart mode.
pub struct ChartBuffer {
    live: bool,
    capacity: usize,
    cursor: usize,
    xs: Vec<Option<PlotValue>>,
    ys: Vec<Option<PlotValue>>,
    pause: Duration,
    segments_flushed: u32,
    renderer: Option<Box<dyn SegmentRenderer>>,
    pacer: Option<Box<dyn Pacer>>,
    x_label: String,
    y_label: String,
}

impl ChartBuffer {
    /// A buffer that ignores all samples (charting off or file-only)
    pub fn disabled() -> Self {
        Self {
            live: false,
            capacity: 0,
            cursor: 0,
            xs: Vec::new(),
            ys: Vec::new(),
            pause: Duration::ZERO,
            segments_flushed: 0,
            renderer: None,
            pacer: None,
            x_label: String::new(),
            y_label: String::new(),
        }
    }

    /// A live buffer of the given capacity.
    ///
    /// `pause` is the wait after each flushed segment; capacity must be at
    /// least 2 (one slot for the continuity carry-over plus one fresh point).
    pub fn live(
        capacity: usize,
        pause: Duration,
        renderer: Box<dyn SegmentRenderer>,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        let capacity = capacity.max(2);
        Self {
            live: true,
            capacity,
            cursor: 0,
            xs: vec![None; capacity],
            ys: vec![None; capacity],
            pause,
            segments_flushed: 0,
            renderer: Some(renderer),
            pacer: Some(pacer),
            x_label: String::new(),
            y_label: String::new(),
        }
    }

    /// Buffer capacity for the measured stream cadence.
    ///
    /// `floor(plot_interval / sample_delay) + 2`: one slot is reserved for
    /// the continuity carry-over and one more guarantees a fresh point per
    /// flush even when the sample delay exceeds the plot interval. A zero
    /// sample delay returns None; live charting must be forced off, since
    /// the capacity would be unbounded.
    pub fn capacity_for(plot_interval: f64, sample_delay: f64) -> Option<usize> {
        if sample_delay <= 0.0 {
            return None;
        }
        Some((plot_interval / sample_delay).floor() as usize + 2)
    }

    /// Whether samples are being buffered for a live chart
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Current write cursor (always in `[0, capacity)` for a live buffer)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of segments flushed on the current page
    pub fn segments_flushed(&self) -> u32 {
        self.segments_flushed
    }

    /// Set the axis labels. Labels persist across `reset`.
    pub fn set_axis_labels(&mut self, x: &str, y: &str) {
        if !self.live {
            return;
        }
        self.x_label = x.to_string();
        self.y_label = y.to_string();
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_axis_labels(x, y);
        }
    }

    /// Buffer one sample; flushes when the buffer fills.
    /// No-op for a disabled buffer.
    pub fn add(&mut self, x: PlotValue, y: PlotValue) -> PaceOutcome {
        if !self.live {
            return PaceOutcome::Continue;
        }
        self.xs[self.cursor] = Some(x);
        self.ys[self.cursor] = Some(y);
        self.cursor += 1;
        if self.cursor == self.capacity {
            return self.flush();
        }
        PaceOutcome::Continue
    }

    /// Render the buffered segment and pace the caller.
    ///
    /// Slot 0 is then seeded with the last plotted point so the next
    /// segment connects to this one, and the cursor restarts at 1.
    pub fn flush(&mut self) -> PaceOutcome {
        if !self.live || self.cursor == 0 {
            return PaceOutcome::Continue;
        }

        let points: Vec<(PlotValue, PlotValue)> = self.xs[..self.cursor]
            .iter()
            .zip(&self.ys[..self.cursor])
            .filter_map(|(x, y)| Some((x.clone()?, y.clone()?)))
            .collect();

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render_segment(&points);
        }
        self.segments_flushed += 1;

        let outcome = match self.pacer.as_mut() {
            Some(pacer) => pacer.pause(self.pause),
            None => PaceOutcome::Continue,
        };

        let last = self.cursor - 1;
        self.xs[0] = self.xs[last].clone();
        self.ys[0] = self.ys[last].clone();
        self.cursor = 1;

        outcome
    }

    /// Clear every slot and restart at cursor 0.
    ///
    /// The continuity carry-over is dropped deliberately: a reset
    /// accompanies a page reset, so the next segment starts fresh.
    /// Axis labels are preserved.
    pub fn reset(&mut self) {
        if !self.live {
            return;
        }
        for slot in self.xs.iter_mut() {
            *slot = None;
        }
        for slot in self.ys.iter_mut() {
            *slot = None;
        }
        self.cursor = 0;
        self.segments_flushed = 0;
    }
}
