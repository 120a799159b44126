//! Live-mode collaborators: the operator-cancellable pacer and the
//! default segment renderer.

use super::{PaceOutcome, Pacer, PlotValue, SegmentRenderer};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Pacer backed by a crossbeam channel.
///
/// Any message on the channel (in practice a line the operator typed on
/// stdin) counts as a cancellation request. A message that arrived while
/// the engine was busy streaming is honored at the next pause rather than
/// lost.
pub struct ChannelPacer {
    rx: Receiver<String>,
}

impl ChannelPacer {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }
}

impl Pacer for ChannelPacer {
    fn pause(&mut self, timeout: Duration) -> PaceOutcome {
        if self.rx.try_recv().is_ok() {
            return PaceOutcome::Cancelled;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(_) => PaceOutcome::Cancelled,
            Err(RecvTimeoutError::Timeout) => PaceOutcome::Continue,
            // A closed channel means no operator; just keep streaming
            Err(RecvTimeoutError::Disconnected) => PaceOutcome::Continue,
        }
    }
}

/// Default renderer: summarizes each segment through tracing.
///
/// The rendering toolkit itself is out of scope; anything that can draw a
/// line segment can implement [`SegmentRenderer`] instead.
#[derive(Debug, Default)]
pub struct LogRenderer {
    segments: u32,
    x_label: String,
    y_label: String,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SegmentRenderer for LogRenderer {
    fn set_axis_labels(&mut self, x: &str, y: &str) {
        self.x_label = x.to_string();
        self.y_label = y.to_string();
    }

    fn render_segment(&mut self, points: &[(PlotValue, PlotValue)]) {
        self.segments += 1;

        let numeric: Vec<f64> = points
            .iter()
            .filter_map(|(_, y)| match y {
                PlotValue::Number(v) => Some(*v),
                PlotValue::Label(_) => None,
            })
            .collect();

        if numeric.is_empty() {
            tracing::info!(
                segment = self.segments,
                points = points.len(),
                "chart segment ({} vs {})",
                self.y_label,
                self.x_label,
            );
            return;
        }

        let min = numeric.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = numeric.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        tracing::info!(
            segment = self.segments,
            points = points.len(),
            y_min = min,
            y_max = max,
            "chart segment ({} vs {})",
            self.y_label,
            self.x_label,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_pacer_times_out_as_continue() {
        let (_tx, rx) = unbounded::<String>();
        let mut pacer = ChannelPacer::new(rx);
        assert_eq!(
            pacer.pause(Duration::from_millis(5)),
            PaceOutcome::Continue
        );
    }

    #[test]
    fn test_pacer_cancels_on_message() {
        let (tx, rx) = unbounded::<String>();
        let mut pacer = ChannelPacer::new(rx);
        tx.send(String::new()).unwrap();
        assert_eq!(
            pacer.pause(Duration::from_secs(5)),
            PaceOutcome::Cancelled
        );
    }

    #[test]
    fn test_pacer_disconnected_continues() {
        let (tx, rx) = unbounded::<String>();
        drop(tx);
        let mut pacer = ChannelPacer::new(rx);
        assert_eq!(
            pacer.pause(Duration::from_millis(5)),
            PaceOutcome::Continue
        );
    }

    #[test]
    fn test_log_renderer_counts_segments() {
        let mut renderer = LogRenderer::new();
        renderer.set_axis_labels("t", "v");
        renderer.render_segment(&[
            (PlotValue::Number(0.0), PlotValue::Number(1.0)),
            (PlotValue::Number(1.0), PlotValue::Number(2.0)),
        ]);
        renderer.render_segment(&[(PlotValue::Label("a".into()), PlotValue::Label("b".into()))]);
        assert_eq!(renderer.segments, 2);
    }
}
