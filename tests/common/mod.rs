//! Shared test helpers: a scripted in-memory line source

use serialdaq_rs::error::Result;
use serialdaq_rs::source::LineSource;
use std::collections::VecDeque;
use std::time::Duration;

/// Line source that replays a fixed script, optionally sleeping before
/// each read to mimic a device cadence. An exhausted script yields empty
/// lines, exactly like a quiet serial port.
pub struct ScriptedSource {
    lines: VecDeque<String>,
    delay: Duration,
    closed: bool,
}

impl ScriptedSource {
    pub fn new(lines: &[&str]) -> Self {
        Self::with_delay(lines, Duration::ZERO)
    }

    pub fn with_delay(lines: &[&str], delay: Duration) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            delay,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self) -> Result<String> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.lines.pop_front().unwrap_or_default())
    }

    fn set_read_timeout(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
