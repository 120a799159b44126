//! Serial-port record source

use super::LineSource;
use crate::error::{DaqError, Result};
use serialport::SerialPort;
use std::io::Read;
use std::time::Duration;

/// Serial implementation of [`LineSource`].
///
/// Records are newline-terminated; carriage returns are stripped. A read
/// that times out mid-line discards the partial bytes and reports an empty
/// record, matching the quiet-stream contract.
pub struct SerialLineSource {
    port: Option<Box<dyn SerialPort>>,
    name: String,
}

impl SerialLineSource {
    /// Open `name` at `baud` with the given bounded-read timeout
    pub fn open(name: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(name, baud).timeout(timeout).open()?;
        tracing::info!("Opened serial port {} at {} baud", name, baud);
        Ok(Self {
            port: Some(port),
            name: name.to_string(),
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| DaqError::Source(format!("serial port {} is closed", self.name)))
    }
}

impl LineSource for SerialLineSource {
    fn read_line(&mut self) -> Result<String> {
        let port = self.port_mut()?;
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    bytes.push(byte[0]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    tracing::debug!("serial read timed out on {}", self.name);
                    return Ok(String::new());
                }
                Err(e) => return Err(e.into()),
            }
        }
        match String::from_utf8(bytes) {
            Ok(mut line) => {
                if line.ends_with('\r') {
                    line.pop();
                }
                Ok(line)
            }
            Err(_) => {
                tracing::warn!("discarding undecodable record from {}", self.name);
                Ok(String::new())
            }
        }
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port_mut()?.set_timeout(timeout)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            tracing::info!("Closed serial port {}", self.name);
        }
        Ok(())
    }
}

/// Names of the serial ports currently present on the system
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
