//! Serial connection to a board running the UART telemetry sender.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::SerialPort;

/// Longest line accepted before it is returned as-is
const MAX_LINE: usize = 256;

/// Pick the first USB serial adapter
pub fn find_port() -> Result<String> {
    let ports = serialport::available_ports()?;
    ports
        .into_iter()
        .map(|p| p.port_name)
        .find(|name| name.contains("ttyUSB") || name.contains("ttyACM") || name.contains("usbserial"))
        .ok_or_else(|| anyhow::anyhow!("No serial adapter found - ensure the sender is connected"))
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// Line-oriented client for the text telemetry link.
pub struct DeviceClient {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl DeviceClient {
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }

    /// Clear any pending data in the serial buffer.
    pub fn clear_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;
        self.pending.clear();
        Ok(())
    }

    /// Next non-empty line without its terminator, or `None` after `timeout`.
    pub fn read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let start = Instant::now();
        let mut buf = [0u8; 64];

        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            if start.elapsed() >= timeout {
                return Ok(None);
            }

            match self.port.read(&mut buf) {
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        loop {
            let end = self.pending.iter().position(|&b| b == b'\n' || b == b'\r');
            match end {
                Some(0) => {
                    self.pending.remove(0);
                }
                Some(end) => {
                    let line = self.pending[..end].to_vec();
                    self.pending.drain(..=end);
                    return Some(line);
                }
                None if self.pending.len() >= MAX_LINE => {
                    return Some(self.pending.drain(..).collect());
                }
                None => return None,
            }
        }
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}
