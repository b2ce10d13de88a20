//! Receive side of the UART link, run on the host.
//!
//! Validates every line the sender emits, journals it and answers with the
//! same ACK line the firmware receiver would send.

use std::time::{Duration, Instant};

use anyhow::Result;
use colored::Colorize;
use trident_telemetry_firmware::journal::MessageJournal;
use trident_telemetry_firmware::protocol::text::{decode, extract_message_id, format_ack};

use crate::device::DeviceClient;

/// One line seen during a capture
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub line: String,
    pub message_id: u32,
    pub valid: bool,
    /// Sensor short name, for valid DATA lines
    pub sensor: Option<String>,
    pub device: Option<String>,
    pub error: Option<String>,
}

/// Classify a received line the way the firmware receiver does
pub fn observe(line: &[u8]) -> Observation {
    let text = String::from_utf8_lossy(line).into_owned();
    let message_id = extract_message_id(line);

    match decode(line) {
        Ok(frame) => {
            let record = frame.record().ok();
            Observation {
                line: text,
                message_id,
                valid: true,
                sensor: record.map(|r| r.sensor.to_string()),
                device: record.map(|r| r.device.to_string()),
                error: None,
            }
        }
        Err(e) => Observation {
            line: text,
            message_id,
            valid: false,
            sensor: None,
            device: None,
            error: Some(e.to_string()),
        },
    }
}

/// Listen for `duration`, acknowledging and journaling each line.
pub fn capture<J: MessageJournal>(
    device: &mut DeviceClient,
    journal: &mut J,
    duration: Duration,
) -> Result<Vec<Observation>> {
    let start = Instant::now();
    let mut observations = Vec::new();

    while start.elapsed() < duration {
        let Some(line) = device.read_line(Duration::from_millis(200))? else {
            continue;
        };

        let elapsed_ms = start.elapsed().as_millis() as u32;
        let observation = observe(&line);

        if let Err(e) = journal.append(elapsed_ms, observation.valid, &line) {
            println!("  {} {}", "journal:".yellow(), e);
        }
        device.write_line(&format_ack(observation.message_id, observation.valid))?;

        if observation.valid {
            println!("  {} {}", "[VALID]".green(), observation.line);
        } else {
            println!(
                "  {} {} ({})",
                "[INVALID]".red(),
                observation.line,
                observation.error.as_deref().unwrap_or("?")
            );
        }

        observations.push(observation);
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trident_telemetry_firmware::protocol::text::format_frame;

    #[test]
    fn test_observe_valid_line() {
        let line = format_frame("esp32_sender", 12, "HUMID", 55.0, "%", 900).unwrap();
        let obs = observe(line.trim_end().as_bytes());
        assert!(obs.valid);
        assert_eq!(obs.message_id, 12);
        assert_eq!(obs.sensor.as_deref(), Some("HUMID"));
        assert_eq!(obs.device.as_deref(), Some("esp32_sender"));
    }

    #[test]
    fn test_observe_corrupt_line_keeps_id() {
        let obs = observe(b"$esp32_sender,0031,DATA,BAT,3.90,V,1*FF");
        assert!(!obs.valid);
        assert_eq!(obs.message_id, 31);
        assert!(obs.error.unwrap().contains("checksum"));
    }
}
