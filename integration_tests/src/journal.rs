//! Append-only journal file for received lines.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use trident_telemetry_firmware::journal::{format_entry, JournalError, MessageJournal};

pub struct FileJournal {
    writer: BufWriter<File>,
}

impl FileJournal {
    /// Open `path` for appending and write a session header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);

        let boot = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        writeln!(writer, "=== UART Log Started ===")?;
        writeln!(writer, "Boot time: {}", boot)?;
        writeln!(writer, "Format: timestamp,validity,message")?;
        writeln!(writer, "========================")?;
        writer.flush()?;

        Ok(Self { writer })
    }
}

impl MessageJournal for FileJournal {
    fn append(&mut self, timestamp_ms: u32, valid: bool, line: &[u8]) -> Result<(), JournalError> {
        let entry = format_entry(timestamp_ms, valid, line)?;
        writeln!(self.writer, "{}", entry).map_err(|_| JournalError::Io)?;
        self.writer.flush().map_err(|_| JournalError::Io)
    }
}
