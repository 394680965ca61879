use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::EventRecord;

/// Durable destination for event records.
pub trait EventSink: Send {
    fn record(&mut self, event: &EventRecord) -> Result<()>;
}

/// Append-only log with one JSON object per line.
pub struct JsonLinesEventLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesEventLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create event log directory")?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(format!("Failed to open event log {:?}", path))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back; unparseable lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<EventRecord>> {
        let file = File::open(path.as_ref())
            .context(format!("Failed to open event log {:?}", path.as_ref()))?;

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if let Ok(record) = serde_json::from_str::<EventRecord>(&line) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl EventSink for JsonLinesEventLog {
    fn record(&mut self, event: &EventRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event).context("Failed to serialize event")?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().context("Failed to flush event log")?;
        Ok(())
    }
}
