//! Append-only alert log with an in-memory recent view

use crate::dispatch::NotificationJob;
use crate::sink::NotificationSink;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sentinel_core::{AlertEvent, Error, Result, WeaponClass};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One persisted alert, as serialized into the JSONL log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub raised_at: DateTime<Utc>,
    pub class: WeaponClass,
    pub confidence: f32,
    pub snapshot: Option<PathBuf>,
}

impl From<&AlertEvent> for AlertRecord {
    fn from(event: &AlertEvent) -> Self {
        Self {
            raised_at: event.raised_at,
            class: event.class,
            confidence: event.confidence,
            snapshot: event.snapshot.clone(),
        }
    }
}

/// Appends one JSON line per alert and keeps the most recent entries in
/// memory for the operator's recent-alerts view.
pub struct EventLogSink {
    path: PathBuf,
    recent: RwLock<VecDeque<AlertRecord>>,
    recent_capacity: usize,
}

impl EventLogSink {
    pub fn new(path: PathBuf, recent_capacity: usize) -> Self {
        Self {
            path,
            recent: RwLock::new(VecDeque::new()),
            recent_capacity: recent_capacity.max(1),
        }
    }

    /// Most recent alerts, oldest first, up to `count`.
    pub fn recent(&self, count: usize) -> Vec<AlertRecord> {
        let recent = self.recent.read();
        recent
            .iter()
            .skip(recent.len().saturating_sub(count))
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.recent.read().len()
    }

    pub fn clear(&self) {
        self.recent.write().clear();
    }

    /// Read the last `count` records back from a persisted log. Lines that
    /// fail to parse are skipped with a warning (the log may span versions).
    pub fn read_recent(path: &Path, count: usize) -> Result<Vec<AlertRecord>> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Sink(format!("cannot open {}: {e}", path.display())))?;
        let mut records = VecDeque::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| Error::Sink(format!("reading event log: {e}")))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AlertRecord>(&line) {
                Ok(record) => {
                    if records.len() == count {
                        records.pop_front();
                    }
                    records.push_back(record);
                }
                Err(e) => warn!(error = %e, "skipping unreadable event log line"),
            }
        }
        Ok(records.into())
    }
}

impl NotificationSink for EventLogSink {
    fn name(&self) -> &'static str {
        "event-log"
    }

    fn notify(&self, job: &NotificationJob) -> Result<()> {
        let record = AlertRecord::from(&job.event);

        {
            let mut recent = self.recent.write();
            if recent.len() == self.recent_capacity {
                recent.pop_front();
            }
            recent.push_back(record.clone());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Sink(format!("event log folder: {e}")))?;
            }
        }

        let line = serde_json::to_string(&record)
            .map_err(|e| Error::Sink(format!("encoding alert record: {e}")))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::Sink(format!("opening {}: {e}", self.path.display())))?;
        writeln!(file, "{line}")
            .map_err(|e| Error::Sink(format!("appending alert record: {e}")))?;
        Ok(())
    }
}
