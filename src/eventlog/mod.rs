//! Structured event log: one JSON object per line in `~/.imsdash/events.jsonl`.
//!
//! Records what the dashboard and chat client did without putting it on the
//! terminal: seeds, reconciled polls, fetch failures, dropped ticks, and
//! chat fallbacks. Writing is best-effort; a log that cannot be opened
//! never interrupts polling.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::ImsConfig;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// Which part of the client produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Seed,
    Poll,
    Ticker,
    Chat,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seed => write!(f, "seed"),
            Self::Poll => write!(f, "poll"),
            Self::Ticker => write!(f, "ticker"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// A single line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub timestamp: String,
    pub kind: EventKind,
    /// Short machine-friendly outcome, e.g. `"appended"` or `"fetch-failed"`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Handle to the JSONL event log. A disabled handle drops every event.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// A log writing to an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Resolve the log location from `[logging]`.
    pub fn from_config(config: &ImsConfig) -> Self {
        if !config.logging.events_enabled {
            return Self::disabled();
        }
        if !config.logging.events_path.is_empty() {
            return Self::at(&config.logging.events_path);
        }
        Self {
            path: default_log_path(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an event. Failures are swallowed.
    pub fn record(&self, kind: EventKind, outcome: &str, detail: Option<&str>) {
        let entry = EventEntry {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            outcome: outcome.to_string(),
            detail: detail.map(str::to_string),
        };
        let _ = self.append(&entry);
    }

    /// Read the last `count` well-formed entries, oldest first.
    ///
    /// Malformed lines are skipped; a missing file reads as empty.
    pub fn read_recent(&self, count: usize) -> Vec<EventEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        let entries: Vec<EventEntry> = BufReader::new(file)
            .lines()
            .map_while(std::result::Result::ok)
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        let skip = entries.len().saturating_sub(count);
        entries.into_iter().skip(skip).collect()
    }

    fn append(&self, entry: &EventEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

/// Default log location: `~/.imsdash/events.jsonl`.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".imsdash").join("events.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn scratch_log(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir()
            .join(format!("imsdash-events-{nanos}"))
            .join(name)
    }

    #[test]
    fn records_and_reads_back_in_order() {
        let log = EventLog::at(scratch_log("events.jsonl"));
        log.record(EventKind::Seed, "history", Some("3 points"));
        log.record(EventKind::Poll, "appended", Some("Oct 19"));
        log.record(EventKind::Poll, "fetch-failed", None);

        let all = log.read_recent(10);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].kind, EventKind::Seed);
        assert_eq!(all[0].detail.as_deref(), Some("3 points"));
        assert_eq!(all[2].outcome, "fetch-failed");
        assert!(all[2].detail.is_none());

        let last = log.read_recent(1);
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].outcome, "fetch-failed");
    }

    #[test]
    fn skips_malformed_lines() {
        let path = scratch_log("mixed.jsonl");
        let log = EventLog::at(&path);
        log.record(EventKind::Chat, "fallback", None);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();
        log.record(EventKind::Chat, "fallback", None);

        assert_eq!(log.read_recent(10).len(), 2);
    }

    #[test]
    fn disabled_log_is_inert() {
        let log = EventLog::disabled();
        log.record(EventKind::Poll, "appended", None);
        assert!(log.path().is_none());
        assert!(log.read_recent(5).is_empty());
    }

    #[test]
    fn from_config_honours_switch_and_override() {
        let mut cfg = ImsConfig::default();
        cfg.logging.events_enabled = false;
        assert!(EventLog::from_config(&cfg).path().is_none());

        cfg.logging.events_enabled = true;
        cfg.logging.events_path = "/tmp/ims-events.jsonl".to_string();
        assert_eq!(
            EventLog::from_config(&cfg).path(),
            Some(Path::new("/tmp/ims-events.jsonl"))
        );
    }

    #[test]
    fn entry_omits_empty_detail() {
        let entry = EventEntry {
            timestamp: "2026-10-19T10:00:00+00:00".to_string(),
            kind: EventKind::Ticker,
            outcome: "dropped".to_string(),
            detail: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"kind\":\"ticker\""));
        assert!(!json.contains("detail"));
    }
}
