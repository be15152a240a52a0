//! Activity journal: append-only line-delimited JSON for the relay's
//! structural events.
//!
//! Each line is a self-contained JSON object. Lines are assembled in memory
//! and written whole so a tailing process never sees a partial record.
//! Volume is low by construction — only rejections and structural events
//! (annihilations, evictions, cascade clears) are journaled, never the
//! per-push happy path — so every line is flushed as written.
//!
//! Degradation chain:
//! 1. Primary file path
//! 2. Fallback path (e.g. `/dev/shm/dialog_relay.jsonl`)
//! 3. stderr with a `[DRL-JOURNAL]` prefix
//! 4. Silent discard (the control loop must never fail for logging reasons)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::JournalConfig;
use crate::fsm::identity::{Command, DialogId};

/// Severity level for journal entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Structural events worth a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEvent {
    RelayStarted,
    PushRejected,
    CreateAnnihilated,
    ChangeEvicted,
    NestedCleared,
    QueueCleared,
}

/// A single journal line — optional fields are omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Event type identifier.
    pub event: JournalEvent,
    /// Severity level.
    pub severity: Severity,
    /// Dialog identity involved, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialog: Option<String>,
    /// Command kind involved, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// DRL error code for rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JournalEntry {
    /// Create a new entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: JournalEvent, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            dialog: None,
            command: None,
            error_code: None,
            details: None,
        }
    }

    /// Attach the dialog/command pair the entry concerns.
    #[must_use]
    pub fn with_subject(mut self, command: Command, dialog: DialogId) -> Self {
        self.command = Some(command.to_string());
        self.dialog = Some(dialog.to_string());
        self
    }
}

/// Degradation state of the journal writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Fallback,
    Stderr,
    Discard,
}

/// Append-only JSONL journal with multi-level fallback.
#[derive(Debug)]
pub struct RelayJournal {
    writer: Option<BufWriter<File>>,
    state: WriterState,
}

impl RelayJournal {
    /// Open the journal per config. A disabled journal discards silently
    /// without touching the filesystem.
    #[must_use]
    pub fn open(config: &JournalConfig) -> Self {
        if !config.enabled {
            return Self {
                writer: None,
                state: WriterState::Discard,
            };
        }
        if let Some(writer) = open_append(&config.path) {
            return Self {
                writer: Some(writer),
                state: WriterState::Normal,
            };
        }
        if let Some(fallback) = config.fallback_path.as_deref() {
            if let Some(writer) = open_append(fallback) {
                return Self {
                    writer: Some(writer),
                    state: WriterState::Fallback,
                };
            }
        }
        Self {
            writer: None,
            state: WriterState::Stderr,
        }
    }

    /// Write a single entry as one whole JSONL line.
    pub fn record(&mut self, entry: &JournalEntry) {
        if self.state == WriterState::Discard {
            return;
        }
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                // Serialization failure is a programming error; say so once
                // on stderr and drop the entry.
                let _ = writeln!(io::stderr(), "[DRL-JOURNAL] serialize error: {e}");
                return;
            }
        };
        match self.writer.as_mut() {
            Some(writer) => {
                if writer.write_all(line.as_bytes()).is_err() || writer.flush().is_err() {
                    self.writer = None;
                    self.state = WriterState::Stderr;
                    let _ = write!(io::stderr(), "[DRL-JOURNAL] {line}");
                }
            }
            None => {
                let _ = write!(io::stderr(), "[DRL-JOURNAL] {line}");
            }
        }
    }

    /// Whether entries currently reach a file.
    #[must_use]
    pub const fn writes_to_file(&self) -> bool {
        matches!(self.state, WriterState::Normal | WriterState::Fallback)
    }
}

fn open_append(path: &Path) -> Option<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            // Best effort; open below reports the real failure.
            let _ = fs::create_dir_all(parent);
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(BufWriter::new)
        .ok()
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
