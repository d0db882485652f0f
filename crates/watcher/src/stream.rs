// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One append-only log file's tailing state: the byte offset the Log Watcher
//! has consumed up to, and the "have I seen X yet" flags that drive the
//! `sessionStart`/`assistantFirstResponse` convenience events.

use cso_core::{parse_record, CliSessionId, LogRecord, WatchEvent};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Per-stream tailing state, the watcher equivalent of the teacher's
/// `SessionLogParser` — but emitting semantic `WatchEvent`s instead of a
/// single derived `AgentState`.
pub struct LogStream {
    pub cli_session_id: CliSessionId,
    path: PathBuf,
    offset: u64,
    seen_any_record: bool,
    seen_assistant_record: bool,
}

impl LogStream {
    /// A stream discovered mid-session starts at end-of-file (§4.3: "start
    /// at end-of-file for efficiency... backfill on demand"); `start_offset`
    /// lets callers opt into cold-start backfill from 0 instead.
    pub fn new(cli_session_id: CliSessionId, path: PathBuf, start_offset: u64) -> Self {
        Self { cli_session_id, path, offset: start_offset, seen_any_record: false, seen_assistant_record: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse every complete line appended since the last poll.
    /// Partial trailing lines are left for the next call (the offset isn't
    /// advanced past them). A file that shrank below our offset is treated
    /// as truncated and re-read from the start.
    pub fn poll(&mut self) -> Vec<WatchEvent> {
        let Ok(file) = File::open(&self.path) else {
            return Vec::new();
        };
        let file_len = file.metadata().map(|m| m.len()).unwrap_or(0);
        if file_len < self.offset {
            self.offset = 0;
        }
        if file_len == self.offset {
            return Vec::new();
        }

        let mut reader = BufReader::new(file);
        if reader.seek(SeekFrom::Start(self.offset)).is_err() {
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            if !line.ends_with('\n') {
                break;
            }
            self.offset += bytes_read as u64;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some(record) = parse_record(trimmed) else {
                tracing::debug!(path = %self.path.display(), "skipping unparseable log record");
                continue;
            };

            events.extend(self.events_for_record(record));
        }

        events
    }

    fn events_for_record(&mut self, record: LogRecord) -> Vec<WatchEvent> {
        let cli_session_id = self.cli_session_id.clone();
        let mut events = Vec::new();

        if !self.seen_any_record {
            self.seen_any_record = true;
            events.push(WatchEvent::SessionStart { cli_session_id: cli_session_id.clone() });
        }

        events.push(WatchEvent::CorrelationCandidate { cli_session_id: cli_session_id.clone(), record: record.clone() });

        match &record {
            LogRecord::User { .. } => {
                events.push(WatchEvent::UserPromptSubmit { cli_session_id: cli_session_id.clone(), record: record.clone() });
            }
            LogRecord::Assistant { .. } => {
                if !self.seen_assistant_record {
                    self.seen_assistant_record = true;
                    events.push(WatchEvent::AssistantFirstResponse { cli_session_id: cli_session_id.clone(), record: record.clone() });
                }
                if let Some(text) = record.assistant_text() {
                    if !text.is_empty() {
                        events.push(WatchEvent::AssistantText { cli_session_id: cli_session_id.clone(), text, record: record.clone() });
                    }
                }
                if record.is_end_of_turn() {
                    events.push(WatchEvent::Stop { cli_session_id: cli_session_id.clone() });
                }
            }
            LogRecord::Stop { .. } => {
                events.push(WatchEvent::Stop { cli_session_id });
            }
        }

        events
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
