// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log Tailer (§4.2 C2).
//!
//! Polls a structured append-only file (`<output_dir>/trainer_log.jsonl`,
//! §6) for lines that have not yet been forwarded. Each call to `poll`
//! re-reads the file from scratch and returns only the records past the
//! current [`LogCursor`] — there is no OS-level file watching here, by
//! design (§4.2 Non-goal); the Monitor Loop decides how often to call it.

use jobcore_core::{LogCursor, MetricRecord};
use std::io;
use std::path::{Path, PathBuf};

pub struct LogTailer {
    path: PathBuf,
    cursor: LogCursor,
}

impl LogTailer {
    /// `starting_cursor` lets a restarted job pick up where a prior
    /// process left off without re-emitting already-forwarded records
    /// (§4.2 restart safety).
    pub fn new(path: impl Into<PathBuf>, starting_cursor: LogCursor) -> Self {
        Self { path: path.into(), cursor: starting_cursor }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cursor(&self) -> LogCursor {
        self.cursor
    }

    /// Read every line with ordinal strictly greater than the cursor and
    /// advance it past them. A missing file is not an error — it simply
    /// hasn't been created by the child yet — and returns no records.
    pub fn poll(&mut self) -> io::Result<Vec<MetricRecord>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let lines: Vec<&str> = contents.lines().collect();
        let total = lines.len() as u64;
        if total <= self.cursor.ordinal() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for line in &lines[self.cursor.ordinal() as usize..] {
            if let Some(record) = parse_record(line) {
                records.push(record);
            }
        }
        self.cursor.advance_to(total);
        Ok(records)
    }
}

/// Parse one line as a JSON object and keep only its numeric fields
/// (§3 `MetricRecord`). Non-JSON and non-object lines are ordinary
/// training chatter, logged and skipped rather than treated as errors;
/// the cursor still advances past them either way (§4.2).
fn parse_record(line: &str) -> Option<MetricRecord> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => {
            let record = MetricRecord::from_raw(&map, None);
            if record.values.is_empty() {
                None
            } else {
                Some(record)
            }
        }
        Ok(_) => None,
        Err(_) => {
            tracing::debug!(line = %trimmed, "malformed trainer log line, skipped");
            None
        }
    }
}

#[cfg(test)]
#[path = "tailer_tests.rs"]
mod tailer_tests;
