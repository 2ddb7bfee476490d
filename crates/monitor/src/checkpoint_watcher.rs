// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint Watcher (§4.3 C3).
//!
//! Periodically scans the training output directory for
//! `checkpoint-<N>` subdirectories and reports each one exactly once,
//! in ascending step order, via [`jobcore_core::CheckpointSet`].

use jobcore_core::{checkpoint_number, CheckpointSet};
use std::io;
use std::path::{Path, PathBuf};

pub struct CheckpointWatcher {
    output_dir: PathBuf,
    seen: CheckpointSet,
}

impl CheckpointWatcher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            seen: CheckpointSet::new(),
        }
    }

    /// Scan `output_dir` once, synchronously. Callers running inside an
    /// async context should wrap this in `spawn_blocking`.
    ///
    /// Newly-observed checkpoints are returned sorted by last-modification
    /// time ascending (§4.3), not by checkpoint number, so the uploader
    /// processes whichever checkpoint was actually written first.
    pub fn scan(&mut self) -> io::Result<Vec<(u64, PathBuf)>> {
        let mut found = match std::fs::read_dir(&self.output_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| {
                    let path = entry.path();
                    if !path.is_dir() {
                        return None;
                    }
                    let name = path.file_name()?.to_str()?.to_string();
                    let step = checkpoint_number(&name)?;
                    let modified = entry.metadata().ok()?.modified().ok()?;
                    Some((step, path, modified))
                })
                .collect::<Vec<_>>(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.output_dir.display(), "output directory does not exist yet");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        found.sort_by_key(|(_, _, modified)| *modified);

        let mut new_checkpoints = Vec::new();
        for (step, path, _) in found {
            if self.seen.emit(path.clone()) {
                new_checkpoints.push((step, path));
            }
        }
        Ok(new_checkpoints)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
#[path = "checkpoint_watcher_tests.rs"]
mod checkpoint_watcher_tests;
