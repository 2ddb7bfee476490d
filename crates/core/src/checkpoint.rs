// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint directory naming and the set tracking which have been emitted.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Parse a `checkpoint-<digits>` basename, returning the trailing integer.
///
/// Used both to recognize checkpoint directories (C3) and to compute the
/// `checkpoint` tag on model-kind artifacts (§3 `ArtifactDescriptor`).
pub fn checkpoint_number(basename: &str) -> Option<u64> {
    basename.strip_prefix("checkpoint-")?.parse::<u64>().ok()
}

/// Extract the trailing integer from any directory basename, not just ones
/// matching the `checkpoint-<digits>` pattern exactly (used by
/// `register_model`'s tag computation, which operates on arbitrary
/// checkpoint directory paths per §4.1).
pub fn trailing_number(path: &Path) -> Option<u64> {
    let basename = path.file_name()?.to_str()?;
    let digits: String = basename.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.chars().rev().collect::<String>().parse::<u64>().ok()
}

/// Monotonically growing set of checkpoint paths already handed to the
/// uploader (§3 `CheckpointSet`). `emit` returns `true` at most once per
/// distinct path for the lifetime of the owning watcher.
#[derive(Debug, Default)]
pub struct CheckpointSet {
    seen: HashSet<PathBuf>,
}

impl CheckpointSet {
    pub fn new() -> Self {
        Self { seen: HashSet::new() }
    }

    /// Mark `path` as emitted. Returns `true` if this is the first time;
    /// `false` if it was already emitted.
    pub fn emit(&mut self, path: PathBuf) -> bool {
        self.seen.insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
