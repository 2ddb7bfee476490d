// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact descriptors handed from the checkpoint watcher to the uploader (§3).

use crate::checkpoint::trailing_number;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    File,
    Directory,
    Model,
}

crate::simple_display! {
    ArtifactKind {
        File => "file",
        Directory => "directory",
        Model => "model",
    }
}

/// Describes a single artifact upload (§3 `ArtifactDescriptor`).
#[derive(Debug, Clone)]
pub struct ArtifactDescriptor {
    pub local_path: PathBuf,
    pub logical_name: String,
    pub kind: ArtifactKind,
}

impl ArtifactDescriptor {
    pub fn new(local_path: PathBuf, logical_name: impl Into<String>, kind: ArtifactKind) -> Self {
        Self { local_path, logical_name: logical_name.into(), kind }
    }

    /// For model-kind artifacts, the checkpoint number extracted from the
    /// trailing integer in the directory basename (§3, §4.1 tag
    /// computation). `None` for non-model kinds or unparseable basenames.
    pub fn checkpoint_tag(&self) -> Option<u64> {
        if self.kind != ArtifactKind::Model {
            return None;
        }
        trailing_number(&self.local_path)
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
