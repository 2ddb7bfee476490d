// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Tracker` capability interface (§4.1 C1).
//!
//! A tracker owns at most one active run at a time. Callers drive it
//! through `init_run` -> repeated `log_*` calls -> `finish_run`. Every
//! method is `&self`; interior mutability lives behind [`crate::guard::RunGuard`]
//! so a tracker can be shared as `Arc<dyn Tracker>` across the monitor loop
//! and the job worker task.

use crate::error::TrackerError;
use crate::run_handle::RunHandle;
use async_trait::async_trait;
use jobcore_core::ArtifactDescriptor;
use std::collections::BTreeMap;
use std::path::Path;

#[async_trait]
pub trait Tracker: Send + Sync {
    /// Open a new run for `job_name`, seeded with the initial config.
    /// Fails with `TrackerError::AlreadyActive` if a run is already open.
    ///
    /// `train_parent_id` links this run to a prior training run for
    /// cross-run metric attachment (e.g. an evaluation run scored against
    /// its training run). If the parent run cannot be resolved, the
    /// implementation logs a warning and continues unlinked rather than
    /// failing `init_run`.
    async fn init_run(
        &self,
        job_name: &str,
        config: &BTreeMap<String, serde_json::Value>,
        train_parent_id: Option<&str>,
    ) -> Result<RunHandle, TrackerError>;

    /// Log one scalar metric at `step`. Idempotent: a repeat of the same
    /// (key, step) is accepted and ignored rather than erroring.
    async fn log_metric(&self, key: &str, value: f64, step: u64) -> Result<(), TrackerError>;

    /// Log a batch of scalar metrics sharing one `step`.
    async fn log_metrics(
        &self,
        values: &BTreeMap<String, f64>,
        step: u64,
    ) -> Result<(), TrackerError> {
        for (key, value) in values {
            self.log_metric(key, *value, step).await?;
        }
        Ok(())
    }

    /// Log a tabular artifact (e.g. an eval results table).
    async fn log_table(&self, name: &str, rows: &[BTreeMap<String, serde_json::Value>]) -> Result<(), TrackerError>;

    /// Upload a single file artifact.
    async fn log_artifact(&self, artifact: &ArtifactDescriptor) -> Result<(), TrackerError>;

    /// Upload a directory artifact (e.g. a checkpoint directory).
    async fn log_directory(&self, path: &Path, logical_name: &str) -> Result<(), TrackerError>;

    /// Register a trained checkpoint as a named model version (§4.1).
    ///
    /// Side effects: uploads `path` as an artifact under `model/<basename>`,
    /// registers it in the backend's model registry under `collection`,
    /// attaches tags `{checkpoint, original, evaluate=pending}`, and
    /// returns the resulting `"<registry>/<collection>/<version>"` URI.
    async fn register_model(
        &self,
        path: &Path,
        model_name: &str,
        collection: &str,
        registry: &str,
    ) -> Result<String, TrackerError>;

    /// Merge additional keys into the run's config after `init_run`.
    async fn update_config(
        &self,
        config: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), TrackerError>;

    /// Close the active run. Idempotent: calling this with no active run
    /// succeeds as a no-op rather than erroring.
    async fn finish_run(&self) -> Result<(), TrackerError>;

    /// The handle of the currently active run, if any.
    fn current_run(&self) -> Option<RunHandle>;
}

/// Coerce a `log_table` key to end with `.json` (§4.1), without doubling
/// the suffix if the caller already supplied it.
pub fn ensure_json_suffix(key: &str) -> String {
    if key.ends_with(".json") {
        key.to_string()
    } else {
        format!("{key}.json")
    }
}
