// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory tracker fake for tests (`test-support` feature).
//!
//! Records every call it receives so tests can assert on ordering and
//! content without a network round-trip.

use crate::error::TrackerError;
use crate::guard::RunGuard;
use crate::run_handle::RunHandle;
use crate::tracker::Tracker;
use async_trait::async_trait;
use jobcore_core::{ArtifactDescriptor, TrackingBackend};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum RecordedCall {
    InitRun { job_name: String, train_parent_id: Option<String> },
    LogMetric { key: String, value: f64, step: u64 },
    LogTable { name: String, row_count: usize },
    LogArtifact { logical_name: String },
    LogDirectory { path: PathBuf, logical_name: String },
    RegisterModel {
        model_name: String,
        collection: String,
        registry: String,
        checkpoint_tag: Option<u64>,
    },
    UpdateConfig,
    FinishRun,
}

pub struct NullTracker {
    guard: RunGuard,
    calls: Mutex<Vec<RecordedCall>>,
    next_run_id: Mutex<u64>,
    next_version: Mutex<u64>,
}

impl Default for NullTracker {
    fn default() -> Self {
        Self {
            guard: RunGuard::new(),
            calls: Mutex::new(Vec::new()),
            next_run_id: Mutex::new(0),
            next_version: Mutex::new(0),
        }
    }
}

impl NullTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Tracker for NullTracker {
    async fn init_run(
        &self,
        job_name: &str,
        _config: &BTreeMap<String, serde_json::Value>,
        train_parent_id: Option<&str>,
    ) -> Result<RunHandle, TrackerError> {
        let mut next = self.next_run_id.lock();
        let run_id = format!("fake-run-{next}");
        *next += 1;
        let handle = RunHandle {
            tracking_url: format!("fake://{run_id}"),
            run_id,
            backend: TrackingBackend::Wandb,
        };
        self.guard.begin(handle.clone())?;
        self.calls.lock().push(RecordedCall::InitRun {
            job_name: job_name.to_string(),
            train_parent_id: train_parent_id.map(str::to_string),
        });
        Ok(handle)
    }

    async fn log_metric(&self, key: &str, value: f64, step: u64) -> Result<(), TrackerError> {
        if self.guard.current_or_warn("log_metric").is_none() {
            return Ok(());
        }
        if !self.guard.mark_logged(key, step) {
            return Ok(());
        }
        self.calls.lock().push(RecordedCall::LogMetric {
            key: key.to_string(),
            value,
            step,
        });
        Ok(())
    }

    async fn log_table(
        &self,
        name: &str,
        rows: &[BTreeMap<String, serde_json::Value>],
    ) -> Result<(), TrackerError> {
        self.require_run()?;
        self.calls.lock().push(RecordedCall::LogTable {
            name: crate::tracker::ensure_json_suffix(name),
            row_count: rows.len(),
        });
        Ok(())
    }

    async fn log_artifact(&self, artifact: &ArtifactDescriptor) -> Result<(), TrackerError> {
        self.require_run()?;
        self.calls.lock().push(RecordedCall::LogArtifact {
            logical_name: artifact.logical_name.clone(),
        });
        Ok(())
    }

    async fn log_directory(&self, path: &Path, logical_name: &str) -> Result<(), TrackerError> {
        self.require_run()?;
        self.calls.lock().push(RecordedCall::LogDirectory {
            path: path.to_path_buf(),
            logical_name: logical_name.to_string(),
        });
        Ok(())
    }

    async fn register_model(
        &self,
        path: &Path,
        model_name: &str,
        collection: &str,
        registry: &str,
    ) -> Result<String, TrackerError> {
        self.require_run()?;
        let checkpoint_tag = jobcore_core::trailing_number(path);
        self.calls.lock().push(RecordedCall::RegisterModel {
            model_name: model_name.to_string(),
            collection: collection.to_string(),
            registry: registry.to_string(),
            checkpoint_tag,
        });
        let mut next = self.next_version.lock();
        *next += 1;
        let uri = format!("{registry}/{collection}/{next}");
        self.guard.set_last_model_uri(uri.clone());
        Ok(uri)
    }

    async fn update_config(
        &self,
        _config: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), TrackerError> {
        if self.guard.current_or_warn("update_config").is_none() {
            return Ok(());
        }
        self.calls.lock().push(RecordedCall::UpdateConfig);
        Ok(())
    }

    async fn finish_run(&self) -> Result<(), TrackerError> {
        if self.guard.finish().is_some() {
            self.calls.lock().push(RecordedCall::FinishRun);
        }
        Ok(())
    }

    fn current_run(&self) -> Option<RunHandle> {
        self.guard.current()
    }
}

impl NullTracker {
    fn require_run(&self) -> Result<(), TrackerError> {
        if self.guard.is_active() {
            Ok(())
        } else {
            Err(TrackerError::Request("no active run".into()))
        }
    }
}
