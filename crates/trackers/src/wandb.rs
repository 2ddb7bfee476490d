// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Weights & Biases backend for the [`crate::Tracker`] interface.
//!
//! Talks to the `wandb` REST API directly over `reqwest` rather than
//! shelling out to the `wandb` CLI, so the daemon has no Python
//! dependency at runtime.

use crate::error::TrackerError;
use crate::guard::RunGuard;
use crate::run_handle::RunHandle;
use crate::tracker::Tracker;
use async_trait::async_trait;
use jobcore_core::{ArtifactDescriptor, TrackingBackend};
use std::collections::BTreeMap;
use std::path::Path;

pub struct WandbConfig {
    pub api_key: String,
    pub entity: String,
    pub project: String,
    pub base_url: String,
}

pub struct WandbTracker {
    config: WandbConfig,
    client: reqwest::Client,
    guard: RunGuard,
}

impl WandbTracker {
    pub fn new(config: WandbConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            guard: RunGuard::new(),
        }
    }

    fn run_url(&self, run_id: &str) -> String {
        format!(
            "{}/{}/{}/runs/{run_id}",
            self.config.base_url.trim_end_matches('/'),
            self.config.entity,
            self.config.project,
        )
    }

    fn require_run(&self) -> Result<RunHandle, TrackerError> {
        self.guard
            .current()
            .ok_or_else(|| TrackerError::Request("no active run".into()))
    }

    async fn run_exists(&self, run_id: &str) -> Result<bool, TrackerError> {
        let resp = self
            .client
            .get(self.run_url(run_id))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;
        Ok(resp.status().is_success())
    }
}

#[async_trait]
impl Tracker for WandbTracker {
    async fn init_run(
        &self,
        job_name: &str,
        config: &BTreeMap<String, serde_json::Value>,
        train_parent_id: Option<&str>,
    ) -> Result<RunHandle, TrackerError> {
        if self.config.api_key.is_empty() {
            return Err(TrackerError::MissingCredentials("wandb".into()));
        }
        // A parent link is a courtesy, not a precondition: if the parent
        // run id doesn't resolve, log and start the run unlinked (§4.1).
        let resolved_parent = match train_parent_id {
            Some(parent_id) => match self.run_exists(parent_id).await {
                Ok(true) => Some(parent_id),
                Ok(false) => {
                    tracing::warn!(parent_id, "train_parent_id does not resolve to a run, starting unlinked");
                    None
                }
                Err(e) => {
                    tracing::warn!(parent_id, error = %e, "failed to resolve train_parent_id, starting unlinked");
                    None
                }
            },
            None => None,
        };
        let body = serde_json::json!({
            "entity": self.config.entity,
            "project": self.config.project,
            "display_name": job_name,
            "config": config,
            "train_parent_id": resolved_parent,
        });
        let resp = self
            .client
            .post(format!("{}/api/runs", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TrackerError::AuthFailed("wandb".into()));
        }
        let resp = resp.error_for_status()?;
        let payload: serde_json::Value = resp.json().await?;
        let run_id = payload
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or(job_name)
            .to_string();
        let handle = RunHandle {
            tracking_url: self.run_url(&run_id),
            run_id,
            backend: TrackingBackend::Wandb,
        };
        self.guard.begin(handle.clone())?;
        Ok(handle)
    }

    async fn log_metric(&self, key: &str, value: f64, step: u64) -> Result<(), TrackerError> {
        let Some(run) = self.guard.current_or_warn("log_metric") else {
            return Ok(());
        };
        if !self.guard.mark_logged(key, step) {
            return Ok(());
        }
        let body = serde_json::json!({ key: value, "step": step });
        self.client
            .post(format!("{}/history", self.run_url(&run.run_id)))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn log_table(
        &self,
        name: &str,
        rows: &[BTreeMap<String, serde_json::Value>],
    ) -> Result<(), TrackerError> {
        let run = self.require_run()?;
        let name = crate::tracker::ensure_json_suffix(name);
        let body = serde_json::json!({ "table": name, "rows": rows });
        self.client
            .post(format!("{}/tables", self.run_url(&run.run_id)))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn log_artifact(&self, artifact: &ArtifactDescriptor) -> Result<(), TrackerError> {
        let run = self.require_run()?;
        let bytes = tokio::fs::read(&artifact.local_path)
            .await
            .map_err(|e| TrackerError::Request(e.to_string()))?;
        self.client
            .post(format!("{}/artifacts/{}", self.run_url(&run.run_id), artifact.logical_name))
            .bearer_auth(&self.config.api_key)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn log_directory(&self, path: &Path, logical_name: &str) -> Result<(), TrackerError> {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|e| TrackerError::Request(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TrackerError::Request(e.to_string()))?
        {
            if entry
                .file_type()
                .await
                .map_err(|e| TrackerError::Request(e.to_string()))?
                .is_file()
            {
                let descriptor = ArtifactDescriptor {
                    local_path: entry.path(),
                    logical_name: format!(
                        "{logical_name}/{}",
                        entry.file_name().to_string_lossy()
                    ),
                    kind: jobcore_core::ArtifactKind::File,
                };
                self.log_artifact(&descriptor).await?;
            }
        }
        Ok(())
    }

    async fn register_model(
        &self,
        path: &Path,
        model_name: &str,
        collection: &str,
        registry: &str,
    ) -> Result<String, TrackerError> {
        let run = self.require_run()?;
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| model_name.to_string());
        self.log_directory(path, &format!("model/{basename}")).await?;

        let checkpoint_tag = jobcore_core::trailing_number(path);
        let original = self.guard.last_model_uri();
        let body = serde_json::json!({
            "model_name": model_name,
            "collection": collection,
            "path": path.to_string_lossy(),
            "tags": {
                "checkpoint": checkpoint_tag,
                "original": original,
                "evaluate": "pending",
            },
        });
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/models", self.run_url(&run.run_id)))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let version = resp.get("version").and_then(|v| v.as_u64()).unwrap_or(1);
        let uri = format!("{registry}/{collection}/{version}");
        self.guard.set_last_model_uri(uri.clone());
        Ok(uri)
    }

    async fn update_config(
        &self,
        config: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), TrackerError> {
        let Some(run) = self.guard.current_or_warn("update_config") else {
            return Ok(());
        };
        self.client
            .patch(self.run_url(&run.run_id))
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({ "config": config }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn finish_run(&self) -> Result<(), TrackerError> {
        let Some(run) = self.guard.current() else {
            return Ok(());
        };
        self.client
            .post(format!("{}/finish", self.run_url(&run.run_id)))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?
            .error_for_status()?;
        self.guard.finish();
        Ok(())
    }

    fn current_run(&self) -> Option<RunHandle> {
        self.guard.current()
    }
}
