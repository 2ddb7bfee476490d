// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MLflow backend for the [`crate::Tracker`] interface.
//!
//! Talks to the MLflow REST tracking API (`/api/2.0/mlflow/...`). Unlike
//! wandb, MLflow has no native "table" concept, so `log_table` degrades
//! to uploading the table as a JSON artifact.

use crate::error::TrackerError;
use crate::guard::RunGuard;
use crate::run_handle::RunHandle;
use crate::tracker::Tracker;
use async_trait::async_trait;
use jobcore_core::{ArtifactDescriptor, ArtifactKind, TrackingBackend};
use std::collections::BTreeMap;
use std::path::Path;

pub struct MlFlowConfig {
    pub tracking_uri: String,
    pub experiment_name: String,
}

pub struct MlFlowTracker {
    config: MlFlowConfig,
    client: reqwest::Client,
    guard: RunGuard,
}

impl MlFlowTracker {
    pub fn new(config: MlFlowConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            guard: RunGuard::new(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!(
            "{}/api/2.0/mlflow/{path}",
            self.config.tracking_uri.trim_end_matches('/')
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
            .get(self.api("runs/get"))
            .query(&[("run_id", run_id)])
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    async fn get_or_create_experiment_id(&self) -> Result<String, TrackerError> {
        let resp = self
            .client
            .get(self.api("experiments/get-by-name"))
            .query(&[("experiment_name", &self.config.experiment_name)])
            .send()
            .await?;
        if resp.status().is_success() {
            let payload: serde_json::Value = resp.json().await?;
            if let Some(id) = payload
                .get("experiment")
                .and_then(|e| e.get("experiment_id"))
                .and_then(|v| v.as_str())
            {
                return Ok(id.to_string());
            }
        }
        let created: serde_json::Value = self
            .client
            .post(self.api("experiments/create"))
            .json(&serde_json::json!({ "name": self.config.experiment_name }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        created
            .get("experiment_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| TrackerError::Request("mlflow did not return experiment_id".into()))
    }
}

#[async_trait]
impl Tracker for MlFlowTracker {
    async fn init_run(
        &self,
        job_name: &str,
        config: &BTreeMap<String, serde_json::Value>,
        train_parent_id: Option<&str>,
    ) -> Result<RunHandle, TrackerError> {
        let experiment_id = self.get_or_create_experiment_id().await?;
        let mut params: Vec<serde_json::Value> = config
            .iter()
            .map(|(k, v)| serde_json::json!({ "key": k, "value": v.to_string() }))
            .collect();

        // A parent link is a courtesy, not a precondition (§4.1): if the
        // run doesn't resolve, log and proceed unlinked.
        if let Some(parent_id) = train_parent_id {
            match self.run_exists(parent_id).await {
                Ok(true) => params.push(serde_json::json!({
                    "key": "mlflow.parentRunId",
                    "value": parent_id,
                })),
                Ok(false) => {
                    tracing::warn!(parent_id, "train_parent_id does not resolve to a run, starting unlinked");
                }
                Err(e) => {
                    tracing::warn!(parent_id, error = %e, "failed to resolve train_parent_id, starting unlinked");
                }
            }
        }

        let created: serde_json::Value = self
            .client
            .post(self.api("runs/create"))
            .json(&serde_json::json!({
                "experiment_id": experiment_id,
                "run_name": job_name,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let run_id = created
            .get("run")
            .and_then(|r| r.get("info"))
            .and_then(|i| i.get("run_id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| TrackerError::Request("mlflow did not return run_id".into()))?
            .to_string();

        if !params.is_empty() {
            self.client
                .post(self.api("runs/log-batch"))
                .json(&serde_json::json!({ "run_id": run_id, "params": params }))
                .send()
                .await?
                .error_for_status()?;
        }

        let handle = RunHandle {
            tracking_url: format!(
                "{}/#/experiments/{experiment_id}/runs/{run_id}",
                self.config.tracking_uri.trim_end_matches('/')
            ),
            run_id,
            backend: TrackingBackend::MlFlow,
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
        self.client
            .post(self.api("runs/log-metric"))
            .json(&serde_json::json!({
                "run_id": run.run_id,
                "key": key,
                "value": value,
                "step": step,
                "timestamp": 0,
            }))
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
        let path = crate::tracker::ensure_json_suffix(name);
        self.client
            .post(self.api("runs/log-table"))
            .json(&serde_json::json!({
                "run_id": run.run_id,
                "path": path,
                "data": rows,
            }))
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
            .post(self.api("runs/log-artifact"))
            .query(&[("run_id", run.run_id.as_str()), ("path", &artifact.logical_name)])
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
                    kind: ArtifactKind::File,
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
        let logical_name = format!("model/{basename}");
        self.log_directory(path, &logical_name).await?;

        let checkpoint_tag = jobcore_core::trailing_number(path);
        let original = self.guard.last_model_uri();
        let mut tags = vec![serde_json::json!({"key": "evaluate", "value": "pending"})];
        if let Some(tag) = checkpoint_tag {
            tags.push(serde_json::json!({"key": "checkpoint", "value": tag.to_string()}));
        }
        if let Some(original) = &original {
            tags.push(serde_json::json!({"key": "original", "value": original}));
        }

        let registered_name = format!("{registry}.{collection}.{model_name}");
        let created: serde_json::Value = self
            .client
            .post(self.api("model-versions/create"))
            .json(&serde_json::json!({
                "name": registered_name,
                "source": format!("runs:/{}/{logical_name}", run.run_id),
                "run_id": run.run_id,
                "tags": tags,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let version = created
            .get("model_version")
            .and_then(|v| v.get("version"))
            .and_then(|v| v.as_str())
            .unwrap_or("1")
            .to_string();
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
        let params: Vec<serde_json::Value> = config
            .iter()
            .map(|(k, v)| serde_json::json!({ "key": k, "value": v.to_string() }))
            .collect();
        self.client
            .post(self.api("runs/log-batch"))
            .json(&serde_json::json!({ "run_id": run.run_id, "params": params }))
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
            .post(self.api("runs/update"))
            .json(&serde_json::json!({ "run_id": run.run_id, "status": "FINISHED" }))
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
