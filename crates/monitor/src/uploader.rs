// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact Uploader (§4.4 C4).
//!
//! `upload` computes the intended logical name synchronously and hands
//! the rest of the work to a detached task, so a slow checkpoint upload
//! never blocks the monitor loop's stall/timeout bookkeeping. The
//! uploader prunes optimizer state before shipping the checkpoint, since
//! it is large and never needed by a downstream consumer of the model.

use jobcore_core::{ArtifactDescriptor, ArtifactKind, TrackingBackend};
use jobcore_trackers::Tracker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const PRUNED_PREFIXES: &[&str] = &["optimizer.pt", "optimizer_scratch"];

/// Remove optimizer checkpoint state from `checkpoint_dir` before upload.
/// Best-effort: a missing file is not an error, but other IO failures are
/// logged and otherwise ignored, since a failed prune should not block
/// shipping the rest of the checkpoint.
pub fn prune_optimizer_state(checkpoint_dir: &Path) {
    let entries = match std::fs::read_dir(checkpoint_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %checkpoint_dir.display(), error = %e, "could not scan checkpoint dir for pruning");
            return;
        }
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if PRUNED_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
            if let Err(e) = std::fs::remove_file(entry.path()) {
                tracing::warn!(path = %entry.path().display(), error = %e, "failed to prune optimizer state");
            }
        }
    }
}

/// Evaluation-trigger fields that travel with a job for the lifetime of
/// its monitor loop (§6 evaluation trigger POST body).
#[derive(Clone, Default)]
pub struct EvalTriggerContext {
    pub base_model_name: String,
    pub data_version: Option<String>,
    pub tracking_backend: TrackingBackend,
    pub train_id: String,
}

pub struct UploadOptions {
    pub register: bool,
    pub collection: String,
    pub registry: String,
    pub trigger_eval: bool,
    pub eval_server_url: Option<String>,
    pub eval_context: EvalTriggerContext,
}

pub struct UploadRequest {
    pub checkpoint_dir: PathBuf,
    pub model_name: String,
    pub step: u64,
    pub options: UploadOptions,
}

/// Begin an upload. Returns the logical name synchronously; the caller is
/// never blocked on IO (§4.4). The returned `JoinHandle` is for tests —
/// production callers let it run detached.
pub fn upload(
    tracker: Arc<dyn Tracker>,
    eval_client: reqwest::Client,
    request: UploadRequest,
) -> (String, JoinHandle<()>) {
    let logical_name = format!("checkpoints/checkpoint-{}", request.step);
    let detached_name = logical_name.clone();
    let handle = tokio::spawn(async move {
        run_upload(tracker, eval_client, request, detached_name).await;
    });
    (logical_name, handle)
}

async fn run_upload(
    tracker: Arc<dyn Tracker>,
    eval_client: reqwest::Client,
    request: UploadRequest,
    logical_name: String,
) {
    let tag = request.checkpoint_dir.file_name().map(|n| n.to_string_lossy().to_string());
    prune_optimizer_state(&request.checkpoint_dir);

    let model_uri = if request.options.register {
        match tracker
            .register_model(
                &request.checkpoint_dir,
                &request.model_name,
                &request.options.collection,
                &request.options.registry,
            )
            .await
        {
            Ok(uri) => Some(uri),
            Err(e) => {
                tracing::warn!(error = %e, checkpoint = ?tag, "model registration failed");
                return;
            }
        }
    } else {
        let descriptor = ArtifactDescriptor::new(
            request.checkpoint_dir.clone(),
            logical_name,
            ArtifactKind::Model,
        );
        if let Err(e) = tracker.log_directory(&descriptor.local_path, &descriptor.logical_name).await {
            tracing::warn!(error = %e, checkpoint = ?tag, "checkpoint upload failed");
            return;
        }
        None
    };

    if request.options.trigger_eval {
        if let (Some(url), Some(model_uri)) = (&request.options.eval_server_url, &model_uri) {
            trigger_eval(&eval_client, url, model_uri, &request.options.eval_context, tag.as_deref()).await;
        } else if request.options.eval_server_url.is_some() {
            tracing::warn!(checkpoint = ?tag, "trigger_eval requested without model registration, skipping");
        }
    }

    if let Err(e) = tracker.log_metric("checkpoint_upload_complete", 1.0, request.step).await {
        tracing::warn!(error = %e, checkpoint = ?tag, "failed to emit checkpoint_upload_complete metric");
    }
}

async fn trigger_eval(
    client: &reqwest::Client,
    url: &str,
    lora_model_name: &str,
    ctx: &EvalTriggerContext,
    tag: Option<&str>,
) {
    let body = serde_json::json!({
        "base_model_name": ctx.base_model_name,
        "lora_model_name": lora_model_name,
        "data_version": ctx.data_version,
        "tracking_backend": ctx.tracking_backend,
        "train_id": ctx.train_id,
    });
    match client.post(url).json(&body).send().await {
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::info!(url, %status, body, checkpoint = ?tag, "evaluation trigger response");
        }
        Err(e) => {
            tracing::warn!(error = %e, url, checkpoint = ?tag, "eval trigger request failed");
        }
    }
}

/// Shared client for eval-trigger POSTs: short connect timeout so a dead
/// eval server never stalls the uploader.
pub fn eval_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "uploader_tests.rs"]
mod uploader_tests;
