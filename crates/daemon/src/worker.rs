// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job worker (§4.7 steps 1-10): runs under the RunToken, drives one
//! job from `init_run` through child supervision and monitoring to its
//! terminal state, then hands the RunToken back and admits whatever is
//! next in the queue.

use crate::runner::{JobOutcome, JobRunner};
use crate::webhook;
use jobcore_core::{Job, JobConfig, JobId, JobKind, LogCursor};
use jobcore_monitor::{CheckpointWatcher, EvalTriggerContext, LogTailer, MonitorLoop, MonitorLoopConfig};
use jobcore_supervisor::{LogLine, SpawnRequest, StreamKind, SupervisedChild};
use jobcore_trackers::{Tracker, TrackerSettings};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, OwnedSemaphorePermit};

/// The structured, append-only log file the training subprocess writes
/// into (§6): distinct from the raw stdout/stderr chatter [`pump_raw_output`]
/// forwards to the tracing log sink.
const TRAINER_LOG_FILENAME: &str = "trainer_log.jsonl";

/// Forward the child's raw stdout/stderr, tagged by stream origin, to the
/// core's log sink (§4.5 C5). This is plain diagnostic logging; it never
/// feeds the tracker — that happens only through the structured
/// `trainer_log.jsonl` file polled by the log tailer (§4.2 C2).
async fn pump_raw_output(job_id: JobId, mut log_rx: mpsc::UnboundedReceiver<LogLine>) {
    while let Some(entry) = log_rx.recv().await {
        match entry.stream {
            StreamKind::Stdout => tracing::info!(job_id = %job_id, stream = "stdout", line = %entry.line, "child output"),
            StreamKind::Stderr => tracing::info!(job_id = %job_id, stream = "stderr", line = %entry.line, "child output"),
        }
    }
}

/// Spawn the job worker as a detached task. The permit is dropped (and the
/// next queued job admitted) only once the job reaches a terminal state.
pub fn spawn(runner: JobRunner, job_id: JobId, permit: OwnedSemaphorePermit) {
    tokio::spawn(async move {
        run_job(runner, job_id, permit).await;
    });
}

async fn run_job(runner: JobRunner, job_id: JobId, permit: OwnedSemaphorePermit) {
    let Some(job) = runner.get(job_id) else {
        tracing::error!(job_id = %job_id, "job worker started for unknown job");
        drop(permit);
        runner.admit_next();
        return;
    };

    let tracker_settings = resolve_tracker_settings(runner.tracker_settings(), &job.config);
    let tracker = match jobcore_trackers::build_tracker(&tracker_settings) {
        Ok(tracker) => tracker,
        Err(e) => {
            fail_job(&runner, job_id, format!("tracker unavailable: {e}"), None).await;
            drop(permit);
            runner.admit_next();
            return;
        }
    };

    // Step 1: open the tracker run, capture tracking_url.
    let job_name = job.config.save_name.clone().unwrap_or_else(|| job.config.model_name.clone());
    let config_map = config_to_map(&job.config);
    let train_parent_id = job.config.train_id.clone();
    match tracker.init_run(&job_name, &config_map, train_parent_id.as_deref()).await {
        Ok(handle) => runner.set_tracking_url(job_id, handle.tracking_url),
        Err(e) => {
            fail_job(&runner, job_id, format!("tracker unavailable: {e}"), None).await;
            drop(permit);
            runner.admit_next();
            return;
        }
    }
    let tracking_url = runner.get(job_id).and_then(|j| j.tracking_url);

    // Step 2: spawn the child.
    let output_dir = runner.config().output_root.join(job_id.to_string());
    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        let _ = tracker.finish_run().await;
        fail_job(&runner, job_id, format!("failed to create output directory: {e}"), tracking_url.clone()).await;
        drop(permit);
        runner.admit_next();
        return;
    }

    let request = build_spawn_request(&runner, &job, &output_dir);
    let (log_tx, log_rx) = mpsc::unbounded_channel::<LogLine>();
    let mut child = match SupervisedChild::spawn(request, log_tx) {
        Ok(child) => child,
        Err(e) => {
            let _ = tracker.finish_run().await;
            fail_job(&runner, job_id, format!("child process failed: {e}"), tracking_url.clone()).await;
            drop(permit);
            runner.admit_next();
            return;
        }
    };

    // Step 3: wire C2+C3 into C6 on a dedicated task. The child's raw
    // stdout/stderr is pumped to the log sink separately (§4.5 C5); it
    // never feeds the tracker.
    tokio::spawn(pump_raw_output(job_id, log_rx));

    let (training_completed_tx, training_completed_rx) = watch::channel(false);
    let tailer = LogTailer::new(output_dir.join(TRAINER_LOG_FILENAME), LogCursor::new(0));
    let checkpoints = CheckpointWatcher::new(output_dir.clone());
    let monitor_config = build_monitor_config(&runner, &job, job_id);
    let monitor_loop = MonitorLoop::new(monitor_config, tailer, checkpoints, tracker.clone());
    let monitor_handle = tokio::spawn(monitor_loop.run(training_completed_rx));

    // Step 4: wait on the child, then signal completion to the monitor.
    // A shutdown request races the child's own exit: if it wins, the
    // child's process group is torn down via `terminate(grace)` (§4.5,
    // §5, §9) rather than left to `kill_on_drop`, which only reaches the
    // direct child pid and orphans anything it forked.
    let mut shutdown_rx = runner.shutdown_rx();
    let wait_result = tokio::select! {
        result = child.wait() => result,
        _ = shutdown_rx.changed() => {
            tracing::info!(job_id = %job_id, "shutdown requested, terminating child process group");
            if let Err(e) = child.terminate(runner.config().terminate_grace).await {
                tracing::warn!(job_id = %job_id, error = %e, "failed to terminate child process group");
            }
            child.wait().await
        }
    };
    let _ = training_completed_tx.send(true);

    // Step 5: bounded-join the monitor loop so a hung drain can't block
    // the queue indefinitely.
    match tokio::time::timeout(runner.config().max_wait, monitor_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::warn!(job_id = %job_id, error = %e, "monitor loop ended with an error"),
        Ok(Err(e)) => tracing::warn!(job_id = %job_id, error = %e, "monitor loop task panicked"),
        Err(_) => tracing::warn!(job_id = %job_id, "monitor loop did not finish within max_wait, abandoning"),
    }

    // Step 6: close the tracker run (idempotent).
    if let Err(e) = tracker.finish_run().await {
        tracing::warn!(job_id = %job_id, error = %e, "finish_run failed");
    }

    // Step 7: determine the terminal state from the child's exit status.
    let outcome = match wait_result {
        Ok(status) if status.success() => JobOutcome::Completed {
            output_path: output_dir.to_string_lossy().to_string(),
            tracking_url: tracking_url.clone(),
        },
        Ok(status) => {
            let code = status.code().unwrap_or(-1);
            JobOutcome::Failed {
                error: format!("child exited with exit code {code}"),
                tracking_url: tracking_url.clone(),
            }
        }
        Err(e) => JobOutcome::Failed {
            error: format!("child process failed: {e}"),
            tracking_url: tracking_url.clone(),
        },
    };
    let finished_job = runner.finish_job(job_id, outcome);

    // Step 8: release the RunToken.
    drop(permit);

    // Step 9: fire-and-forget webhook.
    if let Some(job) = finished_job {
        let client = runner.webhook_client();
        let epoch = runner.clock().epoch_secs();
        tokio::spawn(async move {
            webhook::notify(&client, &job, epoch).await;
        });
    }

    // Step 10: admit the next queued job, if any.
    runner.admit_next();
}

async fn fail_job(runner: &JobRunner, job_id: JobId, error: String, tracking_url: Option<String>) {
    tracing::warn!(job_id = %job_id, error, "job failed before child process started");
    let finished_job = runner.finish_job(job_id, JobOutcome::Failed { error, tracking_url });
    if let Some(job) = finished_job {
        let client = runner.webhook_client();
        let epoch = runner.clock().epoch_secs();
        tokio::spawn(async move {
            webhook::notify(&client, &job, epoch).await;
        });
    }
}

/// `tracking_backend` may be overridden per submission (§6); everything
/// else about credential resolution stays with the daemon-wide settings.
fn resolve_tracker_settings(base: &TrackerSettings, config: &JobConfig) -> TrackerSettings {
    let mut settings = base.clone();
    if let Some(backend) = config.tracking_backend {
        settings.backend = backend;
    }
    settings
}

fn config_to_map(config: &JobConfig) -> BTreeMap<String, serde_json::Value> {
    match serde_json::to_value(config) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    }
}

fn build_spawn_request(runner: &JobRunner, job: &Job, output_dir: &std::path::Path) -> SpawnRequest {
    let cfg = runner.config();
    let entrypoint = match job.kind() {
        JobKind::Training => &cfg.train_entrypoint,
        JobKind::Evaluation => &cfg.eval_entrypoint,
    };

    let mut env = HashMap::new();
    env.insert("JOBCORE_JOB_ID".to_string(), job.id.to_string());
    env.insert("JOBCORE_OUTPUT_DIR".to_string(), output_dir.to_string_lossy().to_string());
    env.insert(
        "JOBCORE_JOB_CONFIG".to_string(),
        serde_json::to_string(&job.config).unwrap_or_default(),
    );

    SpawnRequest {
        program: cfg.python_bin.clone(),
        args: vec![entrypoint.clone()],
        working_dir: Some(output_dir.to_path_buf()),
        env,
    }
}

fn build_monitor_config(runner: &JobRunner, job: &Job, job_id: JobId) -> MonitorLoopConfig {
    let cfg = runner.config();
    let backend = job.config.tracking_backend.unwrap_or(runner.tracker_settings().backend);

    // Only LoRA-adapter training jobs are registered as named model
    // versions; plain checkpoints are logged as directory artifacts.
    let register = job.config.lora_name.is_some();
    let collection = job.config.lora_name.clone().unwrap_or_else(|| job.config.model_name.clone());
    let registry = "jobcore".to_string();
    let trigger_eval = register && cfg.eval_server_url.is_some() && job.kind() == JobKind::Training;

    MonitorLoopConfig {
        poll_interval: cfg.monitor_interval,
        stall_timeout: cfg.stall_timeout,
        upload_timeout: cfg.upload_timeout,
        model_name: job.config.model_name.clone(),
        register,
        collection,
        registry,
        trigger_eval,
        eval_server_url: cfg.eval_server_url.clone(),
        eval_context: EvalTriggerContext {
            base_model_name: job.config.model_name.clone(),
            data_version: job.config.dataset_version.clone(),
            tracking_backend: backend,
            train_id: job_id.to_string(),
        },
    }
}
