// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor Loop (§4.6 C6).
//!
//! Ties the log tailer, checkpoint watcher and artifact uploader to one
//! polling cadence, and is the sole place that decides a training job is
//! stalled or that post-completion draining has timed out. Both of those
//! are reported back to the job worker as an error; everything else
//! (malformed log lines, a single failed upload) is swallowed and logged.

use crate::checkpoint_watcher::CheckpointWatcher;
use crate::error::MonitorError;
use crate::tailer::LogTailer;
use crate::uploader::{self, EvalTriggerContext, UploadOptions, UploadRequest};
use jobcore_trackers::Tracker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Before the first log activity arrives, a child can legitimately sit
/// quiet for much longer (dataset loading, model download) than the
/// ordinary stall timeout allows, so the threshold is multiplied by `K`
/// until the first line is seen.
pub const PRE_ACTIVITY_MULTIPLIER: u32 = 8;

pub struct MonitorLoopConfig {
    pub poll_interval: Duration,
    pub stall_timeout: Duration,
    pub upload_timeout: Duration,
    pub model_name: String,
    pub register: bool,
    pub collection: String,
    pub registry: String,
    pub trigger_eval: bool,
    pub eval_server_url: Option<String>,
    pub eval_context: EvalTriggerContext,
}

pub struct MonitorLoop {
    config: MonitorLoopConfig,
    tailer: LogTailer,
    checkpoints: CheckpointWatcher,
    tracker: Arc<dyn Tracker>,
    eval_client: reqwest::Client,
}

impl MonitorLoop {
    pub fn new(
        config: MonitorLoopConfig,
        tailer: LogTailer,
        checkpoints: CheckpointWatcher,
        tracker: Arc<dyn Tracker>,
    ) -> Self {
        Self {
            config,
            tailer,
            checkpoints,
            tracker,
            eval_client: uploader::eval_client(),
        }
    }

    /// Drive the loop at a fixed cadence (§4.6) until `training_completed`
    /// fires and draining finishes, or a stall/upload-timeout error cuts
    /// it short. Every tick drains C2 and C3 unconditionally, so the tick
    /// that decides to return doubles as the "one final drain on exit"
    /// the spec calls for — there is nothing left undrained afterwards.
    pub async fn run(mut self, mut training_completed: watch::Receiver<bool>) -> Result<(), MonitorError> {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let ticks_per_stall = ticks_for(self.config.stall_timeout, self.config.poll_interval);
        let ticks_per_upload_timeout = ticks_for(self.config.upload_timeout, self.config.poll_interval);

        let mut had_activity = false;
        let mut not_update_count: u32 = 0;

        loop {
            interval.tick().await;

            let log_activity = self.drain_log().await;
            let checkpoint_activity = self.drain_checkpoints().await;
            let activity = log_activity || checkpoint_activity;

            if activity {
                not_update_count = 0;
                had_activity = true;
            } else {
                not_update_count += 1;
            }

            let training_completed = *training_completed.borrow();
            let threshold = if training_completed {
                ticks_per_upload_timeout
            } else if had_activity {
                ticks_per_stall
            } else {
                ticks_per_stall.saturating_mul(PRE_ACTIVITY_MULTIPLIER)
            };

            if not_update_count >= threshold {
                return if training_completed {
                    Ok(())
                } else {
                    Err(MonitorError::Stalled(self.config.stall_timeout.as_secs()))
                };
            }
        }
    }

    /// Drain C2: poll the trainer log for records since the cursor and
    /// forward their numeric fields to the tracker. Returns whether
    /// anything was found.
    async fn drain_log(&mut self) -> bool {
        let records = match self.tailer.poll() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.tailer.path().display(), "log tailer poll failed");
                return false;
            }
        };
        for record in &records {
            if let Err(e) = self.tracker.log_metrics(&record.values, record.step.unwrap_or(0)).await {
                tracing::warn!(error = %e, "failed to forward metrics to tracker");
            }
        }
        !records.is_empty()
    }

    /// Drain C3: scan for newly-appeared checkpoints, hand each to the
    /// uploader, and emit `new_checkpoint=1` for every one found.
    async fn drain_checkpoints(&mut self) -> bool {
        let found = match self.checkpoints.scan() {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "checkpoint scan failed");
                return false;
            }
        };
        if found.is_empty() {
            return false;
        }
        for (step, path) in found {
            self.upload_checkpoint(step, path);
            if let Err(e) = self.tracker.log_metric("new_checkpoint", 1.0, step).await {
                tracing::warn!(error = %e, "failed to emit new_checkpoint metric");
            }
        }
        true
    }

    fn upload_checkpoint(&self, step: u64, path: std::path::PathBuf) {
        uploader::upload(
            self.tracker.clone(),
            self.eval_client.clone(),
            UploadRequest {
                checkpoint_dir: path,
                model_name: self.config.model_name.clone(),
                step,
                options: UploadOptions {
                    register: self.config.register,
                    collection: self.config.collection.clone(),
                    registry: self.config.registry.clone(),
                    trigger_eval: self.config.trigger_eval,
                    eval_server_url: self.config.eval_server_url.clone(),
                    eval_context: self.config.eval_context.clone(),
                },
            },
        );
    }
}

fn ticks_for(duration: Duration, poll_interval: Duration) -> u32 {
    let ticks = duration.as_secs_f64() / poll_interval.as_secs_f64().max(f64::EPSILON);
    ticks.ceil().max(1.0) as u32
}

#[cfg(test)]
#[path = "monitor_loop_tests.rs"]
mod monitor_loop_tests;
