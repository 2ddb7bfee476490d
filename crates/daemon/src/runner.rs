// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Queue & Runner (§4.7 C7).
//!
//! `JobRunner` is one `Arc<JobRunnerState>` holding the job table + FIFO
//! queue behind a single `parking_lot::Mutex`, and the capacity-1
//! `RunToken` gating which job may hold the subprocess slot. HTTP
//! handlers only ever touch the mutex for a map/list mutation; all other
//! work happens after it is released, per §5.

use crate::config::Config;
use crate::job_table::JobTable;
use crate::run_token::RunToken;
use crate::worker;
use jobcore_core::{Clock, ErrorKind, Job, JobConfig, JobId, JobState, SystemClock};
use jobcore_trackers::TrackerSettings;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Admission strategy requested via the `strategy` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Reject,
    Queue,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Queue
    }
}

/// What happened to a freshly submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    Started,
    Queued,
}

#[derive(Debug, Serialize)]
pub struct QueueState {
    pub holding: bool,
    pub queue_length: usize,
    pub queued_ids: Vec<JobId>,
}

pub struct JobRunnerState {
    table: Mutex<JobTable>,
    run_token: RunToken,
    config: Arc<Config>,
    tracker_settings: TrackerSettings,
    webhook_client: reqwest::Client,
    eval_client: reqwest::Client,
    clock: SystemClock,
    shutdown_tx: watch::Sender<bool>,
}

pub type JobRunner = Arc<JobRunnerState>;

impl JobRunnerState {
    pub fn new(config: Arc<Config>, tracker_settings: TrackerSettings) -> JobRunner {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            table: Mutex::new(JobTable::new()),
            run_token: RunToken::new(1),
            config,
            tracker_settings,
            webhook_client: crate::webhook::webhook_client(),
            eval_client: jobcore_monitor::eval_client(),
            clock: SystemClock,
            shutdown_tx,
        })
    }

    /// Subscribe to the shutdown signal; the job worker selects on this
    /// alongside the child's own exit so an interrupt terminates the
    /// running child's process group instead of leaking it to
    /// `kill_on_drop`, which only reaches the direct child pid (§5, §9).
    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Called once from `jobcored`'s interrupt handler.
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tracker_settings(&self) -> &TrackerSettings {
        &self.tracker_settings
    }

    pub fn eval_client(&self) -> reqwest::Client {
        self.eval_client.clone()
    }

    pub fn webhook_client(&self) -> reqwest::Client {
        self.webhook_client.clone()
    }

    pub fn clock(&self) -> SystemClock {
        self.clock.clone()
    }

    /// `submit` (§4.7): admit immediately if the RunToken is free,
    /// otherwise either reject or enqueue depending on `strategy`.
    pub fn submit(self: &Arc<Self>, request: JobConfig, strategy: Strategy) -> Result<(JobId, Admission), ErrorKind> {
        let now = self.clock.epoch_secs();
        let job = Job::new(request, now);
        let job_id = job.id;

        match strategy {
            Strategy::Reject => {
                let Some(permit) = self.run_token.try_acquire() else {
                    return Err(ErrorKind::Conflict);
                };
                let mut table = self.table.lock();
                table.insert(job);
                self.mark_running(&mut table, job_id);
                drop(table);
                worker::spawn(self.clone(), job_id, permit);
                Ok((job_id, Admission::Started))
            }
            Strategy::Queue => {
                let mut table = self.table.lock();
                match self.run_token.try_acquire() {
                    Some(permit) => {
                        table.insert(job);
                        self.mark_running(&mut table, job_id);
                        drop(table);
                        worker::spawn(self.clone(), job_id, permit);
                        Ok((job_id, Admission::Started))
                    }
                    None => {
                        table.insert(job);
                        table.enqueue(job_id);
                        Ok((job_id, Admission::Queued))
                    }
                }
            }
        }
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.table.lock().get(&id).cloned()
    }

    pub fn list(&self) -> Vec<Job> {
        self.table.lock().list()
    }

    pub fn queue_state(&self) -> QueueState {
        let table = self.table.lock();
        let queued_ids = table.queued_ids();
        QueueState {
            holding: table.list().iter().any(|j| j.state == JobState::Running),
            queue_length: queued_ids.len(),
            queued_ids,
        }
    }

    /// `cancel` (§4.7): permitted only from `queued`. Running jobs return
    /// the literal phrase required by §9 open-question resolution #1.
    pub fn cancel(&self, id: JobId) -> Result<(), ErrorKind> {
        let mut table = self.table.lock();
        let Some(state) = table.get(&id).map(|job| job.state) else {
            return Err(ErrorKind::NotFound);
        };
        match state {
            JobState::Queued => {
                table.remove_from_queue(&id);
                let now = self.clock.epoch_secs();
                if let Some(job) = table.get_mut(&id) {
                    job.state = JobState::Cancelled;
                    job.ended_at = Some(now);
                }
                Ok(())
            }
            JobState::Running => Err(ErrorKind::InvalidState(
                "cancellation of a running job is not implemented".to_string(),
            )),
            JobState::Completed | JobState::Failed | JobState::Cancelled => {
                Err(ErrorKind::InvalidState("job is not queued".to_string()))
            }
        }
    }

    /// Step 10 of the job worker (§4.7): identical admission policy as
    /// `submit`'s queue path, invoked after a job releases the RunToken.
    pub fn admit_next(self: &Arc<Self>) {
        let mut table = self.table.lock();
        let Some(next_id) = table.peek_next_queued() else {
            return;
        };
        let Some(permit) = self.run_token.try_acquire() else {
            return;
        };
        let dequeued = table.dequeue();
        debug_assert_eq!(dequeued, Some(next_id));
        self.mark_running(&mut table, next_id);
        drop(table);
        worker::spawn(self.clone(), next_id, permit);
    }

    fn mark_running(&self, table: &mut JobTable, id: JobId) {
        let now = self.clock.epoch_secs();
        if let Some(job) = table.get_mut(&id) {
            job.state = JobState::Running;
            job.started_at = Some(now);
            job.queue_position = None;
        }
    }

    /// Mutate `id`'s final state and timestamps. Called by the job worker
    /// once the child has exited and the monitor loop has been joined.
    pub fn finish_job(&self, id: JobId, outcome: JobOutcome) -> Option<Job> {
        let mut table = self.table.lock();
        let now = self.clock.epoch_secs();
        if let Some(job) = table.get_mut(&id) {
            job.ended_at = Some(now);
            match outcome {
                JobOutcome::Completed { output_path, tracking_url } => {
                    job.state = JobState::Completed;
                    job.output_path = Some(output_path);
                    if tracking_url.is_some() {
                        job.tracking_url = tracking_url;
                    }
                }
                JobOutcome::Failed { error, tracking_url } => {
                    job.state = JobState::Failed;
                    job.error = Some(error);
                    if tracking_url.is_some() {
                        job.tracking_url = tracking_url;
                    }
                }
            }
            table.get(&id).cloned()
        } else {
            None
        }
    }

    pub fn set_tracking_url(&self, id: JobId, tracking_url: String) {
        let mut table = self.table.lock();
        if let Some(job) = table.get_mut(&id) {
            job.tracking_url = Some(tracking_url);
        }
    }
}

pub enum JobOutcome {
    Completed { output_path: String, tracking_url: Option<String> },
    Failed { error: String, tracking_url: Option<String> },
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod runner_tests;
