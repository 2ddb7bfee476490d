// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job table + FIFO queue, guarded by one mutex (§5, §4.7 C7).
//!
//! Every mutation here is a map/list operation only — no IO happens while
//! the lock is held. `JobRunner` (`runner.rs`) is the only caller.

use jobcore_core::{Job, JobId, JobQueue};
use std::collections::HashMap;

#[derive(Default)]
pub struct JobTable {
    jobs: HashMap<JobId, Job>,
    queue: JobQueue,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    pub fn list(&self) -> Vec<Job> {
        self.jobs.values().cloned().collect()
    }

    pub fn enqueue(&mut self, id: JobId) {
        self.queue.push_back(id);
        self.recompute_positions();
    }

    /// Pop the next queued job id, if any, without mutating its state —
    /// the caller decides whether admission actually succeeds.
    pub fn peek_next_queued(&self) -> Option<JobId> {
        self.queue.ids().next().copied()
    }

    pub fn dequeue(&mut self) -> Option<JobId> {
        let id = self.queue.pop_front();
        self.recompute_positions();
        id
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queued_ids(&self) -> Vec<JobId> {
        self.queue.ids().copied().collect()
    }

    /// Remove `id` from the queue (cancel path). Returns whether it was
    /// actually present.
    pub fn remove_from_queue(&mut self, id: &JobId) -> bool {
        let removed = self.queue.remove(id);
        self.recompute_positions();
        removed
    }

    /// Recompute every queued job's 1-based `queue_position` to match its
    /// current index (§4.7 invariant).
    fn recompute_positions(&mut self) {
        let ids: Vec<JobId> = self.queue.ids().copied().collect();
        for (idx, id) in ids.iter().enumerate() {
            if let Some(job) = self.jobs.get_mut(id) {
                job.queue_position = Some(idx + 1);
            }
        }
    }
}
