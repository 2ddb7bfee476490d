// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders and fixtures shared across crates (feature `test-support`).

use crate::job::{Job, JobConfig};

/// A minimally-valid training [`JobConfig`] for tests.
pub fn sample_job_config(model_name: &str) -> JobConfig {
    JobConfig { model_name: model_name.to_string(), ..Default::default() }
}

/// A fresh queued [`Job`] for tests.
pub fn sample_job(model_name: &str, enqueued_at: u64) -> Job {
    Job::new(sample_job_config(model_name), enqueued_at)
}
