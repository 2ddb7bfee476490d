// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal-state webhook dispatch (§4.7 step 9, §6).
//!
//! Fire-and-forget: a short bounded timeout, and failures are logged but
//! never re-raised into the job worker.

use jobcore_core::{Job, JobState};
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

pub fn webhook_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(WEBHOOK_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// POST the job's terminal status to its configured `webhook_url`, if any.
pub async fn notify(client: &reqwest::Client, job: &Job, epoch_secs: u64) {
    let Some(url) = &job.webhook_url else {
        return;
    };

    let mut body = serde_json::json!({
        "timestamp": epoch_secs,
        "job_id": job.id,
        "status": job.state,
    });
    match job.state {
        JobState::Completed => {
            body["output_path"] = job.output_path.clone().into();
        }
        JobState::Failed => {
            body["error"] = job.error.clone().into();
        }
        _ => {}
    }

    if let Err(e) = client.post(url).json(&body).send().await {
        tracing::warn!(error = %e, url, job_id = %job.id, "webhook delivery failed");
    }
}
