// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP Surface (§4.8 C8).
//!
//! Handlers only ever touch the `JobRunner`'s mutex for a map/list
//! mutation and return immediately; everything else (spawning the job
//! worker) happens after the lock is released, inside `JobRunnerState`.

use crate::error::ApiError;
use crate::runner::{Admission, JobRunner, Strategy};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use jobcore_core::{Job, JobConfig, JobId, JobState};
use serde::{Deserialize, Serialize};

pub fn router(runner: JobRunner) -> Router {
    Router::new()
        .route("/jobs", post(submit_job).get(list_jobs))
        .route("/jobs/{id}", get(get_job).delete(cancel_job))
        .route("/queue", get(get_queue))
        .with_state(runner)
}

#[derive(Deserialize)]
struct SubmitQuery {
    strategy: Option<Strategy>,
}

#[derive(Serialize)]
struct SubmitResponse {
    job_id: JobId,
    status: Admission,
    message: String,
}

async fn submit_job(
    State(runner): State<JobRunner>,
    Query(query): Query<SubmitQuery>,
    Json(request): Json<JobConfig>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let strategy = query.strategy.unwrap_or_default();
    let (job_id, status) = runner.submit(request, strategy)?;
    let message = match status {
        Admission::Started => "job started".to_string(),
        Admission::Queued => "job queued".to_string(),
    };
    Ok((StatusCode::CREATED, Json(SubmitResponse { job_id, status, message })))
}

async fn get_job(State(runner): State<JobRunner>, Path(id): Path<String>) -> Result<Json<JobSnapshot>, ApiError> {
    let job = runner
        .get(JobId::from_string(id))
        .ok_or(ApiError(jobcore_core::ErrorKind::NotFound))?;
    Ok(Json(JobSnapshot::from(job)))
}

async fn list_jobs(State(runner): State<JobRunner>) -> Json<Vec<JobSnapshot>> {
    Json(runner.list().into_iter().map(JobSnapshot::from).collect())
}

async fn get_queue(State(runner): State<JobRunner>) -> Json<crate::runner::QueueState> {
    Json(runner.queue_state())
}

async fn cancel_job(State(runner): State<JobRunner>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    runner.cancel(JobId::from_string(id))?;
    Ok(StatusCode::OK)
}

/// Wire shape for `GET /jobs`/`GET /jobs/{id}` (§6).
#[derive(Debug, Serialize)]
struct JobSnapshot {
    job_id: JobId,
    status: JobState,
    config: JobConfig,
    start_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_position: Option<usize>,
}

impl From<Job> for JobSnapshot {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.state,
            config: job.config,
            start_time: job.enqueued_at,
            end_time: job.ended_at,
            tracking_url: job.tracking_url,
            error: job.error,
            output_path: job.output_path,
            queue_position: job.queue_position,
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
