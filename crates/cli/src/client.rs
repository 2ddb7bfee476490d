// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP client for the Job Orchestration Core's HTTP surface (§4.8 C8).
//!
//! Every method here is a direct translation of one endpoint; there is no
//! retrying or caching — `jobcorectl` is a one-shot client, not a daemon.

use crate::error::ClientError;
use jobcore_core::JobConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DaemonClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Reject,
    Queue,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: String,
    pub config: JobConfig,
    pub start_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QueueState {
    pub holding: bool,
    pub queue_length: usize,
    pub queued_ids: Vec<String>,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn submit(
        &self,
        request: &JobConfig,
        strategy: Strategy,
    ) -> Result<SubmitResponse, ClientError> {
        let strategy_value = match strategy {
            Strategy::Reject => "reject",
            Strategy::Queue => "queue",
        };
        let resp = self
            .http
            .post(self.url("/jobs"))
            .query(&[("strategy", strategy_value)])
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Request("POST /jobs".into(), e))?;
        Self::handle(resp).await
    }

    pub async fn get(&self, job_id: &str) -> Result<JobSnapshot, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!("/jobs/{job_id}")))
            .send()
            .await
            .map_err(|e| ClientError::Request("GET /jobs/{id}".into(), e))?;
        Self::handle(resp).await
    }

    pub async fn list(&self) -> Result<Vec<JobSnapshot>, ClientError> {
        let resp = self
            .http
            .get(self.url("/jobs"))
            .send()
            .await
            .map_err(|e| ClientError::Request("GET /jobs".into(), e))?;
        Self::handle(resp).await
    }

    pub async fn queue_state(&self) -> Result<QueueState, ClientError> {
        let resp = self
            .http
            .get(self.url("/queue"))
            .send()
            .await
            .map_err(|e| ClientError::Request("GET /queue".into(), e))?;
        Self::handle(resp).await
    }

    pub async fn cancel(&self, job_id: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/jobs/{job_id}")))
            .send()
            .await
            .map_err(|e| ClientError::Request("DELETE /jobs/{id}".into(), e))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Self::handle_error(status, resp).await
    }

    async fn handle<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<T>()
                .await
                .map_err(|e| ClientError::Request("decoding response body".into(), e));
        }
        Self::handle_error(status, resp).await
    }

    async fn handle_error<T>(status: reqwest::StatusCode, resp: reqwest::Response) -> Result<T, ClientError> {
        let body = resp.text().await.unwrap_or_default();
        match status {
            reqwest::StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            reqwest::StatusCode::CONFLICT => Err(ClientError::Conflict),
            _ => Err(ClientError::Daemon { status, body }),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
