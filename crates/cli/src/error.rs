// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {0} failed: {1}")]
    Request(String, reqwest::Error),
    #[error("job not found")]
    NotFound,
    #[error("a job is already running")]
    Conflict,
    #[error("daemon returned {status}: {body}")]
    Daemon { status: reqwest::StatusCode, body: String },
}
