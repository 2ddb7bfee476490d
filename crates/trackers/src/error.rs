// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker-specific failure modes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("init_run called while a run is already active")]
    AlreadyActive,
    #[error("missing credentials for backend: {0}")]
    MissingCredentials(String),
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("backend request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(e: reqwest::Error) -> Self {
        TrackerError::Request(e.to_string())
    }
}
