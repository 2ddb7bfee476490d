// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (§7). Each crate also defines its own
//! `thiserror` error enum for its own internal failure modes; this type is
//! the small closed set the HTTP surface (C8) maps to status codes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("a job is already running")]
    Conflict,
    #[error("not found")]
    NotFound,
    #[error("invalid state for this operation: {0}")]
    InvalidState(String),
    #[error("child process failed: {0}")]
    ChildFailed(String),
    #[error("tracker unavailable: {0}")]
    TrackerUnavailable(String),
    #[error("io error: {0}")]
    Io(String),
}
