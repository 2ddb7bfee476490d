// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess supervision failure modes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn child process: {0}")]
    Spawn(String),
    #[error("failed to signal process group {pgid}: {source}")]
    Signal { pgid: i32, source: nix::Error },
    #[error("io error waiting on child: {0}")]
    Wait(String),
}
