// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring failure modes. These are logged and generally do not abort
//! the job; see `monitor_loop` for which ones do.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("tracker error: {0}")]
    Tracker(#[from] jobcore_trackers::TrackerError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("eval trigger request failed: {0}")]
    EvalTrigger(String),
    #[error("training process stalled for {0}s with no log activity")]
    Stalled(u64),
}
