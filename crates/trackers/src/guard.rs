// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared active-run bookkeeping used by every [`crate::Tracker`] backend.
//!
//! Each backend embeds one `RunGuard` and delegates the "exactly one
//! active run", "idempotent per (key, step)", and "idempotent finish"
//! invariants of §4.1 to it, so backend implementations only need to
//! handle wire-protocol specifics.

use crate::error::TrackerError;
use crate::run_handle::RunHandle;
use parking_lot::Mutex;
use std::collections::HashSet;

#[derive(Default)]
pub struct RunGuard {
    active: Mutex<Option<RunHandle>>,
    logged_metrics: Mutex<HashSet<(String, u64)>>,
    last_model_uri: Mutex<Option<String>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new run. Fails with `AlreadyActive` if one is already open.
    pub fn begin(&self, handle: RunHandle) -> Result<(), TrackerError> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(TrackerError::AlreadyActive);
        }
        *active = Some(handle);
        self.logged_metrics.lock().clear();
        Ok(())
    }

    pub fn current(&self) -> Option<RunHandle> {
        self.active.lock().clone()
    }

    /// The current run, or `None` with a warning logged against `what`
    /// (the operation being attempted). Used by calls that the spec
    /// defines as a no-op rather than a failure when no run is active
    /// (§4.1 `log_metric`/`log_metrics`/`update_config`).
    pub fn current_or_warn(&self, what: &str) -> Option<RunHandle> {
        let current = self.current();
        if current.is_none() {
            tracing::warn!(operation = what, "no active tracker run, dropping call");
        }
        current
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Idempotent: returns the prior handle if one existed, clears state
    /// either way, and never errors on a double-close.
    pub fn finish(&self) -> Option<RunHandle> {
        self.logged_metrics.lock().clear();
        self.active.lock().take()
    }

    /// Record that `key` at `step` was logged. Returns `true` the first
    /// time this (key, step) pair is seen, `false` on repeats.
    pub fn mark_logged(&self, key: &str, step: u64) -> bool {
        self.logged_metrics.lock().insert((key.to_string(), step))
    }

    /// The URI of the most recently registered model version, if any (the
    /// `original` tag of §4.1's `register_model`).
    pub fn last_model_uri(&self) -> Option<String> {
        self.last_model_uri.lock().clone()
    }

    /// Record `new_uri` as the most recently registered model version.
    pub fn set_last_model_uri(&self, new_uri: String) {
        *self.last_model_uri.lock() = Some(new_uri);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobcore_core::TrackingBackend;

    fn handle() -> RunHandle {
        RunHandle {
            run_id: "run-1".into(),
            tracking_url: "https://example/run-1".into(),
            backend: TrackingBackend::Wandb,
        }
    }

    #[test]
    fn begin_twice_without_finish_fails() {
        let guard = RunGuard::new();
        guard.begin(handle()).unwrap();
        assert!(matches!(guard.begin(handle()), Err(TrackerError::AlreadyActive)));
    }

    #[test]
    fn finish_is_idempotent() {
        let guard = RunGuard::new();
        guard.begin(handle()).unwrap();
        assert!(guard.finish().is_some());
        assert!(guard.finish().is_none());
    }

    #[test]
    fn mark_logged_is_true_once_per_key_step() {
        let guard = RunGuard::new();
        assert!(guard.mark_logged("loss", 1));
        assert!(!guard.mark_logged("loss", 1));
        assert!(guard.mark_logged("loss", 2));
    }
}
