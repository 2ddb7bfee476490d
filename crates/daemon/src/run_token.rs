// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RunToken: the capacity-1 mutual exclusion token gating which job may
//! actually be running a child process at a given moment (§5).
//!
//! Modeled as a `tokio::sync::Semaphore` with one permit rather than a
//! plain mutex so the admission policy can grow to N-way concurrency by
//! changing one constructor argument.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Clone)]
pub struct RunToken {
    semaphore: Arc<Semaphore>,
}

impl RunToken {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Take a slot only if one is immediately free.
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }
}
