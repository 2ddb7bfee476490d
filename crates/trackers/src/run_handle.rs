// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque reference to an active tracker run (§3 `RunHandle`).

use jobcore_core::TrackingBackend;

#[derive(Debug, Clone)]
pub struct RunHandle {
    pub run_id: String,
    pub tracking_url: String,
    pub backend: TrackingBackend,
}
