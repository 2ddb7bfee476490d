// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metric records forwarded from the log tailer and the uploader (§3 `MetricRecord`).

use std::collections::BTreeMap;

/// A batch of named numeric metrics at a given training step.
///
/// If `step` is absent at emit time, callers default it to `0` (§3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRecord {
    pub values: BTreeMap<String, f64>,
    pub step: Option<u64>,
}

impl MetricRecord {
    pub fn new(step: Option<u64>) -> Self {
        Self { values: BTreeMap::new(), step }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Effective step: the reserved `current_steps` key, if present among
    /// a raw metrics map, overrides the explicit `step` argument (§4.1).
    pub fn effective_step(explicit_step: Option<u64>, raw: &serde_json::Map<String, serde_json::Value>) -> u64 {
        raw.get("current_steps")
            .and_then(|v| v.as_u64())
            .or(explicit_step)
            .unwrap_or(0)
    }

    /// Build a record from a raw JSON object, keeping only numeric values
    /// and dropping the reserved `current_steps` key from the emitted set.
    pub fn from_raw(raw: &serde_json::Map<String, serde_json::Value>, explicit_step: Option<u64>) -> Self {
        let step = Self::effective_step(explicit_step, raw);
        let mut record = Self::new(Some(step));
        for (key, value) in raw {
            if key == "current_steps" {
                continue;
            }
            if let Some(n) = value.as_f64() {
                record.insert(key.clone(), n);
            }
        }
        record
    }
}

#[cfg(test)]
#[path = "metric_tests.rs"]
mod tests;
