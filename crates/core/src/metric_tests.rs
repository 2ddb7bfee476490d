// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn current_steps_overrides_explicit_step_and_is_not_emitted() {
    let raw = json!({"loss": 0.5, "current_steps": 7}).as_object().unwrap().clone();
    let record = MetricRecord::from_raw(&raw, Some(3));
    assert_eq!(record.step, Some(7));
    assert_eq!(record.values.get("loss"), Some(&0.5));
    assert!(!record.values.contains_key("current_steps"));
}

#[test]
fn missing_step_defaults_to_zero() {
    let raw = json!({"loss": 0.1}).as_object().unwrap().clone();
    let record = MetricRecord::from_raw(&raw, None);
    assert_eq!(record.step, Some(0));
}

#[test]
fn non_numeric_values_are_dropped() {
    let raw = json!({"loss": 0.1, "message": "hello", "epoch": 2}).as_object().unwrap().clone();
    let record = MetricRecord::from_raw(&raw, None);
    assert!(record.values.contains_key("loss"));
    assert!(record.values.contains_key("epoch"));
    assert!(!record.values.contains_key("message"));
}
