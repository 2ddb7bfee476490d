// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

crate::define_id! {
    pub struct TestId("tst-");
}

#[test]
fn new_ids_have_prefix_and_are_unique() {
    let a = TestId::new();
    let b = TestId::new();
    assert!(a.as_str().starts_with("tst-"));
    assert_ne!(a, b);
}

#[test]
fn from_string_round_trips() {
    let id = TestId::from_string("tst-abc123");
    assert_eq!(id.as_str(), "tst-abc123");
    assert_eq!(id, "tst-abc123");
}

#[test]
fn serde_round_trip() {
    let id = TestId::new();
    let json = serde_json::to_string(&id).unwrap();
    let back: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

#[test]
fn deserialize_rejects_oversized_ids() {
    let too_long = "x".repeat(ID_MAX_LEN + 1);
    let json = format!("\"{too_long}\"");
    let result: Result<TestId, _> = serde_json::from_str(&json);
    assert!(result.is_err());
}
