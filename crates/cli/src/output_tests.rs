// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn format_elapsed_zero_is_dash() {
    assert_eq!(format_elapsed(0), "-");
}

#[test]
fn format_elapsed_buckets_by_unit() {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();

    assert_eq!(format_elapsed(now - 5), "5s");
    assert_eq!(format_elapsed(now - 120), "2m");
    assert_eq!(format_elapsed(now - 7_200), "2h");
    assert_eq!(format_elapsed(now - 172_800), "2d");
}

#[test]
fn print_jobs_handles_empty_list() {
    // Smoke test: must not panic on an empty job list.
    print_jobs(&[], OutputFormat::Text).unwrap();
}
