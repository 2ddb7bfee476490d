// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn codes_have_expected_values() {
    assert_eq!(codes::HEADER, 74);
    assert_eq!(codes::MUTED, 245);
}

#[test]
#[serial]
fn styles_returns_styled_when_color_forced() {
    std::env::set_var("COLOR", "1");
    std::env::remove_var("NO_COLOR");

    let s = styles();
    let debug = format!("{s:?}");
    assert_ne!(debug, format!("{:?}", clap::builder::styling::Styles::plain()));
}

#[test]
#[serial]
fn styles_returns_plain_when_no_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");

    let s = styles();
    let debug = format!("{s:?}");
    assert_eq!(debug, format!("{:?}", clap::builder::styling::Styles::plain()));

    std::env::remove_var("NO_COLOR");
}

#[test]
#[serial]
fn state_colors_failed_and_cancelled_the_same() {
    std::env::set_var("NO_COLOR", "1");
    assert_eq!(state("failed"), "failed");
    assert_eq!(state("cancelled"), "cancelled");
    std::env::remove_var("NO_COLOR");
}
