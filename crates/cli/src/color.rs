// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal color helpers, shared by `clap`'s own usage/help rendering
//! and by our table output.

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers and job ids.
    pub const HEADER: u8 = 74;
    /// Queued/running/completed state labels.
    pub const STATE_QUEUED: u8 = 179;
    pub const STATE_RUNNING: u8 = 74;
    pub const STATE_DONE: u8 = 71;
    pub const STATE_FAILED: u8 = 167;
    /// Muted / secondary text: timestamps, urls.
    pub const MUTED: u8 = 245;
}

/// Priority: `NO_COLOR=1` disables, `COLOR=1` forces, otherwise a TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build the `clap` help/usage styles using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::MUTED)))))
}

fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

pub fn muted(text: &str) -> String {
    paint(codes::MUTED, text)
}

/// Color a job state label by its value (§3 lifecycle).
pub fn state(label: &str) -> String {
    let code = match label {
        "queued" => codes::STATE_QUEUED,
        "running" => codes::STATE_RUNNING,
        "completed" => codes::STATE_DONE,
        "failed" | "cancelled" => codes::STATE_FAILED,
        _ => codes::MUTED,
    };
    paint(code, label)
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
