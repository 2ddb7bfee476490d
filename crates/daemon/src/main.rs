// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jobcored`: the job orchestration daemon binary (§6 C0).
//!
//! Loads `Config` from the environment, wires the `JobRunner`, and serves
//! the HTTP surface (§4.8 C8) until interrupted.

mod config;
mod error;
mod http;
mod job_table;
mod run_token;
mod runner;
mod webhook;
mod worker;

use config::Config;
use runner::JobRunnerState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;
    let tracker_settings = config.tracker.clone();
    let runner = JobRunnerState::new(Arc::new(config), tracker_settings);

    let app = http::router(runner.clone());
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "jobcored listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(runner))
        .await?;

    Ok(())
}

/// On ctrl_c, tell the job runner so the worker can `terminate(grace)` the
/// running child's process group instead of leaving it to `kill_on_drop`
/// (§5, §9), then log and let `axum::serve` finish draining the server.
async fn shutdown_signal(runner: runner::JobRunner) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
    runner.trigger_shutdown();
}
