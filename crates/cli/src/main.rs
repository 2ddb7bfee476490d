// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jobcorectl`: a thin command-line client for `jobcored`'s HTTP surface
//! (§4.8 C8). It holds no state of its own — every subcommand is exactly
//! one request/response round trip.

mod client;
mod color;
mod error;
mod output;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client::{DaemonClient, Strategy};
use jobcore_core::JobConfig;
use output::OutputFormat;
use std::collections::BTreeMap;

/// Version string embedding the git hash `build.rs` stamps in at compile time.
const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

#[derive(Parser)]
#[command(name = "jobcorectl", version, long_version = LONG_VERSION, styles = color::styles())]
struct Cli {
    /// Base URL of the jobcored daemon to talk to.
    #[arg(long, env = "JOBCORE_DAEMON_URL", default_value = "http://127.0.0.1:8080", global = true)]
    daemon_url: String,

    /// Output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a new job (§4.8 `POST /jobs`).
    Submit {
        /// `model_name` (training) / `base_model_name` (evaluation).
        model_name: String,

        /// What to do if a job is already running: reject the request
        /// outright, or append to the FIFO queue.
        #[arg(long, value_enum, default_value = "queue")]
        strategy: StrategyArg,

        #[arg(long)]
        dataset_version: Option<String>,
        #[arg(long)]
        lora_name: Option<String>,
        #[arg(long)]
        save_name: Option<String>,
        #[arg(long)]
        webhook_url: Option<String>,
        #[arg(long, value_enum)]
        tracking_backend: Option<TrackingBackendArg>,

        /// Additional recognized options as `key=value` pairs, e.g.
        /// `--set batch_size=8 --set learning_rate=3e-4`. Repeatable.
        #[arg(long = "set", value_parser = parse_key_value)]
        set: Vec<(String, String)>,
    },
    /// Show one job's current snapshot (§4.8 `GET /jobs/{id}`).
    Status { job_id: String },
    /// List every known job (§4.8 `GET /jobs`).
    List,
    /// Show FIFO queue introspection (§4.8 `GET /queue`).
    Queue,
    /// Cancel a queued job (§4.8 `DELETE /jobs/{id}`).
    Cancel { job_id: String },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum StrategyArg {
    Reject,
    Queue,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Reject => Strategy::Reject,
            StrategyArg::Queue => Strategy::Queue,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum TrackingBackendArg {
    Wandb,
    Mlflow,
}

impl TrackingBackendArg {
    fn as_str(self) -> &'static str {
        match self {
            TrackingBackendArg::Wandb => "wandb",
            TrackingBackendArg::Mlflow => "mlflow",
        }
    }
}

/// Parse a `key=value` pair, coercing `value` to a bool/number/string JSON
/// scalar (so `--set multi_thread=true` round-trips as a real bool, not
/// the string `"true"`).
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected key=value, got {raw:?}")),
    }
}

fn coerce_json_scalar(value: &str) -> serde_json::Value {
    if let Ok(n) = value.parse::<i64>() {
        return serde_json::Value::from(n);
    }
    if let Ok(n) = value.parse::<f64>() {
        return serde_json::Value::from(n);
    }
    if let Ok(b) = value.parse::<bool>() {
        return serde_json::Value::from(b);
    }
    serde_json::Value::from(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = DaemonClient::new(cli.daemon_url);

    match cli.command {
        Command::Submit { model_name, strategy, dataset_version, lora_name, save_name, webhook_url, tracking_backend, set } => {
            let mut fields: BTreeMap<String, serde_json::Value> = BTreeMap::new();
            fields.insert("model_name".to_string(), model_name.into());
            if let Some(v) = dataset_version {
                fields.insert("dataset_version".to_string(), v.into());
            }
            if let Some(v) = lora_name {
                fields.insert("lora_name".to_string(), v.into());
            }
            if let Some(v) = save_name {
                fields.insert("save_name".to_string(), v.into());
            }
            if let Some(v) = webhook_url {
                fields.insert("webhook_url".to_string(), v.into());
            }
            if let Some(v) = tracking_backend {
                fields.insert("tracking_backend".to_string(), v.as_str().into());
            }
            for (key, value) in set {
                fields.insert(key, coerce_json_scalar(&value));
            }
            let request: JobConfig = serde_json::from_value(serde_json::Value::Object(fields.into_iter().collect()))
                .context("building job submission body")?;

            let response = client.submit(&request, strategy.into()).await?;
            output::print_submit(&response, cli.format)?;
        }
        Command::Status { job_id } => {
            let job = client.get(&job_id).await?;
            output::print_job(&job, cli.format)?;
        }
        Command::List => {
            let jobs = client.list().await?;
            output::print_jobs(&jobs, cli.format)?;
        }
        Command::Queue => {
            let queue = client.queue_state().await?;
            output::print_queue(&queue, cli.format)?;
        }
        Command::Cancel { job_id } => match client.cancel(&job_id).await {
            Ok(()) => println!("{} {job_id}", color::state("cancelled")),
            Err(error::ClientError::Daemon { status, body }) if status.as_u16() == 400 => {
                bail!("cannot cancel {job_id}: {body}");
            }
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
