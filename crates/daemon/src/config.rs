// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, read once from the environment at startup (§6 C0).

use jobcore_core::TrackingBackend;
use jobcore_trackers::TrackerSettings;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

pub struct Config {
    pub bind_addr: SocketAddr,
    pub monitor_interval: Duration,
    pub stall_timeout: Duration,
    pub upload_timeout: Duration,
    pub max_wait: Duration,
    pub eval_server_url: Option<String>,
    pub tracker: TrackerSettings,
    pub python_bin: String,
    pub train_entrypoint: String,
    pub eval_entrypoint: String,
    pub output_root: PathBuf,
    pub terminate_grace: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env_or("JOBCORE_BIND_ADDR", "0.0.0.0:8080")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "JOBCORE_BIND_ADDR",
                value: env_or("JOBCORE_BIND_ADDR", "0.0.0.0:8080"),
            })?;

        let monitor_interval = parse_secs("JOBCORE_MONITOR_INTERVAL_SECS", 5)?;
        let stall_timeout = parse_secs("JOBCORE_STALL_TIMEOUT_SECS", 600)?;
        let upload_timeout = parse_secs("JOBCORE_UPLOAD_TIMEOUT_SECS", 900)?;
        let max_wait = parse_secs("JOBCORE_MAX_WAIT_SECS", 30)?;

        let eval_server_url = std::env::var("EVAL_SERVER_URL").ok().filter(|s| !s.is_empty());

        let backend = match std::env::var("TRACKING_BACKEND").as_deref() {
            Ok("mlflow") => TrackingBackend::MlFlow,
            Ok("wandb") | Err(_) => TrackingBackend::Wandb,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    name: "TRACKING_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let tracker = TrackerSettings {
            backend,
            wandb_api_key: std::env::var("WANDB_API_KEY").ok(),
            wandb_entity: std::env::var("WANDB_ENTITY").ok(),
            wandb_project: std::env::var("WANDB_PROJECT").ok(),
            wandb_base_url: env_or("WANDB_BASE_URL", "https://api.wandb.ai"),
            mlflow_tracking_uri: std::env::var("MLFLOW_TRACKING_URI").ok(),
            mlflow_experiment_name: std::env::var("MLFLOW_EXPERIMENT_NAME").ok(),
        };

        let python_bin = env_or("JOBCORE_PYTHON_BIN", "python3");
        let train_entrypoint = env_or("JOBCORE_TRAIN_ENTRYPOINT", "scripts/train.py");
        let eval_entrypoint = env_or("JOBCORE_EVAL_ENTRYPOINT", "scripts/evaluate.py");
        let output_root = PathBuf::from(env_or("JOBCORE_OUTPUT_ROOT", "./jobcore-output"));
        let terminate_grace = parse_secs("JOBCORE_TERMINATE_GRACE_SECS", 2)?;

        Ok(Self {
            bind_addr,
            monitor_interval,
            stall_timeout,
            upload_timeout,
            max_wait,
            eval_server_url,
            tracker,
            python_bin,
            train_entrypoint,
            eval_entrypoint,
            output_root,
            terminate_grace,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_secs(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
