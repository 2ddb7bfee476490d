// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identity, configuration snapshot, and lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for a submitted job.
    pub struct JobId("job-");
}

/// Which shape of work a [`JobConfig`] describes.
///
/// Inferred from the recognized options present in the submission (§6):
/// presence of `base_model_name`/`lora_model_name` marks an evaluation
/// request, everything else is a training request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Training,
    Evaluation,
}

crate::simple_display! {
    JobKind {
        Training => "training",
        Evaluation => "evaluation",
    }
}

/// Experiment tracking backend selection (§4.1, §9 REDESIGN FLAGS).
///
/// A closed enumeration replacing the source's string-keyed dynamic
/// dispatch: swapping backends never touches any component above C1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingBackend {
    #[default]
    Wandb,
    MlFlow,
}

crate::simple_display! {
    TrackingBackend {
        Wandb => "wandb",
        MlFlow => "mlflow",
    }
}

/// A numeric value that may arrive as a JSON number or as a string-encoded
/// scientific-notation literal (`learning_rate` per §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexibleNumber(pub f64);

impl Serialize for FlexibleNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for FlexibleNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(FlexibleNumber(n)),
            Repr::Text(s) => {
                s.trim().parse::<f64>().map(FlexibleNumber).map_err(serde::de::Error::custom)
            }
        }
    }
}

/// Immutable, recognized-option configuration snapshot captured at
/// admission time (§3). Unknown submission keys are accepted and ignored
/// (`extra`) rather than rejected, since they don't change semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    pub model_name: String,
    #[serde(alias = "data_version")]
    pub dataset_version: Option<String>,
    pub template: Option<String>,
    pub cutoff_len: Option<u64>,
    pub max_samples: Option<u64>,
    pub batch_size: Option<u64>,
    pub gradient_accumulation_steps: Option<u64>,
    pub save_steps: Option<u64>,
    pub num_epochs: Option<f64>,
    pub learning_rate: Option<FlexibleNumber>,
    pub lora_name: Option<String>,
    pub lora_version: Option<String>,
    pub lora_hf_repo: Option<String>,
    pub adapter_path: Option<String>,
    pub tracking_backend: Option<TrackingBackend>,
    pub save_name: Option<String>,
    #[serde(default = "default_training_type")]
    pub training_type: String,
    pub webhook_url: Option<String>,

    // Evaluation-only fields.
    pub base_model_name: Option<String>,
    pub lora_model_name: Option<String>,
    pub llm_backend: Option<String>,
    pub multi_thread: Option<bool>,
    pub max_workers: Option<u64>,
    pub port: Option<u16>,
    pub num_rounds: Option<u64>,
    pub train_id: Option<String>,

    /// Unrecognized keys, retained for forwarding to the evaluation
    /// trigger / webhook payloads but otherwise ignored by the core.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_training_type() -> String {
    "sft".to_string()
}

impl JobConfig {
    /// Infer whether this is a training or evaluation request (§6).
    pub fn kind(&self) -> JobKind {
        if self.base_model_name.is_some() || self.lora_model_name.is_some() {
            JobKind::Evaluation
        } else {
            JobKind::Training
        }
    }
}

/// Lifecycle state of a [`Job`] (§3).
///
/// Valid transitions: `Queued -> Running -> {Completed, Failed}` and
/// `Queued -> Cancelled`. `Running -> Cancelled` is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    JobState {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Cancelled)
    }
}

/// A submitted job and its full lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub config: JobConfig,
    pub state: JobState,
    pub enqueued_at: u64,
    pub started_at: Option<u64>,
    pub ended_at: Option<u64>,
    pub error: Option<String>,
    pub tracking_url: Option<String>,
    pub output_path: Option<String>,
    pub webhook_url: Option<String>,
    /// 1-based position in the FIFO queue; set iff `state == Queued`.
    pub queue_position: Option<usize>,
}

impl Job {
    pub fn new(config: JobConfig, enqueued_at: u64) -> Self {
        let webhook_url = config.webhook_url.clone();
        Self {
            id: JobId::new(),
            config,
            state: JobState::Queued,
            enqueued_at,
            started_at: None,
            ended_at: None,
            error: None,
            tracking_url: None,
            output_path: None,
            webhook_url,
            queue_position: None,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.config.kind()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
