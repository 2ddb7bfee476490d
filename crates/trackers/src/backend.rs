// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds a boxed [`Tracker`] from runtime configuration.

use crate::error::TrackerError;
use crate::mlflow::{MlFlowConfig, MlFlowTracker};
use crate::tracker::Tracker;
use crate::wandb::{WandbConfig, WandbTracker};
use jobcore_core::TrackingBackend;
use std::sync::Arc;

/// Environment-sourced settings for whichever backend is selected.
/// Fields unused by the selected backend are ignored rather than required.
#[derive(Clone)]
pub struct TrackerSettings {
    pub backend: TrackingBackend,
    pub wandb_api_key: Option<String>,
    pub wandb_entity: Option<String>,
    pub wandb_project: Option<String>,
    pub wandb_base_url: String,
    pub mlflow_tracking_uri: Option<String>,
    pub mlflow_experiment_name: Option<String>,
}

pub fn build_tracker(settings: &TrackerSettings) -> Result<Arc<dyn Tracker>, TrackerError> {
    match settings.backend {
        TrackingBackend::Wandb => {
            let api_key = settings
                .wandb_api_key
                .clone()
                .ok_or_else(|| TrackerError::MissingCredentials("wandb".into()))?;
            let entity = settings
                .wandb_entity
                .clone()
                .ok_or_else(|| TrackerError::MissingCredentials("wandb entity".into()))?;
            let project = settings
                .wandb_project
                .clone()
                .ok_or_else(|| TrackerError::MissingCredentials("wandb project".into()))?;
            Ok(Arc::new(WandbTracker::new(WandbConfig {
                api_key,
                entity,
                project,
                base_url: settings.wandb_base_url.clone(),
            })))
        }
        TrackingBackend::MlFlow => {
            let tracking_uri = settings
                .mlflow_tracking_uri
                .clone()
                .ok_or_else(|| TrackerError::MissingCredentials("mlflow tracking uri".into()))?;
            let experiment_name = settings
                .mlflow_experiment_name
                .clone()
                .unwrap_or_else(|| "default".to_string());
            Ok(Arc::new(MlFlowTracker::new(MlFlowConfig {
                tracking_uri,
                experiment_name,
            })))
        }
    }
}
