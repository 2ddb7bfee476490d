// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level errors and their mapping onto HTTP responses (§7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jobcore_core::ErrorKind;
use serde_json::json;

pub struct ApiError(pub ErrorKind);

impl From<ErrorKind> for ApiError {
    fn from(kind: ErrorKind) -> Self {
        Self(kind)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState(_) => StatusCode::BAD_REQUEST,
            ErrorKind::ChildFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::TrackerUnavailable(_) => StatusCode::BAD_GATEWAY,
            ErrorKind::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
