// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared API key check for frontend requests.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Paths served without an API key.
const EXEMPT_PATHS: [&str; 1] = ["/health"];

fn reject(status: StatusCode, code: &str, detail: &str) -> Response {
    (status, Json(json!({ "error": code, "detail": detail }))).into_response()
}

/// Require `X-API-Key` to match the configured key.
///
/// Disabled when no key is configured (local development).
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_key.as_deref() else {
        return next.run(request).await;
    };
    if request.method() == Method::OPTIONS || EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    match provided {
        None => {
            tracing::warn!(path = %request.uri().path(), "Request without API key");
            reject(
                StatusCode::UNAUTHORIZED,
                "MISSING_API_KEY",
                "API key is required",
            )
        }
        Some(key) if bool::from(key.as_bytes().ct_eq(expected.as_bytes())) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Request with invalid API key");
            reject(StatusCode::FORBIDDEN, "INVALID_API_KEY", "Invalid API key")
        }
    }
}
