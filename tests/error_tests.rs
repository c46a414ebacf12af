// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use talenthub::error::AppError;
use talenthub::services::LedgerError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
        (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
        (AppError::not_found("Job", "j1"), StatusCode::NOT_FOUND),
        (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
        (AppError::RateLimited("slow".into()), StatusCode::TOO_MANY_REQUESTS),
        (AppError::Email("smtp".into()), StatusCode::BAD_GATEWAY),
    ];
    for (err, expected) in cases {
        assert_eq!(render(err).await.0, expected);
    }
}

#[tokio::test]
async fn test_insufficient_credits_is_bad_request() {
    let err: AppError = LedgerError::Insufficient {
        required: 5000,
        available: 120,
    }
    .into();
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_credits");
    assert!(body["detail"].as_str().unwrap().contains("5000"));
}

#[tokio::test]
async fn test_backend_details_hidden() {
    let (status, body) = render(AppError::Database("grpc: deadline on users/abc".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(!body["detail"].as_str().unwrap().contains("users/abc"));
}

#[tokio::test]
async fn test_not_found_detail() {
    let (_, body) = render(AppError::not_found("Job", "j1")).await;
    assert_eq!(body["detail"], "Job j1 not found");
}
