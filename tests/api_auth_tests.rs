// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Protected routes accept valid tokens from the header or the cookie
//! 3. Public routes and CORS preflight work without a token

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use talenthub::middleware::auth::{Claims, SESSION_COOKIE};
use talenthub::models::Role;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_jwt, request};

/// Auth passed: 200 with Firestore, 500 with the offline mock.
fn assert_authenticated(status: StatusCode) {
    assert!(
        status == StatusCode::OK || status == StatusCode::INTERNAL_SERVER_ERROR,
        "Expected 200 or 500, got {}. Auth should pass, Firestore may fail without emulator.",
        status
    );
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(request("GET", "/api/credits/balance", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(request(
            "GET",
            "/api/credits/balance",
            Some("invalid.token.here"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_key_rejected() {
    let (app, _) = create_test_app();
    let token = create_test_jwt("u-1", Role::Admin, b"some_other_signing_key_32_bytes!");

    let response = app
        .oneshot(request("GET", "/api/auth/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (app, state) = create_test_app();
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: "u-1".to_string(),
        email: "u-1@example.com".to_string(),
        role: Role::JobSeeker,
        sid: "s-1".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&state.config.jwt_signing_key),
    )
    .unwrap();

    let response = app
        .oneshot(request("GET", "/api/credits/balance", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("u-1", Role::JobSeeker, &state.config.jwt_signing_key);

    let response = app
        .oneshot(request("GET", "/api/credits/balance", Some(&token), None))
        .await
        .unwrap();

    assert_authenticated(response.status());
}

#[tokio::test]
async fn test_session_cookie_accepted() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("u-1", Role::Employer, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/credits/balance")
                .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_authenticated(response.status());
}

#[tokio::test]
async fn test_permissions_for_caller_role() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("u-1", Role::Interviewer, &state.config.jwt_signing_key);

    let response = app
        .oneshot(request("GET", "/api/auth/permissions", Some(&token), None))
        .await
        .unwrap();

    assert_authenticated(response.status());
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/credits/balance")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/credits/balance")
                .header(header::ORIGIN, "https://evil.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-frame-options").unwrap(),
        "DENY"
    );
}

#[tokio::test]
async fn test_public_listings_skip_auth() {
    for uri in [
        "/api/jobs/jobs",
        "/api/jobs/jobs/some-job",
        "/api/admin/notifications/public",
        "/api/admin/custom-code/active",
        "/api/interviews/ratings/jobseeker/js-1",
    ] {
        let (app, _) = create_test_app();
        let response = app.oneshot(request("GET", uri, None, None)).await.unwrap();
        assert_ne!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} should not require auth",
            uri
        );
    }
}

#[tokio::test]
async fn test_company_suggest_short_prefix() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(request("GET", "/api/profiles/companies/suggest?query=a", None, None))
        .await
        .unwrap();

    // Under two characters there is nothing to look up.
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let suggestions: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(suggestions, serde_json::json!({ "companies": [] }));
}

#[tokio::test]
async fn test_job_mutation_requires_auth() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(request("DELETE", "/api/jobs/jobs/some-job", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
