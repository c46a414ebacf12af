// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Bad input is rejected before the database is touched, so every case
//! here is answered without Firestore.

use axum::http::StatusCode;
use serde_json::{json, Value};
use talenthub::models::Role;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_jwt, request};

async fn send(role: Option<Role>, method: &str, uri: &str, body: Option<Value>) -> StatusCode {
    let (app, state) = create_test_app();
    let token = role.map(|r| create_test_jwt("caller", r, &state.config.jwt_signing_key));
    app.oneshot(request(method, uri, token.as_deref(), body))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_register_rejects_bad_contact_details() {
    assert_eq!(
        send(
            None,
            "POST",
            "/api/auth/register",
            Some(json!({ "email": "not-an-email", "role": "jobseeker" }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send(
            None,
            "POST",
            "/api/auth/register",
            Some(json!({ "email": "a@example.com", "phone": "12", "role": "employer" }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_register_rejects_unknown_role() {
    // Enum mismatch is a body deserialization error.
    assert_eq!(
        send(
            None,
            "POST",
            "/api/auth/register",
            Some(json!({ "email": "a@example.com", "role": "superuser" }))
        )
        .await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_magic_link_rejects_bad_email() {
    for path in ["/api/auth/magic-link", "/api/auth/forgot-password"] {
        assert_eq!(
            send(None, "POST", path, Some(json!({ "email": "nobody" }))).await,
            StatusCode::BAD_REQUEST,
            "{}",
            path
        );
    }
}

#[tokio::test]
async fn test_verify_requires_token() {
    assert_eq!(
        send(None, "GET", "/api/auth/verify", None).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_interview_request_needs_skills() {
    for skills in [json!([]), json!(["   "])] {
        assert_eq!(
            send(
                Some(Role::JobSeeker),
                "POST",
                "/api/interviews/requests",
                Some(json!({ "skills_to_verify": skills }))
            )
            .await,
            StatusCode::BAD_REQUEST
        );
    }
}

#[tokio::test]
async fn test_rating_scale_enforced() {
    for ratings in [
        json!([]),
        json!([{ "skill": "Rust", "rating": 7.0 }]),
        json!([{ "skill": "Rust", "rating": 3.3 }]),
        json!([{ "skill": "Rust", "rating": 0.0 }]),
    ] {
        assert_eq!(
            send(
                Some(Role::Interviewer),
                "POST",
                "/api/interviews/ratings",
                Some(json!({ "interview_request_id": "r-1", "skill_ratings": ratings }))
            )
            .await,
            StatusCode::BAD_REQUEST
        );
    }
}

#[tokio::test]
async fn test_job_ranges_checked() {
    let body = json!({
        "job_title": "Backend Engineer",
        "job_type": "full-time",
        "location": "Remote",
        "work_mode": "remote",
        "description": "Build things",
        "min_salary": 200000,
        "max_salary": 100000
    });
    assert_eq!(
        send(Some(Role::Employer), "POST", "/api/jobs/jobs", Some(body)).await,
        StatusCode::BAD_REQUEST
    );

    let no_openings = json!({
        "job_title": "Backend Engineer",
        "job_type": "full-time",
        "location": "Remote",
        "work_mode": "remote",
        "description": "Build things",
        "number_of_openings": 0
    });
    assert_eq!(
        send(Some(Role::Employer), "POST", "/api/jobs/jobs", Some(no_openings)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_reveal_requires_target() {
    assert_eq!(
        send(
            Some(Role::Employer),
            "POST",
            "/api/contacts/reveal",
            Some(json!({ "jobseeker_id": "" }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_credit_amounts_must_be_positive() {
    assert_eq!(
        send(
            Some(Role::Admin),
            "POST",
            "/api/admin/users/u-1/donate-credits",
            Some(json!({ "amount": 0 }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send(
            Some(Role::Admin),
            "POST",
            "/api/credits/admin/deduct-credits",
            Some(json!({ "user_id": "u-1", "amount": -5, "description": "oops" }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_credit_amounts_capped() {
    assert_eq!(
        send(
            Some(Role::Admin),
            "POST",
            "/api/admin/users/u-1/donate-credits",
            Some(json!({ "amount": i64::MAX }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send(
            Some(Role::Admin),
            "POST",
            "/api/credits/admin/add-credits",
            Some(json!({ "user_id": "u-1", "amount": 5_000_000_000i64, "description": "bulk" }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send(
            Some(Role::Admin),
            "PUT",
            "/api/credits/settings",
            Some(json!({ "contact_access_duration_days": 1_000_000_000_000i64 }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_transaction_dates_validated() {
    assert_eq!(
        send(
            Some(Role::Employer),
            "GET",
            "/api/credits/transactions?start_date=yesterday",
            None
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send(
            Some(Role::Employer),
            "GET",
            "/api/credits/transactions/export?end_date=2026-13-45",
            None
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_unknown_permission_rejected() {
    assert_eq!(
        send(
            Some(Role::Admin),
            "PUT",
            "/api/admin/acl/permissions",
            Some(json!({ "role": "employer", "resource": "rockets", "action": "launch", "allowed": true }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_banner_requires_content() {
    assert_eq!(
        send(
            Some(Role::Admin),
            "POST",
            "/api/admin/notifications",
            Some(json!({ "banner_type": "public" }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send(
            Some(Role::Admin),
            "POST",
            "/api/admin/notifications",
            Some(json!({
                "title": "Maintenance",
                "message": "Down tonight",
                "banner_type": "public",
                "start_date": "next week"
            }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_custom_code_type_restricted() {
    assert_eq!(
        send(
            Some(Role::Admin),
            "POST",
            "/api/admin/custom-code",
            Some(json!({ "name": "tracker", "code_type": "html", "code": "<b>" }))
        )
        .await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_profile_visibility_values() {
    assert_eq!(
        send(
            Some(Role::JobSeeker),
            "PUT",
            "/api/profiles/jobseeker/settings",
            Some(json!({ "profile_visibility": "everyone" }))
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_login_history_status_filter() {
    assert_eq!(
        send(
            Some(Role::Admin),
            "GET",
            "/api/sessions/admin/login-history?status=hacked",
            None
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}
