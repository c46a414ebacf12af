// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role enforcement tests.
//!
//! Role checks run before any database access, so these pass against the
//! offline mock.

use axum::http::StatusCode;
use serde_json::json;
use talenthub::models::Role;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_jwt, request};

async fn status_for(
    role: Role,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> StatusCode {
    let (app, state) = create_test_app();
    let token = create_test_jwt("caller", role, &state.config.jwt_signing_key);
    app.oneshot(request(method, uri, Some(&token), body))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_admin_routes_reject_other_roles() {
    for role in [Role::JobSeeker, Role::Employer, Role::Interviewer] {
        for (method, uri) in [
            ("GET", "/api/admin/users"),
            ("GET", "/api/admin/users/u-1"),
            ("GET", "/api/admin/donations/all"),
            ("GET", "/api/admin/acl/permissions"),
            ("GET", "/api/admin/notifications"),
            ("GET", "/api/admin/custom-code"),
            ("GET", "/api/credits/admin/transactions"),
            ("GET", "/api/contacts/admin/all-access"),
            ("GET", "/api/interviews/admin/requests"),
            ("GET", "/api/interviews/admin/ratings"),
            ("GET", "/api/sessions/admin/login-history"),
            ("DELETE", "/api/sessions/admin/u-1"),
        ] {
            assert_eq!(
                status_for(role, method, uri, None).await,
                StatusCode::FORBIDDEN,
                "{} {} as {}",
                method,
                uri,
                role
            );
        }
    }
}

#[tokio::test]
async fn test_admin_writes_reject_other_roles() {
    let cases = [
        (
            "PUT",
            "/api/credits/settings",
            json!({ "contact_reveal_cost": 1 }),
        ),
        (
            "POST",
            "/api/credits/admin/add-credits",
            json!({ "user_id": "u-1", "amount": 100, "description": "Goodwill" }),
        ),
        (
            "POST",
            "/api/admin/users/u-1/donate-credits",
            json!({ "amount": 100 }),
        ),
        (
            "PUT",
            "/api/admin/users/u-1/status",
            json!({ "is_active": false }),
        ),
        (
            "PUT",
            "/api/admin/acl/permissions",
            json!({ "role": "employer", "resource": "jobs", "action": "delete", "allowed": false }),
        ),
        (
            "POST",
            "/api/profiles/companies",
            json!({ "name": "Acme", "category": "tech" }),
        ),
    ];
    for (method, uri, body) in cases {
        assert_eq!(
            status_for(Role::Employer, method, uri, Some(body)).await,
            StatusCode::FORBIDDEN,
            "{} {}",
            method,
            uri
        );
    }
}

#[tokio::test]
async fn test_only_employers_post_jobs() {
    let body = json!({
        "job_title": "Backend Engineer",
        "job_type": "full-time",
        "location": "Remote",
        "work_mode": "remote",
        "description": "Build things"
    });
    for role in [Role::JobSeeker, Role::Interviewer] {
        assert_eq!(
            status_for(role, "POST", "/api/jobs/jobs", Some(body.clone())).await,
            StatusCode::FORBIDDEN
        );
    }
}

#[tokio::test]
async fn test_only_jobseekers_apply() {
    let body = json!({ "job_id": "job-1" });
    assert_eq!(
        status_for(Role::Employer, "POST", "/api/jobs/applications", Some(body)).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_only_employers_reveal_contacts() {
    for role in [Role::JobSeeker, Role::Interviewer, Role::Admin] {
        assert_eq!(
            status_for(
                role,
                "POST",
                "/api/contacts/reveal",
                Some(json!({ "jobseeker_id": "js-1" }))
            )
            .await,
            StatusCode::FORBIDDEN
        );
    }
}

#[tokio::test]
async fn test_interview_roles() {
    assert_eq!(
        status_for(
            Role::Employer,
            "POST",
            "/api/interviews/requests",
            Some(json!({ "skills_to_verify": ["Rust"] }))
        )
        .await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_for(Role::JobSeeker, "GET", "/api/interviews/requests/available", None).await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_for(Role::JobSeeker, "POST", "/api/interviews/requests/r-1/accept", None).await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_for(Role::Employer, "GET", "/api/interviews/requests/my-interviews", None).await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_for(
            Role::JobSeeker,
            "POST",
            "/api/interviews/ratings",
            Some(json!({
                "interview_request_id": "r-1",
                "skill_ratings": [{ "skill": "Rust", "rating": 4.0 }]
            }))
        )
        .await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_profile_endpoints_match_role() {
    assert_eq!(
        status_for(Role::Employer, "GET", "/api/profiles/jobseeker/profile", None).await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_for(Role::JobSeeker, "GET", "/api/profiles/employer/profile", None).await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_for(Role::Employer, "GET", "/api/profiles/interviewer/profile", None).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_admin_passes_role_check() {
    // Admin gets past the role gate and fails only on the offline database.
    assert_eq!(
        status_for(Role::Admin, "GET", "/api/admin/users", None).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_admin_self_registration_forbidden() {
    let (app, _) = create_test_app();
    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "boss@example.com", "role": "admin" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
