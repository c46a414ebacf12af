// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Skill-verification interview routes.
//!
//! A job seeker pays for a request, an interviewer accepts it, and the
//! interviewer's rating completes it: the interviewer is paid and the
//! ratings are folded into the job seeker's profile.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::{new_id, Doc};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    InterviewRating, InterviewRequest, InterviewStatus, Role, SkillRating, TransactionCategory,
    TransactionType,
};
use crate::routes::credits::BalanceResponse;
use crate::services::interview::{self as rules};
use crate::services::ledger::{Memo, Movement};
use crate::time_utils::now_rfc3339;
use crate::AppState;

const MAX_PUBLIC_RATINGS: usize = 10;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/interviews/ratings/jobseeker/{jobseeker_id}",
        get(jobseeker_ratings),
    )
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/interviews/requests", post(create_request))
        .route("/api/interviews/requests/available", get(available_requests))
        .route("/api/interviews/requests/my-interviews", get(my_interviews))
        .route("/api/interviews/requests/{request_id}", put(admin_update_request))
        .route("/api/interviews/requests/{request_id}/accept", post(accept_request))
        .route("/api/interviews/ratings", post(submit_rating))
        .route("/api/interviews/admin/requests", get(admin_requests))
        .route("/api/interviews/admin/ratings", get(admin_ratings))
}

async fn load_request(state: &AppState, request_id: &str) -> Result<InterviewRequest> {
    state
        .db
        .get_interview_request(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Interview request not found".to_string()))
}

// ─── Requests ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestBody {
    #[validate(length(min = 1, max = 20, message = "Select between 1 and 20 skills"))]
    pub skills_to_verify: Vec<String>,
    pub preferred_date: Option<String>,
    #[validate(length(max = 2000))]
    pub jobseeker_notes: Option<String>,
}

#[derive(Serialize)]
pub struct CreateRequestResponse {
    pub message: String,
    pub request: InterviewRequest,
    pub matching_interviewers_count: usize,
    pub remaining_credits: BalanceResponse,
}

async fn create_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<CreateRequestResponse>)> {
    auth.require_role(&[Role::JobSeeker])?;
    body.validate()?;
    let skills: Vec<String> = body
        .skills_to_verify
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        return Err(AppError::BadRequest(
            "At least one skill is required".to_string(),
        ));
    }

    let settings = state.db.get_settings().await?;
    let interviewers = state.db.list_interviewer_profiles().await?;
    let notified = rules::matching_interviewers(&skills, &interviewers);

    let now = now_rfc3339();
    let request = InterviewRequest {
        id: new_id(),
        jobseeker_id: auth.user_id.clone(),
        skills_to_verify: skills,
        preferred_date: body.preferred_date,
        jobseeker_notes: body.jobseeker_notes,
        status: InterviewStatus::Pending,
        credits_paid: settings.interview_request_cost,
        interviewer_id: None,
        notified_interviewers: notified,
        assigned_at: None,
        assigned_by: None,
        scheduled_at: None,
        completed_at: None,
        admin_notes: None,
        created_at: now.clone(),
        updated_at: now,
    };

    let user = if settings.interview_request_cost > 0 {
        let memo = Memo::new(
            TransactionType::Spend,
            TransactionCategory::InterviewRequest,
            "Interview verification request",
        )
        .reference(request.id.clone(), "interview_request");
        let (user, _) = state
            .db
            .apply_credit_change(
                &auth.user_id,
                Movement::Debit(settings.interview_request_cost),
                memo,
                new_id(),
                &[Doc::InterviewRequest(&request)],
            )
            .await?;
        user
    } else {
        state.db.put_interview_request(&request).await?;
        state
            .db
            .get_user(&auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", &auth.user_id))?
    };

    tracing::info!(
        request_id = %request.id,
        jobseeker_id = %auth.user_id,
        matched = request.notified_interviewers.len(),
        "Interview requested"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateRequestResponse {
            message: "Interview request created successfully".to_string(),
            matching_interviewers_count: request.notified_interviewers.len(),
            request,
            remaining_credits: BalanceResponse::from(&user),
        }),
    ))
}

async fn available_requests(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<InterviewRequest>>> {
    auth.require_role(&[Role::Interviewer])?;
    Ok(Json(
        state
            .db
            .list_available_interview_requests(&auth.user_id)
            .await?,
    ))
}

/// First interviewer to accept a pending request gets it.
async fn accept_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
) -> Result<Json<InterviewRequest>> {
    auth.require_role(&[Role::Interviewer])?;

    let lock = state.db.lock_for(format!("interview:{}", request_id));
    let _guard = lock.lock().await;

    let mut request = load_request(&state, &request_id).await?;
    if request.status != InterviewStatus::Pending {
        return Err(AppError::BadRequest(
            "Request is no longer available".to_string(),
        ));
    }

    let now = now_rfc3339();
    request.status = InterviewStatus::Assigned;
    request.interviewer_id = Some(auth.user_id.clone());
    request.assigned_at = Some(now.clone());
    request.updated_at = now;
    state.db.put_interview_request(&request).await?;

    tracing::info!(request_id = %request.id, interviewer_id = %auth.user_id, "Interview accepted");
    Ok(Json(request))
}

#[derive(Deserialize)]
pub struct StatusFilter {
    pub status: Option<InterviewStatus>,
}

async fn my_interviews(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<InterviewRequest>>> {
    auth.require_role(&[Role::JobSeeker, Role::Interviewer])?;

    let mut requests = match auth.role {
        Role::JobSeeker => {
            state
                .db
                .list_interview_requests_by_jobseeker(&auth.user_id)
                .await?
        }
        _ => {
            state
                .db
                .list_interview_requests_by_interviewer(&auth.user_id)
                .await?
        }
    };
    if let Some(status) = filter.status {
        requests.retain(|r| r.status == status);
    }
    Ok(Json(requests))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateRequest {
    pub status: Option<InterviewStatus>,
    #[validate(length(min = 1))]
    pub interviewer_id: Option<String>,
    pub scheduled_at: Option<String>,
    #[validate(length(max = 2000))]
    pub admin_notes: Option<String>,
}

/// Apply an admin edit, enforcing the status workflow.
fn apply_admin_update(
    request: &mut InterviewRequest,
    update: AdminUpdateRequest,
    admin_id: &str,
    now: &str,
) -> Result<()> {
    if let Some(interviewer_id) = update.interviewer_id {
        if request.interviewer_id.as_deref() != Some(interviewer_id.as_str()) {
            request.interviewer_id = Some(interviewer_id);
            request.assigned_by = Some(admin_id.to_string());
            request.assigned_at = Some(now.to_string());
            if request.status == InterviewStatus::Pending && update.status.is_none() {
                request.status = InterviewStatus::Assigned;
            }
        }
    }
    if let Some(status) = update.status {
        if status != request.status {
            if !rules::can_transition(request.status, status) {
                return Err(AppError::BadRequest(format!(
                    "Cannot move interview from {} to {}",
                    request.status.as_str(),
                    status.as_str()
                )));
            }
            if status == InterviewStatus::Assigned && request.interviewer_id.is_none() {
                return Err(AppError::BadRequest(
                    "An interviewer is required to assign a request".to_string(),
                ));
            }
            if status == InterviewStatus::Completed {
                request.completed_at = Some(now.to_string());
            }
            request.status = status;
        }
    }
    if update.scheduled_at.is_some() {
        request.scheduled_at = update.scheduled_at;
    }
    if update.admin_notes.is_some() {
        request.admin_notes = update.admin_notes;
    }
    request.updated_at = now.to_string();
    Ok(())
}

async fn admin_update_request(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
    Json(body): Json<AdminUpdateRequest>,
) -> Result<Json<InterviewRequest>> {
    auth.require_admin()?;
    body.validate()?;

    let lock = state.db.lock_for(format!("interview:{}", request_id));
    let _guard = lock.lock().await;

    let mut request = load_request(&state, &request_id).await?;
    apply_admin_update(&mut request, body, &auth.user_id, &now_rfc3339())?;
    state.db.put_interview_request(&request).await?;

    tracing::info!(
        request_id = %request.id,
        status = request.status.as_str(),
        admin = %auth.user_id,
        "Interview request updated"
    );
    Ok(Json(request))
}

// ─── Ratings ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRatingRequest {
    #[validate(length(min = 1))]
    pub interview_request_id: String,
    pub skill_ratings: Vec<SkillRating>,
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
    #[validate(length(max = 2000))]
    pub strengths: Option<String>,
    #[validate(length(max = 2000))]
    pub improvements: Option<String>,
}

#[derive(Serialize)]
pub struct SubmitRatingResponse {
    pub message: String,
    pub rating: InterviewRating,
    pub credits_earned: i64,
    pub new_balance: Option<BalanceResponse>,
}

async fn submit_rating(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<SubmitRatingResponse>)> {
    auth.require_role(&[Role::Interviewer])?;
    body.validate()?;
    let overall = rules::overall_rating(&body.skill_ratings)?;

    let lock = state
        .db
        .lock_for(format!("interview:{}", body.interview_request_id));
    let _guard = lock.lock().await;

    let mut request = load_request(&state, &body.interview_request_id).await?;
    if request.interviewer_id.as_deref() != Some(auth.user_id.as_str()) {
        return Err(AppError::Forbidden(
            "You are not assigned to this interview".to_string(),
        ));
    }
    if request.status == InterviewStatus::Completed {
        return Err(AppError::BadRequest(
            "Rating already submitted for this interview".to_string(),
        ));
    }
    if !rules::can_transition(request.status, InterviewStatus::Completed) {
        return Err(AppError::BadRequest(format!(
            "Cannot rate an interview that is {}",
            request.status.as_str()
        )));
    }

    let settings = state.db.get_settings().await?;
    let earnings = settings.interview_completion_earning;
    let now = now_rfc3339();

    let rating = InterviewRating {
        id: new_id(),
        interview_request_id: request.id.clone(),
        jobseeker_id: request.jobseeker_id.clone(),
        interviewer_id: auth.user_id.clone(),
        skill_ratings: body.skill_ratings,
        overall_rating: overall,
        feedback: body.feedback,
        strengths: body.strengths,
        improvements: body.improvements,
        credits_earned: earnings,
        created_at: now.clone(),
    };

    request.status = InterviewStatus::Completed;
    request.completed_at = Some(now.clone());
    request.updated_at = now.clone();

    let mut jobseeker_profile = state.db.get_jobseeker_profile(&request.jobseeker_id).await?;
    if let Some(profile) = jobseeker_profile.as_mut() {
        rules::apply_rating(profile, overall, &rating.skill_ratings);
        profile.updated_at = now.clone();
    }
    let mut interviewer_profile = state.db.get_interviewer_profile(&auth.user_id).await?;
    if let Some(profile) = interviewer_profile.as_mut() {
        profile.interviews_conducted = profile.interviews_conducted.saturating_add(1);
        profile.updated_at = now.clone();
    }

    let mut docs = vec![Doc::InterviewRating(&rating), Doc::InterviewRequest(&request)];
    if let Some(profile) = jobseeker_profile.as_ref() {
        docs.push(Doc::JobSeekerProfile(profile));
    }
    if let Some(profile) = interviewer_profile.as_ref() {
        docs.push(Doc::InterviewerProfile(profile));
    }

    let new_balance = if earnings > 0 {
        let memo = Memo::new(
            TransactionType::Earn,
            TransactionCategory::InterviewCompletion,
            format!("Interview completed for request {}", request.id),
        )
        .reference(rating.id.clone(), "interview_rating");
        let (user, _) = state
            .db
            .apply_credit_change(
                &auth.user_id,
                Movement::Credit(earnings),
                memo,
                new_id(),
                &docs,
            )
            .await?;
        Some(BalanceResponse::from(&user))
    } else {
        state.db.commit(&docs).await?;
        None
    };

    tracing::info!(
        request_id = %request.id,
        interviewer_id = %auth.user_id,
        overall,
        earnings,
        "Interview rated"
    );
    Ok((
        StatusCode::CREATED,
        Json(SubmitRatingResponse {
            message: "Rating submitted successfully".to_string(),
            rating,
            credits_earned: earnings,
            new_balance,
        }),
    ))
}

#[derive(Serialize)]
pub struct JobSeekerRatings {
    pub has_verification: bool,
    pub latest_rating: Option<InterviewRating>,
    pub all_ratings: Vec<InterviewRating>,
}

/// Verification badge data for a job seeker.
async fn jobseeker_ratings(
    State(state): State<Arc<AppState>>,
    Path(jobseeker_id): Path<String>,
) -> Result<Json<JobSeekerRatings>> {
    let mut ratings = state.db.list_ratings_by_jobseeker(&jobseeker_id).await?;
    ratings.truncate(MAX_PUBLIC_RATINGS);
    Ok(Json(JobSeekerRatings {
        has_verification: !ratings.is_empty(),
        latest_rating: ratings.first().cloned(),
        all_ratings: ratings,
    }))
}

// ─── Admin ───────────────────────────────────────────────────

async fn admin_requests(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<InterviewRequest>>> {
    auth.require_admin()?;
    let requests = match filter.status {
        Some(status) => state.db.list_interview_requests_by_status(status).await?,
        None => state.db.list_all_interview_requests().await?,
    };
    Ok(Json(requests))
}

async fn admin_ratings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<InterviewRating>>> {
    auth.require_admin()?;
    Ok(Json(state.db.list_all_ratings().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> InterviewRequest {
        InterviewRequest {
            id: "r1".into(),
            jobseeker_id: "js".into(),
            skills_to_verify: vec!["Rust".into()],
            preferred_date: None,
            jobseeker_notes: None,
            status: InterviewStatus::Pending,
            credits_paid: 5_000,
            interviewer_id: None,
            notified_interviewers: Vec::new(),
            assigned_at: None,
            assigned_by: None,
            scheduled_at: None,
            completed_at: None,
            admin_notes: None,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    fn update() -> AdminUpdateRequest {
        AdminUpdateRequest {
            status: None,
            interviewer_id: None,
            scheduled_at: None,
            admin_notes: None,
        }
    }

    #[test]
    fn test_admin_assignment_records_admin() {
        let mut r = pending();
        let edit = AdminUpdateRequest {
            interviewer_id: Some("iv-1".into()),
            ..update()
        };
        apply_admin_update(&mut r, edit, "admin-1", "2026-01-02T00:00:00Z").unwrap();
        assert_eq!(r.status, InterviewStatus::Assigned);
        assert_eq!(r.assigned_by.as_deref(), Some("admin-1"));
        assert_eq!(r.assigned_at.as_deref(), Some("2026-01-02T00:00:00Z"));
    }

    #[test]
    fn test_admin_cannot_skip_workflow() {
        let mut r = pending();
        let edit = AdminUpdateRequest {
            status: Some(InterviewStatus::Completed),
            ..update()
        };
        assert!(apply_admin_update(&mut r, edit, "admin-1", "now").is_err());
        assert_eq!(r.status, InterviewStatus::Pending);

        let assign_nobody = AdminUpdateRequest {
            status: Some(InterviewStatus::Assigned),
            ..update()
        };
        assert!(apply_admin_update(&mut r, assign_nobody, "admin-1", "now").is_err());
    }

    #[test]
    fn test_admin_can_cancel_and_schedule() {
        let mut r = pending();
        r.status = InterviewStatus::Assigned;
        r.interviewer_id = Some("iv-1".into());
        let edit = AdminUpdateRequest {
            status: Some(InterviewStatus::Scheduled),
            scheduled_at: Some("2026-01-10T09:00:00Z".into()),
            ..update()
        };
        apply_admin_update(&mut r, edit, "admin-1", "now").unwrap();
        assert_eq!(r.status, InterviewStatus::Scheduled);
        assert_eq!(r.scheduled_at.as_deref(), Some("2026-01-10T09:00:00Z"));

        let cancel = AdminUpdateRequest {
            status: Some(InterviewStatus::Cancelled),
            ..update()
        };
        apply_admin_update(&mut r, cancel, "admin-1", "now").unwrap();
        assert_eq!(r.status, InterviewStatus::Cancelled);
    }
}
