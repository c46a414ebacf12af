// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paid contact reveal routes.
//!
//! An employer spends credits to see a job seeker's e-mail, phone and
//! current company for a limited time.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::{new_id, Doc};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ContactAccess, Role, TransactionCategory, TransactionType};
use crate::routes::credits::BalanceResponse;
use crate::services::ledger::{Memo, Movement};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/contacts/reveal", post(reveal))
        .route("/api/contacts/access/{jobseeker_id}", get(check_access))
        .route("/api/contacts/my-access", get(my_access))
        .route("/api/contacts/admin/all-access", get(all_access))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RevealRequest {
    #[validate(length(min = 1))]
    pub jobseeker_id: String,
}

#[derive(Serialize)]
pub struct RevealResponse {
    pub message: String,
    pub access: ContactAccess,
    /// Absent when an existing grant was returned without charge
    pub remaining_credits: Option<BalanceResponse>,
}

/// Mark an expired grant inactive. Returns the grant if still valid.
async fn current_access(
    state: &AppState,
    employer_id: &str,
    jobseeker_id: &str,
    now: &str,
) -> Result<Option<ContactAccess>> {
    let Some(mut access) = state.db.get_contact_access(employer_id, jobseeker_id).await? else {
        return Ok(None);
    };
    if access.is_valid_at(now) {
        return Ok(Some(access));
    }
    if access.is_active {
        access.is_active = false;
        state.db.put_contact_access(&access).await?;
        tracing::info!(access_id = %access.id, "Contact access expired");
    }
    Ok(None)
}

/// When a grant made at `now` lapses.
fn access_expiry(
    now: chrono::DateTime<chrono::Utc>,
    days: i64,
) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::Duration::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Contact access duration of {} days is out of range",
                days
            ))
        })
}

async fn reveal(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<RevealRequest>,
) -> Result<Json<RevealResponse>> {
    auth.require_role(&[Role::Employer])?;
    body.validate()?;

    // At most one charge per employer/job seeker pair in flight.
    let access_id = ContactAccess::doc_id(&auth.user_id, &body.jobseeker_id);
    let lock = state.db.lock_for(format!("contact:{}", access_id));
    let _guard = lock.lock().await;

    let now = chrono::Utc::now();
    let now_str = format_utc_rfc3339(now);
    if let Some(access) = current_access(&state, &auth.user_id, &body.jobseeker_id, &now_str).await? {
        return Ok(Json(RevealResponse {
            message: "You already have access to this contact".to_string(),
            access,
            remaining_credits: None,
        }));
    }

    let jobseeker = state
        .db
        .get_user(&body.jobseeker_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job seeker not found".to_string()))?;
    if jobseeker.role != Role::JobSeeker {
        return Err(AppError::BadRequest(
            "Target user is not a job seeker".to_string(),
        ));
    }
    let current_company = state
        .db
        .get_jobseeker_profile(&jobseeker.id)
        .await?
        .and_then(|p| {
            p.current_company
                .or_else(|| p.experience.first().map(|e| e.company.clone()))
        });

    let settings = state.db.get_settings().await?;
    let access = ContactAccess {
        id: access_id,
        employer_id: auth.user_id.clone(),
        jobseeker_id: jobseeker.id.clone(),
        credits_spent: settings.contact_reveal_cost,
        access_granted_at: now_str,
        access_expires_at: format_utc_rfc3339(access_expiry(
            now,
            settings.contact_access_duration_days,
        )?),
        is_active: true,
        revealed_email: jobseeker.email.clone(),
        revealed_phone: jobseeker.phone.clone(),
        revealed_current_company: current_company,
    };

    let employer = if settings.contact_reveal_cost > 0 {
        let memo = Memo::new(
            TransactionType::Spend,
            TransactionCategory::ContactReveal,
            format!("Revealed contact for job seeker {}", jobseeker.email),
        )
        .reference(access.id.clone(), "contact_access");
        let (employer, _) = state
            .db
            .apply_credit_change(
                &auth.user_id,
                Movement::Debit(settings.contact_reveal_cost),
                memo,
                new_id(),
                &[Doc::ContactAccess(&access)],
            )
            .await?;
        employer
    } else {
        state.db.put_contact_access(&access).await?;
        state
            .db
            .get_user(&auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", &auth.user_id))?
    };

    tracing::info!(
        employer_id = %auth.user_id,
        jobseeker_id = %jobseeker.id,
        cost = settings.contact_reveal_cost,
        "Contact revealed"
    );
    Ok(Json(RevealResponse {
        message: "Contact revealed successfully".to_string(),
        access,
        remaining_credits: Some(BalanceResponse::from(&employer)),
    }))
}

#[derive(Serialize)]
pub struct AccessStatus {
    pub has_access: bool,
    pub access: Option<ContactAccess>,
}

async fn check_access(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(jobseeker_id): Path<String>,
) -> Result<Json<AccessStatus>> {
    auth.require_role(&[Role::Employer])?;

    let access = current_access(&state, &auth.user_id, &jobseeker_id, &now_rfc3339()).await?;
    Ok(Json(AccessStatus {
        has_access: access.is_some(),
        access,
    }))
}

/// The caller's unexpired grants, newest first.
async fn my_access(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ContactAccess>>> {
    auth.require_role(&[Role::Employer])?;

    let now = now_rfc3339();
    let grants = state
        .db
        .list_contact_access_by_employer(&auth.user_id)
        .await?
        .into_iter()
        .filter(|a| a.is_valid_at(&now))
        .collect();
    Ok(Json(grants))
}

async fn all_access(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ContactAccess>>> {
    auth.require_admin()?;
    Ok(Json(state.db.list_all_contact_access().await?))
}
