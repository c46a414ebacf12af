// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel routes: banners, injected code, user management, credit
//! donations and permission overrides.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

use crate::db::{new_id, Doc};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    AclOverride, BannerType, CodeType, CreditDonation, CustomCode, EmployerProfile,
    InterviewerProfile, JobSeekerProfile, NotificationBanner, PublicUser, Role,
    TransactionCategory, TransactionType,
};
use crate::pagination::{paginate, Page, PageParams};
use crate::routes::credits::BalanceResponse;
use crate::routes::MessageResponse;
use crate::services::acl::{self, Permissions};
use crate::services::ledger::{Memo, Movement};
use crate::services::notifications;
use crate::time_utils::{format_utc_rfc3339, now_rfc3339, parse_timestamp};
use crate::AppState;

const USERS_PAGE_SIZE: u32 = 50;
const DONATION_BANNER_PRIORITY: i32 = 10;
const DONATION_BANNER_COLOR: &str = "#10b981";

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/notifications/public", get(public_banners))
        .route("/api/admin/custom-code/active", get(active_custom_code))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/admin/notifications",
            get(list_banners).post(create_banner),
        )
        .route("/api/admin/notifications/user", get(user_banners))
        .route(
            "/api/admin/notifications/{banner_id}",
            put(update_banner).delete(delete_banner),
        )
        .route(
            "/api/admin/custom-code",
            get(list_custom_code).post(create_custom_code),
        )
        .route(
            "/api/admin/custom-code/{code_id}",
            put(update_custom_code).delete(delete_custom_code),
        )
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{user_id}", get(user_detail))
        .route("/api/admin/users/{user_id}/status", put(set_user_status))
        .route(
            "/api/admin/users/{user_id}/donate-credits",
            axum::routing::post(donate_credits),
        )
        .route("/api/admin/users/{user_id}/donations", get(user_donations))
        .route("/api/admin/donations/all", get(all_donations))
        .route(
            "/api/admin/acl/permissions",
            get(all_permissions).put(set_permission),
        )
        .route(
            "/api/admin/acl/permissions/{override_id}",
            axum::routing::delete(delete_permission),
        )
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Normalize a client date to storage format. A bare end date covers the
/// whole day.
fn normalize_date(raw: Option<String>, field: &str, end_of_day: bool) -> Result<Option<String>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            let at = parse_timestamp(s)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid {}: {}", field, s)))?;
            let at = if end_of_day && s.len() == 10 {
                at + chrono::Duration::days(1) - chrono::Duration::seconds(1)
            } else {
                at
            };
            Ok(Some(format_utc_rfc3339(at)))
        }
    }
}

// ─── Notification Banners ────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
pub struct BannerInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub message: Option<String>,
    pub banner_type: Option<BannerType>,
    pub target_user_id: Option<String>,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
    #[validate(length(max = 32))]
    pub bg_color: Option<String>,
    #[validate(length(max = 32))]
    pub text_color: Option<String>,
    #[validate(length(max = 64))]
    pub icon: Option<String>,
    #[validate(url)]
    pub link_url: Option<String>,
    #[validate(length(max = 100))]
    pub link_text: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl BannerInput {
    fn apply(self, banner: &mut NotificationBanner) -> Result<()> {
        let start_date = normalize_date(self.start_date, "start_date", false)?;
        let end_date = normalize_date(self.end_date, "end_date", true)?;
        merge(&mut banner.title, self.title);
        merge(&mut banner.message, self.message);
        merge(&mut banner.banner_type, self.banner_type);
        merge(&mut banner.is_active, self.is_active);
        merge(&mut banner.priority, self.priority);
        for (slot, value) in [
            (&mut banner.target_user_id, self.target_user_id),
            (&mut banner.bg_color, self.bg_color),
            (&mut banner.text_color, self.text_color),
            (&mut banner.icon, self.icon),
            (&mut banner.link_url, self.link_url),
            (&mut banner.link_text, self.link_text),
            (&mut banner.start_date, start_date),
            (&mut banner.end_date, end_date),
        ] {
            if value.is_some() {
                *slot = value;
            }
        }
        if let (Some(start), Some(end)) = (&banner.start_date, &banner.end_date) {
            if end < start {
                return Err(AppError::BadRequest(
                    "end_date must not precede start_date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

async fn public_banners(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<NotificationBanner>>> {
    let now = now_rfc3339();
    let visible = state
        .db
        .list_active_banners()
        .await?
        .into_iter()
        .filter(|b| notifications::visible_to_public(b, &now))
        .collect();
    Ok(Json(notifications::select(visible)))
}

async fn user_banners(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<NotificationBanner>>> {
    let now = now_rfc3339();
    let visible = state
        .db
        .list_active_banners()
        .await?
        .into_iter()
        .filter(|b| notifications::visible_to_user(b, &auth.user_id, auth.role, &now))
        .collect();
    Ok(Json(notifications::select(visible)))
}

async fn list_banners(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<NotificationBanner>>> {
    auth.require_admin()?;
    Ok(Json(state.db.list_banners().await?))
}

async fn create_banner(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<BannerInput>,
) -> Result<(StatusCode, Json<NotificationBanner>)> {
    auth.require_admin()?;
    body.validate()?;
    let (Some(title), Some(message), Some(banner_type)) =
        (body.title.clone(), body.message.clone(), body.banner_type)
    else {
        return Err(AppError::BadRequest(
            "title, message and banner_type are required".to_string(),
        ));
    };

    let now = now_rfc3339();
    let mut banner = NotificationBanner {
        id: new_id(),
        title,
        message,
        banner_type,
        target_user_id: None,
        is_active: true,
        priority: 0,
        bg_color: None,
        text_color: None,
        icon: None,
        link_url: None,
        link_text: None,
        start_date: None,
        end_date: None,
        created_by: auth.user_id.clone(),
        created_at: now.clone(),
        updated_at: now,
    };
    body.apply(&mut banner)?;
    state.db.put_banner(&banner).await?;

    tracing::info!(banner_id = %banner.id, admin = %auth.user_id, "Banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

async fn update_banner(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(banner_id): Path<String>,
    Json(body): Json<BannerInput>,
) -> Result<Json<NotificationBanner>> {
    auth.require_admin()?;
    body.validate()?;

    let mut banner = state
        .db
        .get_banner(&banner_id)
        .await?
        .ok_or_else(|| AppError::not_found("Notification", &banner_id))?;
    body.apply(&mut banner)?;
    banner.updated_at = now_rfc3339();
    state.db.put_banner(&banner).await?;
    Ok(Json(banner))
}

async fn delete_banner(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(banner_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    auth.require_admin()?;
    if state.db.get_banner(&banner_id).await?.is_none() {
        return Err(AppError::not_found("Notification", &banner_id));
    }
    state.db.delete_banner(&banner_id).await?;
    tracing::info!(banner_id = %banner_id, admin = %auth.user_id, "Banner deleted");
    Ok(MessageResponse::new("Notification deleted"))
}

// ─── Custom Code ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CustomCodeInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub code_type: Option<CodeType>,
    #[validate(length(max = 100_000))]
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ActiveCode {
    pub css: String,
    pub js: String,
}

/// Concatenate active snippets by type, in stored order.
fn combine_active(codes: &[CustomCode]) -> ActiveCode {
    let join = |kind: CodeType| {
        codes
            .iter()
            .filter(|c| c.is_active && c.code_type == kind)
            .map(|c| c.code.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };
    ActiveCode {
        css: join(CodeType::Css),
        js: join(CodeType::Js),
    }
}

async fn active_custom_code(State(state): State<Arc<AppState>>) -> Result<Json<ActiveCode>> {
    let codes = state.db.list_custom_code().await?;
    Ok(Json(combine_active(&codes)))
}

async fn list_custom_code(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<CustomCode>>> {
    auth.require_admin()?;
    Ok(Json(state.db.list_custom_code().await?))
}

async fn create_custom_code(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CustomCodeInput>,
) -> Result<(StatusCode, Json<CustomCode>)> {
    auth.require_admin()?;
    body.validate()?;
    let (Some(name), Some(code_type), Some(code)) = (body.name, body.code_type, body.code) else {
        return Err(AppError::BadRequest(
            "name, code_type and code are required".to_string(),
        ));
    };

    let now = now_rfc3339();
    let snippet = CustomCode {
        id: new_id(),
        name,
        code_type,
        code,
        is_active: body.is_active.unwrap_or(true),
        created_by: auth.user_id.clone(),
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.put_custom_code(&snippet).await?;
    tracing::info!(code_id = %snippet.id, admin = %auth.user_id, "Custom code created");
    Ok((StatusCode::CREATED, Json(snippet)))
}

async fn update_custom_code(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(code_id): Path<String>,
    Json(body): Json<CustomCodeInput>,
) -> Result<Json<CustomCode>> {
    auth.require_admin()?;
    body.validate()?;

    let mut snippet = state
        .db
        .get_custom_code(&code_id)
        .await?
        .ok_or_else(|| AppError::not_found("Custom code", &code_id))?;
    merge(&mut snippet.name, body.name);
    merge(&mut snippet.code_type, body.code_type);
    merge(&mut snippet.code, body.code);
    merge(&mut snippet.is_active, body.is_active);
    snippet.updated_at = now_rfc3339();
    state.db.put_custom_code(&snippet).await?;
    Ok(Json(snippet))
}

async fn delete_custom_code(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(code_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    auth.require_admin()?;
    if state.db.get_custom_code(&code_id).await?.is_none() {
        return Err(AppError::not_found("Custom code", &code_id));
    }
    state.db.delete_custom_code(&code_id).await?;
    Ok(MessageResponse::new("Custom code deleted"))
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub search: Option<String>,
}

impl UserFilter {
    fn matches(&self, user: &PublicUser) -> bool {
        if self.role.is_some_and(|r| r != user.role) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                user.email.contains(&term)
                    || user.phone.as_deref().is_some_and(|p| p.contains(&term))
            }
        }
    }
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<UserFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<PublicUser>>> {
    auth.require_admin()?;
    let users: Vec<PublicUser> = state
        .db
        .list_users()
        .await?
        .into_iter()
        .map(PublicUser::from)
        .filter(|u| filter.matches(u))
        .collect();
    Ok(Json(paginate(users, page, USERS_PAGE_SIZE)?))
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum RoleProfile {
    JobSeeker(Box<JobSeekerProfile>),
    Employer(Box<EmployerProfile>),
    Interviewer(Box<InterviewerProfile>),
}

#[derive(Serialize)]
pub struct UserDetail {
    pub user: PublicUser,
    pub profile: Option<RoleProfile>,
}

async fn user_detail(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<UserDetail>> {
    auth.require_admin()?;
    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", &user_id))?;

    let profile = match user.role {
        Role::JobSeeker => state
            .db
            .get_jobseeker_profile(&user.id)
            .await?
            .map(|p| RoleProfile::JobSeeker(Box::new(p))),
        Role::Employer => state
            .db
            .get_employer_profile(&user.id)
            .await?
            .map(|p| RoleProfile::Employer(Box::new(p))),
        Role::Interviewer => state
            .db
            .get_interviewer_profile(&user.id)
            .await?
            .map(|p| RoleProfile::Interviewer(Box::new(p))),
        Role::Admin => None,
    };
    Ok(Json(UserDetail {
        user: user.into(),
        profile,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub is_active: bool,
}

async fn set_user_status(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<PublicUser>> {
    auth.require_admin()?;
    if user_id == auth.user_id && !body.is_active {
        return Err(AppError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let mut user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", &user_id))?;
    user.is_active = body.is_active;
    user.updated_at = now_rfc3339();
    state.db.upsert_user(&user).await?;

    tracing::info!(
        user_id = %user.id,
        is_active = user.is_active,
        admin = %auth.user_id,
        "User status changed"
    );
    Ok(Json(user.into()))
}

// ─── Donations ───────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct DonateRequest {
    #[validate(range(min = 1, max = 1_000_000_000, message = "Amount out of range"))]
    pub amount: i64,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    #[serde(default = "default_true")]
    pub send_notification: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
pub struct DonateResponse {
    pub message: String,
    pub donation: CreditDonation,
    pub new_balance: BalanceResponse,
}

fn donation_banner(
    user_id: &str,
    amount: i64,
    reason: Option<&str>,
    admin_id: &str,
    now: &str,
) -> NotificationBanner {
    let message = match reason {
        Some(r) => format!("You received {} free credits: {}", amount, r),
        None => format!("You received {} free credits.", amount),
    };
    NotificationBanner {
        id: new_id(),
        title: "Credits received".to_string(),
        message,
        banner_type: BannerType::Public,
        target_user_id: Some(user_id.to_string()),
        is_active: true,
        priority: DONATION_BANNER_PRIORITY,
        bg_color: Some(DONATION_BANNER_COLOR.to_string()),
        text_color: Some("#ffffff".to_string()),
        icon: Some("gift".to_string()),
        link_url: None,
        link_text: None,
        start_date: None,
        end_date: None,
        created_by: admin_id.to_string(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}

async fn donate_credits(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<DonateRequest>,
) -> Result<(StatusCode, Json<DonateResponse>)> {
    auth.require_admin()?;
    body.validate()?;

    let now = now_rfc3339();
    let reason = body
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let banner = body
        .send_notification
        .then(|| donation_banner(&user_id, body.amount, reason.as_deref(), &auth.user_id, &now));

    let transaction_id = new_id();
    let donation = CreditDonation {
        id: new_id(),
        user_id: user_id.clone(),
        amount: body.amount,
        reason: reason.clone(),
        donated_by: auth.user_id.clone(),
        notification_id: banner.as_ref().map(|b| b.id.clone()),
        transaction_id: transaction_id.clone(),
        created_at: now,
    };

    let mut docs = vec![Doc::Donation(&donation)];
    if let Some(b) = banner.as_ref() {
        docs.push(Doc::Banner(b));
    }
    let memo = Memo::new(
        TransactionType::Bonus,
        TransactionCategory::AdminAdjustment,
        reason.unwrap_or_else(|| "Credits donated by admin".to_string()),
    )
    .reference(donation.id.clone(), "donation")
    .by(auth.user_id.clone());
    let (user, _) = state
        .db
        .apply_credit_change(
            &user_id,
            Movement::Credit(body.amount),
            memo,
            transaction_id,
            &docs,
        )
        .await?;

    tracing::info!(
        user_id = %user_id,
        amount = body.amount,
        admin = %auth.user_id,
        notified = donation.notification_id.is_some(),
        "Credits donated"
    );
    Ok((
        StatusCode::CREATED,
        Json(DonateResponse {
            message: format!("Donated {} credits", body.amount),
            donation,
            new_balance: BalanceResponse::from(&user),
        }),
    ))
}

async fn user_donations(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CreditDonation>>> {
    auth.require_admin()?;
    Ok(Json(state.db.list_donations(Some(&user_id)).await?))
}

async fn all_donations(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<CreditDonation>>> {
    auth.require_admin()?;
    Ok(Json(state.db.list_donations(None).await?))
}

// ─── ACL ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AclMatrix {
    pub resources: Vec<&'static str>,
    pub actions: Vec<&'static str>,
    pub permissions: BTreeMap<Role, Permissions>,
    pub overrides: Vec<AclOverride>,
}

fn build_matrix(overrides: Vec<AclOverride>) -> AclMatrix {
    let permissions = Role::ALL
        .into_iter()
        .map(|role| (role, acl::effective_permissions(role, &overrides)))
        .collect();
    AclMatrix {
        resources: acl::RESOURCES.to_vec(),
        actions: acl::ACTIONS.to_vec(),
        permissions,
        overrides,
    }
}

async fn all_permissions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<AclMatrix>> {
    auth.require_admin()?;
    let overrides = state.db.list_acl_overrides().await?;
    Ok(Json(build_matrix(overrides)))
}

#[derive(Debug, Deserialize)]
pub struct SetPermissionRequest {
    pub role: Role,
    pub resource: String,
    pub action: String,
    pub allowed: bool,
}

async fn set_permission(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SetPermissionRequest>,
) -> Result<Json<AclOverride>> {
    auth.require_admin()?;
    if !acl::is_known(&body.resource, &body.action) {
        return Err(AppError::BadRequest(format!(
            "Unknown permission {}:{}",
            body.resource, body.action
        )));
    }

    let entry = AclOverride {
        id: AclOverride::doc_id(body.role, &body.resource, &body.action),
        role: body.role,
        resource: body.resource,
        action: body.action,
        allowed: body.allowed,
        updated_at: now_rfc3339(),
        updated_by: auth.user_id.clone(),
    };
    state.db.put_acl_override(&entry).await?;

    tracing::info!(
        override_id = %entry.id,
        allowed = entry.allowed,
        admin = %auth.user_id,
        "Permission override set"
    );
    Ok(Json(entry))
}

async fn delete_permission(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(override_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    auth.require_admin()?;
    if state.db.get_acl_override(&override_id).await?.is_none() {
        return Err(AppError::not_found("Permission override", &override_id));
    }
    state.db.delete_acl_override(&override_id).await?;
    Ok(MessageResponse::new("Permission override removed"))
}
