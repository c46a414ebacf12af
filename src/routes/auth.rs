// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Passwordless authentication routes: registration, magic links and
//! session tokens.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{new_id, Doc};
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::{
    LoginHistory, LoginStatus, PublicUser, Role, TransactionCategory, TransactionType, User,
    UserSession,
};
use crate::routes::MessageResponse;
use crate::services::acl::{self, Permissions};
use crate::services::ledger::{self, Memo, Movement};
use crate::services::{device, magic_link};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};
use crate::AppState;

/// Routes reachable without a token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/magic-link", post(request_magic_link))
        .route("/api/auth/forgot-password", post(request_magic_link))
        .route("/api/auth/verify", get(verify))
}

/// Routes for signed-in users.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/permissions", get(permissions))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Create an account and grant the role's signup bonus.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    body.validate()?;
    if body.role == Role::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    let email = body.email.trim().to_lowercase();
    let phone = body
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if let Some(phone) = phone.as_deref() {
        if state.db.find_user_by_phone(phone).await?.is_some() {
            return Err(AppError::Conflict(
                "Phone number already registered".to_string(),
            ));
        }
    }

    let settings = state.db.get_settings().await?;
    let now = now_rfc3339();
    let mut user = User::new(new_id(), email, phone, body.role, &now);

    let bonus = settings.signup_bonus(body.role);
    if bonus > 0 {
        let memo = Memo::new(
            TransactionType::Bonus,
            TransactionCategory::SignupBonus,
            format!("Welcome bonus for new {}", body.role),
        );
        let entry = ledger::post(&mut user, Movement::Credit(bonus), memo, new_id(), &now)?;
        state
            .db
            .commit(&[Doc::User(&user), Doc::Transaction(&entry)])
            .await?;
    } else {
        state.db.upsert_user(&user).await?;
    }

    tracing::info!(user_id = %user.id, role = %user.role, bonus, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Request a magic link to sign in.".to_string(),
            user: user.into(),
        }),
    ))
}

// ─── Magic Links ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct MagicLinkRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// E-mail a single-use login link. Issuing a link invalidates any earlier
/// one for the same account.
async fn request_magic_link(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MagicLinkRequest>,
) -> Result<Json<MessageResponse>> {
    body.validate()?;
    let email = body.email.trim().to_lowercase();

    state
        .magic_link_throttle
        .try_acquire(&email)
        .map_err(|wait| {
            AppError::RateLimited(format!(
                "Please wait {} seconds before requesting another link",
                wait.as_secs().max(1)
            ))
        })?;

    match send_magic_link(&state, &email).await {
        Ok(()) => Ok(MessageResponse::new("Magic link sent to your email")),
        Err(e) => {
            // A failed attempt should not lock the user out.
            state.magic_link_throttle.release(&email);
            Err(e)
        }
    }
}

async fn send_magic_link(state: &AppState, email: &str) -> Result<()> {
    let mut user = state
        .db
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account found for this email".to_string()))?;
    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    let issued = magic_link::issue()?;
    let now = now_rfc3339();
    user.magic_link_hash = Some(issued.hash);
    user.magic_link_created_at = Some(now.clone());
    user.updated_at = now;
    state.db.upsert_user(&user).await?;

    let link = magic_link::verify_url(&state.config.frontend_url, &issued.token);
    state.email.send_magic_link(&user.email, &link).await?;

    tracing::info!(user_id = %user.id, "Magic link issued");
    Ok(())
}

#[derive(Deserialize)]
pub struct VerifyParams {
    token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub session_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub expires_in: i64,
    pub user: PublicUser,
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let local = state.config.frontend_url.starts_with("http://localhost")
        || state.config.frontend_url.starts_with("http://127.0.0.1");
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(!local)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(state.config.jwt_ttl_days))
        .build()
}

/// Exchange a magic-link token for a session JWT.
async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(params): Query<VerifyParams>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let token = params.token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("Missing token".to_string()));
    }

    let user = state
        .db
        .consume_magic_link(&magic_link::hash_token(token))
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or already used magic link".to_string()))?;
    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    let session_id = new_id();
    let issued = create_jwt(
        &user.id,
        &user.email,
        user.role,
        &session_id,
        state.config.jwt_ttl_days,
        &state.config.jwt_signing_key,
    )?;

    let now = chrono::Utc::now();
    let login_at = format_utc_rfc3339(now);
    let device = device::from_headers(&headers);
    let session = UserSession {
        id: session_id.clone(),
        user_id: user.id.clone(),
        device: device.clone(),
        is_active: true,
        created_at: login_at.clone(),
        last_activity: login_at.clone(),
        expires_at: format_utc_rfc3339(now + chrono::Duration::seconds(issued.expires_in)),
        logged_out_at: None,
    };
    let history = LoginHistory {
        id: session_id.clone(),
        user_id: user.id.clone(),
        email: user.email.clone(),
        session_id: session_id.clone(),
        device,
        status: LoginStatus::Success,
        login_at,
        logout_at: None,
        session_duration_secs: None,
    };
    state.db.record_login(&session, &history).await?;

    tracing::info!(user_id = %user.id, session_id = %session_id, "User signed in");

    let jar = jar.add(session_cookie(&state, issued.token.clone()));
    Ok((
        jar,
        Json(AuthResponse {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            session_id,
            expires_in: issued.expires_in,
            user: user.into(),
        }),
    ))
}

// ─── Signed-in User ──────────────────────────────────────────

async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PublicUser>> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", &auth.user_id))?;
    Ok(Json(user.into()))
}

/// End the current session and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>)> {
    crate::routes::sessions::end_session(&state, &auth.session_id, LoginStatus::LoggedOut).await?;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, MessageResponse::new("Logged out successfully")))
}

#[derive(Serialize)]
pub struct PermissionsResponse {
    pub role: Role,
    pub permissions: Permissions,
}

/// Effective permission matrix for the caller's role.
async fn permissions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PermissionsResponse>> {
    let overrides = state.db.list_acl_overrides().await?;
    Ok(Json(PermissionsResponse {
        role: auth.role,
        permissions: acl::effective_permissions(auth.role, &overrides),
    }))
}
