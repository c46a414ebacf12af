// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and login-history routes.
//!
//! Session records are an audit trail: tokens stay valid until they expire,
//! but a logged-out session no longer shows up as active.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{DeviceInfo, LoginHistory, LoginStatus, UserSession};
use crate::pagination::{paginate, Page, PageParams};
use crate::routes::MessageResponse;
use crate::services::device;
use crate::time_utils::{now_rfc3339, parse_timestamp};
use crate::AppState;

const HISTORY_PAGE_SIZE: u32 = 20;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions/active", get(active_sessions))
        .route("/api/sessions/logout", post(logout_session))
        .route("/api/sessions/logout-all", post(logout_all))
        .route("/api/sessions/login-history", get(login_history))
        .route("/api/sessions/device-info", get(device_info))
        .route("/api/sessions/admin/login-history", get(admin_login_history))
        .route("/api/sessions/admin/{user_id}", delete(force_logout))
}

/// Mark a session logged out and close its login-history entry.
///
/// Returns `false` if the session was unknown or already closed.
pub(crate) async fn end_session(
    state: &AppState,
    session_id: &str,
    status: LoginStatus,
) -> Result<bool> {
    let Some(mut session) = state.db.get_session(session_id).await? else {
        return Ok(false);
    };
    if !session.is_active {
        return Ok(false);
    }

    let now = now_rfc3339();
    session.is_active = false;
    session.logged_out_at = Some(now.clone());
    session.last_activity = now.clone();
    state.db.put_session(&session).await?;

    if let Some(mut entry) = state.db.get_login_history(session_id).await? {
        entry.status = status;
        entry.session_duration_secs = session_duration(&entry.login_at, &now);
        entry.logout_at = Some(now);
        state.db.put_login_history(&entry).await?;
    }

    tracing::info!(session_id, user_id = %session.user_id, ?status, "Session ended");
    Ok(true)
}

fn session_duration(login_at: &str, logout_at: &str) -> Option<i64> {
    let start = parse_timestamp(login_at)?;
    let end = parse_timestamp(logout_at)?;
    Some((end - start).num_seconds().max(0))
}

async fn end_all_sessions(
    state: &AppState,
    user_id: &str,
    keep: Option<&str>,
    status: LoginStatus,
) -> Result<usize> {
    let sessions = state.db.list_sessions_by_user(user_id).await?;
    let mut ended = 0;
    for session in sessions
        .iter()
        .filter(|s| s.is_active && Some(s.id.as_str()) != keep)
    {
        if end_session(state, &session.id, status).await? {
            ended += 1;
        }
    }
    Ok(ended)
}

// ─── Own Sessions ────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: UserSession,
    pub is_current: bool,
}

#[derive(Serialize)]
pub struct ActiveSessionsResponse {
    pub sessions: Vec<SessionView>,
    pub total: usize,
}

async fn active_sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ActiveSessionsResponse>> {
    let now = now_rfc3339();
    let sessions: Vec<SessionView> = state
        .db
        .list_sessions_by_user(&auth.user_id)
        .await?
        .into_iter()
        .filter(|s| s.is_active && s.expires_at > now)
        .map(|session| SessionView {
            is_current: session.id == auth.session_id,
            session,
        })
        .collect();

    Ok(Json(ActiveSessionsResponse {
        total: sessions.len(),
        sessions,
    }))
}

#[derive(Deserialize)]
pub struct LogoutSessionRequest {
    pub session_id: String,
}

async fn logout_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<LogoutSessionRequest>,
) -> Result<Json<MessageResponse>> {
    let session = state
        .db
        .get_session(&body.session_id)
        .await?
        .filter(|s| s.user_id == auth.user_id)
        .ok_or_else(|| AppError::not_found("Session", &body.session_id))?;

    end_session(&state, &session.id, LoginStatus::LoggedOut).await?;
    Ok(MessageResponse::new("Session logged out"))
}

#[derive(Serialize)]
pub struct LogoutAllResponse {
    pub message: String,
    pub sessions_ended: usize,
}

/// End every other session of the caller.
async fn logout_all(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<LogoutAllResponse>> {
    let ended = end_all_sessions(
        &state,
        &auth.user_id,
        Some(&auth.session_id),
        LoginStatus::LoggedOut,
    )
    .await?;
    Ok(Json(LogoutAllResponse {
        message: "Logged out from all other devices".to_string(),
        sessions_ended: ended,
    }))
}

async fn login_history(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<LoginHistory>>> {
    let entries = state.db.list_login_history(Some(&auth.user_id)).await?;
    Ok(Json(paginate(entries, params, HISTORY_PAGE_SIZE)?))
}

async fn device_info(headers: HeaderMap) -> Json<DeviceInfo> {
    Json(device::from_headers(&headers))
}

// ─── Admin ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AdminHistoryParams {
    pub user_id: Option<String>,
    pub status: Option<LoginStatus>,
    #[serde(default = "first_page")]
    pub page: u32,
    pub limit: Option<u32>,
}

fn first_page() -> u32 {
    1
}

async fn admin_login_history(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<AdminHistoryParams>,
) -> Result<Json<Page<LoginHistory>>> {
    auth.require_admin()?;

    let mut entries = state
        .db
        .list_login_history(params.user_id.as_deref())
        .await?;
    if let Some(status) = params.status {
        entries.retain(|e| e.status == status);
    }
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };
    Ok(Json(paginate(entries, page, HISTORY_PAGE_SIZE)?))
}

/// Close every active session of a user.
async fn force_logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<LogoutAllResponse>> {
    auth.require_admin()?;

    let ended = end_all_sessions(&state, &user_id, None, LoginStatus::ForcedLogout).await?;
    tracing::warn!(admin = %auth.user_id, user_id = %user_id, ended, "Forced logout");
    Ok(Json(LogoutAllResponse {
        message: format!("Ended {} session(s)", ended),
        sessions_ended: ended,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_duration() {
        assert_eq!(
            session_duration("2026-03-01T10:00:00Z", "2026-03-01T11:30:05Z"),
            Some(5405)
        );
        assert_eq!(session_duration("garbage", "2026-03-01T11:30:05Z"), None);
    }
}
