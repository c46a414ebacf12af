// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credit balance, ledger history and platform pricing routes.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    CreditTransaction, PlatformSettings, PlatformSettingsUpdate, TransactionCategory,
    TransactionType, User,
};
use crate::pagination::{paginate, PageParams};
use crate::services::ledger::{Memo, Movement};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339, parse_timestamp};
use crate::AppState;

const TRANSACTIONS_PAGE_SIZE: u32 = 50;

const CSV_HEADER: [&str; 9] = [
    "Date",
    "Transaction Type",
    "Category",
    "Amount",
    "Description",
    "Free Balance",
    "Paid Balance",
    "Total Balance",
    "Reference ID",
];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/credits/settings", get(get_settings).put(update_settings))
        .route("/api/credits/balance", get(balance))
        .route("/api/credits/admin/add-credits", post(admin_add_credits))
        .route("/api/credits/admin/deduct-credits", post(admin_deduct_credits))
        .route("/api/credits/transactions", get(transactions))
        .route("/api/credits/transactions/export", get(export_transactions))
        .route("/api/credits/admin/transactions", get(admin_transactions))
}

// ─── Settings ────────────────────────────────────────────────

async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PlatformSettings>> {
    auth.require_admin()?;
    Ok(Json(state.db.get_settings().await?))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<PlatformSettingsUpdate>,
) -> Result<Json<PlatformSettings>> {
    auth.require_admin()?;
    body.validate()?;

    let mut settings = state.db.get_settings().await?;
    settings.apply(body);
    settings.updated_at = now_rfc3339();
    settings.updated_by = Some(auth.user_id.clone());
    state.db.put_settings(&settings).await?;

    tracing::info!(admin = %auth.user_id, "Platform settings updated");
    Ok(Json(settings))
}

// ─── Balance ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub credits_free: i64,
    pub credits_paid: i64,
    pub total_credits: i64,
}

impl From<&User> for BalanceResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            credits_free: user.credits_free,
            credits_paid: user.credits_paid,
            total_credits: user.total_credits(),
        }
    }
}

async fn balance(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<BalanceResponse>> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", &auth.user_id))?;
    Ok(Json(BalanceResponse::from(&user)))
}

// ─── Admin Adjustments ───────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustCreditsRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(range(min = 1, max = 1_000_000_000, message = "Amount out of range"))]
    pub amount: i64,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
}

#[derive(Serialize)]
pub struct AdjustCreditsResponse {
    pub message: String,
    pub user_id: String,
    pub amount: i64,
    pub new_balance: BalanceResponse,
    pub transaction: CreditTransaction,
}

async fn adjust(
    state: &AppState,
    auth: &AuthUser,
    body: AdjustCreditsRequest,
    movement: Movement,
    transaction_type: TransactionType,
) -> Result<(User, CreditTransaction)> {
    let memo = Memo::new(
        transaction_type,
        TransactionCategory::AdminAdjustment,
        body.description,
    )
    .by(auth.user_id.clone());
    let result = state
        .db
        .apply_credit_change(&body.user_id, movement, memo, new_id(), &[])
        .await?;
    tracing::info!(
        admin = %auth.user_id,
        user_id = %body.user_id,
        ?movement,
        "Admin credit adjustment"
    );
    Ok(result)
}

async fn admin_add_credits(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<AdjustCreditsRequest>,
) -> Result<Json<AdjustCreditsResponse>> {
    auth.require_admin()?;
    body.validate()?;

    let amount = body.amount;
    let (user, transaction) = adjust(
        &state,
        &auth,
        body,
        Movement::Credit(amount),
        TransactionType::AdminAdd,
    )
    .await?;
    Ok(Json(AdjustCreditsResponse {
        message: "Credits added successfully".to_string(),
        user_id: user.id.clone(),
        amount,
        new_balance: BalanceResponse::from(&user),
        transaction,
    }))
}

async fn admin_deduct_credits(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<AdjustCreditsRequest>,
) -> Result<Json<AdjustCreditsResponse>> {
    auth.require_admin()?;
    body.validate()?;

    let amount = body.amount;
    let (user, transaction) = adjust(
        &state,
        &auth,
        body,
        Movement::Debit(amount),
        TransactionType::AdminDeduct,
    )
    .await?;
    Ok(Json(AdjustCreditsResponse {
        message: "Credits deducted successfully".to_string(),
        user_id: user.id.clone(),
        amount,
        new_balance: BalanceResponse::from(&user),
        transaction,
    }))
}

// ─── History ─────────────────────────────────────────────────

/// Ledger filters shared by the history, export and admin views.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub category: Option<TransactionCategory>,
    /// Inclusive lower bound (RFC3339 or `YYYY-MM-DD`)
    pub start_date: Option<String>,
    /// Inclusive upper bound; a bare date covers the whole day
    pub end_date: Option<String>,
}

/// Resolved date window, in storage format. `end` is exclusive.
#[derive(Debug, PartialEq)]
struct Window {
    start: Option<String>,
    end: Option<String>,
}

fn parse_bound(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(raw.trim())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid {}: {}", field, raw)))
}

impl TransactionFilter {
    fn window(&self) -> Result<Window> {
        let start = self
            .start_date
            .as_deref()
            .map(|raw| parse_bound(raw, "start_date"))
            .transpose()?;
        let end = self
            .end_date
            .as_deref()
            .map(|raw| {
                let at = parse_bound(raw, "end_date")?;
                // Bare dates mean "through the end of that day".
                Ok::<_, AppError>(if raw.trim().len() == 10 {
                    at + chrono::Duration::days(1)
                } else {
                    at + chrono::Duration::seconds(1)
                })
            })
            .transpose()?;
        Ok(Window {
            start: start.map(format_utc_rfc3339),
            end: end.map(format_utc_rfc3339),
        })
    }

    /// Validate the filter and narrow `entries` (already newest first).
    fn apply(&self, entries: Vec<CreditTransaction>) -> Result<Vec<CreditTransaction>> {
        let window = self.window()?;
        Ok(entries
            .into_iter()
            .filter(|t| self.transaction_type.is_none_or(|k| t.transaction_type == k))
            .filter(|t| self.category.is_none_or(|c| t.category == c))
            .filter(|t| window.start.as_deref().is_none_or(|s| t.created_at.as_str() >= s))
            .filter(|t| window.end.as_deref().is_none_or(|e| t.created_at.as_str() < e))
            .collect())
    }
}

#[derive(Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<CreditTransaction>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

fn page_of(entries: Vec<CreditTransaction>, params: PageParams) -> Result<TransactionsResponse> {
    let page = paginate(entries, params, TRANSACTIONS_PAGE_SIZE)?;
    Ok(TransactionsResponse {
        transactions: page.items,
        total: page.total,
        page: page.page,
        limit: page.limit,
        pages: page.pages,
    })
}

async fn transactions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<TransactionFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<TransactionsResponse>> {
    filter.window()?;
    let entries = state.db.list_transactions(Some(&auth.user_id)).await?;
    Ok(Json(page_of(filter.apply(entries)?, page)?))
}

/// Render ledger entries as CSV.
fn to_csv(entries: &[CreditTransaction]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| AppError::Internal(e.into()))?;
    for t in entries {
        let date = parse_timestamp(&t.created_at)
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| t.created_at.clone());
        writer
            .write_record([
                date,
                t.transaction_type.as_str().to_string(),
                t.category.as_str().to_string(),
                t.amount.to_string(),
                t.description.clone(),
                t.balance_free.to_string(),
                t.balance_paid.to_string(),
                (t.balance_free + t.balance_paid).to_string(),
                t.reference_id.clone().unwrap_or_default(),
            ])
            .map_err(|e| AppError::Internal(e.into()))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV flush failed: {}", e)))
}

async fn export_transactions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Response> {
    filter.window()?;
    let entries = filter.apply(state.db.list_transactions(Some(&auth.user_id)).await?)?;
    let body = to_csv(&entries)?;

    let filename = format!(
        "attachment; filename=transactions_{}.csv",
        Utc::now().format("%Y%m%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        body,
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct AdminTransactionParams {
    pub user_id: Option<String>,
}

async fn admin_transactions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<AdminTransactionParams>,
    Query(filter): Query<TransactionFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<TransactionsResponse>> {
    auth.require_admin()?;
    filter.window()?;

    let entries = state
        .db
        .list_transactions(params.user_id.as_deref())
        .await?;
    Ok(Json(page_of(filter.apply(entries)?, page)?))
}
