//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{audit, parse_date, parse_id, parse_int, read_json};
use crate::{AppError, AppState, CurrentUser};
use pluto_core::db::{TransactionQuery, DEFAULT_LIMIT};
use pluto_core::models::{NewTransaction, Transaction};

/// Category stored when a new transaction omits one
pub const DEFAULT_CATEGORY: &str = "Other";

/// Request body for creating a transaction
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: i64,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Query parameters for listing transactions
///
/// Kept as strings so malformed values produce a JSON 400.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub account_id: Option<String>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// GET /transactions - List the caller's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let account_id = parse_id(params.account_id.as_deref(), "account_id")?;
    let from = parse_date(params.from.as_deref(), "from")?;
    let to = parse_date(params.to.as_deref(), "to")?;
    let limit = parse_int(params.limit.as_deref(), "limit", DEFAULT_LIMIT)?;
    let offset = parse_int(params.offset.as_deref(), "offset", 0)?;
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let query = TransactionQuery::new()
        .account_id(account_id)
        .category(category)
        .date_range(from, to)
        .limit(limit)
        .offset(offset);

    let transactions = state
        .db
        .list_transactions(user.id, &query)
        .map_err(AppError::from_core)?;

    audit(
        &state,
        user.id,
        "list",
        "transaction",
        None,
        Some(&format!(
            "count={}, limit={}, offset={}",
            transactions.len(),
            query.limit,
            query.offset
        )),
    );

    Ok(Json(transactions))
}

/// POST /transactions - Record a transaction and update the account balance
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let req: CreateTransactionRequest = read_json(request).await?;

    let category = req
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let tx = state
        .db
        .insert_transaction(
            user.id,
            req.account_id,
            &NewTransaction {
                date: req.date,
                amount: req.amount,
                category: Some(category),
                description: req.description,
            },
        )
        .map_err(AppError::from_core)?;

    audit(
        &state,
        user.id,
        "create",
        "transaction",
        Some(tx.id),
        Some(&format!("account_id={}", tx.account_id)),
    );

    Ok((StatusCode::CREATED, Json(tx)))
}
