//! Plaid-shaped transaction views of linked accounts

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::{audit, parse_date, parse_int};
use crate::{AppError, AppState, CurrentUser};
use pluto_core::synth::{PlaidTransactionsRequest, PlaidTransactionsResponse, DEFAULT_PLAID_LIMIT};

/// Query parameters for `GET /fake/plaid/transactions`
#[derive(Debug, Default, Deserialize)]
pub struct FakePlaidParams {
    /// Account mask
    pub account_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Query parameters for `POST /accounts/plaid/transactions/get`
#[derive(Debug, Default, Deserialize)]
pub struct PlaidGetParams {
    /// Account mask
    pub account_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub count: Option<String>,
    pub offset: Option<String>,
}

fn build_request(
    account_id: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    limit: Option<&str>,
    offset: Option<&str>,
) -> Result<PlaidTransactionsRequest, AppError> {
    let account_mask = account_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("account_id is required"))?;

    Ok(PlaidTransactionsRequest {
        account_mask: account_mask.to_string(),
        start_date: parse_date(start_date, "start_date")?,
        end_date: parse_date(end_date, "end_date")?,
        limit: parse_int(limit, "limit", DEFAULT_PLAID_LIMIT)?,
        offset: parse_int(offset, "offset", 0)?.max(0),
    })
}

fn respond(
    state: &AppState,
    user: &CurrentUser,
    request: &PlaidTransactionsRequest,
) -> Result<Json<PlaidTransactionsResponse>, AppError> {
    let response = state
        .db
        .plaid_transactions_get(user.id, request)
        .map_err(AppError::from_core)?;

    audit(
        state,
        user.id,
        "list",
        "plaid_transactions",
        None,
        Some(&format!(
            "mask={}, count={}",
            request.account_mask,
            response.transactions.len()
        )),
    );

    Ok(Json(response))
}

/// GET /fake/plaid/transactions - Plaid-style page for one linked account
pub async fn fake_plaid_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<FakePlaidParams>,
) -> Result<Json<PlaidTransactionsResponse>, AppError> {
    let request = build_request(
        params.account_id.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        params.limit.as_deref(),
        params.offset.as_deref(),
    )?;
    respond(&state, &user, &request)
}

/// POST /accounts/plaid/transactions/get - Plaid `transactions/get` imitation
pub async fn plaid_transactions_get(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PlaidGetParams>,
) -> Result<Json<PlaidTransactionsResponse>, AppError> {
    let request = build_request(
        params.account_id.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        params.count.as_deref(),
        params.offset.as_deref(),
    )?;
    respond(&state, &user, &request)
}
