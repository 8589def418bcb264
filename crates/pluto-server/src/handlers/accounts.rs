//! Account management and fake-institution linking handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::{audit, read_json};
use crate::{AppError, AppState, CurrentUser};
use pluto_core::models::{Account, AccountType, NewAccount};
use pluto_core::synth::LinkRequest;

/// Account read model
#[derive(Debug, Serialize)]
pub struct AccountRead {
    pub id: i64,
    pub name: String,
    pub nickname: Option<String>,
    pub currency: String,
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    pub mask: Option<String>,
    pub balance: f64,
}

impl From<Account> for AccountRead {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            nickname: account.nickname,
            currency: account.currency,
            account_type: account.account_type,
            mask: account.mask,
            balance: account.balance,
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Request body for creating an account
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub nickname: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub mask: Option<String>,
}

/// Request body for linking a fake institution account
#[derive(Debug, Deserialize)]
pub struct LinkAccountRequest {
    pub username: String,
    /// Accepted for shape compatibility; no real institution is contacted
    #[serde(default)]
    pub password: Option<String>,
    pub account_type: String,
    pub nickname: Option<String>,
}

fn parse_account_type(value: &str) -> Result<AccountType, AppError> {
    value.parse().map_err(|e: String| AppError::bad_request(&e))
}

/// GET /accounts - List the caller's accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<AccountRead>>, AppError> {
    let accounts = state.db.list_accounts(user.id).map_err(AppError::from_core)?;

    audit(
        &state,
        user.id,
        "list",
        "account",
        None,
        Some(&format!("count={}", accounts.len())),
    );

    Ok(Json(accounts.into_iter().map(AccountRead::from).collect()))
}

/// POST /accounts - Create an empty account
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<(StatusCode, Json<AccountRead>), AppError> {
    let req: CreateAccountRequest = read_json(request).await?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Account name must not be empty"));
    }
    let currency = req.currency.trim().to_uppercase();
    if currency.is_empty() {
        return Err(AppError::bad_request("Currency must not be empty"));
    }
    let account_type = req
        .account_type
        .as_deref()
        .map(parse_account_type)
        .transpose()?;

    let account = state
        .db
        .create_account(
            user.id,
            &NewAccount {
                name: name.to_string(),
                nickname: req.nickname,
                currency,
                account_type,
                mask: req.mask,
            },
        )
        .map_err(AppError::from_core)?;

    audit(
        &state,
        user.id,
        "create",
        "account",
        Some(account.id),
        Some(&format!("name={}", account.name)),
    );

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// POST /accounts/link - Link a fake institution account
///
/// Returns 201 with a generated history on first link, 200 with the existing
/// account on a repeat link of the same (type, mask).
pub async fn link_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    request: Request,
) -> Result<(StatusCode, Json<AccountRead>), AppError> {
    let req: LinkAccountRequest = read_json(request).await?;
    let account_type = parse_account_type(&req.account_type)?;

    let link = LinkRequest {
        username: req.username,
        account_type,
        nickname: req.nickname,
    };
    let today = chrono::Utc::now().date_naive();
    let (account, created) = state
        .db
        .link_fake_account(user.id, &link, state.config.synth_seed, today)
        .map_err(AppError::from_core)?;

    audit(
        &state,
        user.id,
        if created { "link" } else { "relink" },
        "account",
        Some(account.id),
        Some(&format!("type={}", account_type)),
    );

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(account.into())))
}
