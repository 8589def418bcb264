//! Signup, login and current-user handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{audit, read_json};
use crate::{token, AppError, AppState, CurrentUser};
use pluto_core::models::User;
use pluto_core::security;

/// Request body for signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserRead {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Emails are matched case-insensitively
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// POST /auth/signup - Register a new user
pub async fn signup(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<UserRead>), AppError> {
    let req: SignupRequest = read_json(request).await?;

    let email = normalize_email(&req.email);
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::bad_request("Invalid email address"));
    }
    if req.password.is_empty() {
        return Err(AppError::bad_request("Password must not be empty"));
    }
    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let hashed = security::hash_password(&req.password).map_err(AppError::from_core)?;
    let user = state
        .db
        .create_user(&email, &hashed, full_name)
        .map_err(AppError::from_core)?;

    info!(user_id = user.id, "User registered");
    audit(&state, user.id, "signup", "user", Some(user.id), None);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/login - Exchange credentials for an access token
pub async fn login(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<TokenResponse>, AppError> {
    let req: LoginRequest = read_json(request).await?;
    let email = normalize_email(&req.email);

    let user = state
        .db
        .get_user_by_email(&email)
        .map_err(AppError::from_core)?
        .filter(|u| security::verify_password(&req.password, &u.hashed_password));

    let Some(user) = user else {
        warn!("Failed login attempt");
        if let Err(e) = state
            .db
            .log_audit(None, "login_failed", Some("user"), None, None)
        {
            warn!(error = %e, "Failed to write audit entry");
        }
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    let access_token = token::issue_token(&state.config.jwt, user.id, chrono::Utc::now())?;
    audit(&state, user.id, "login", "user", Some(user.id), None);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// GET /users/me - The authenticated user
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserRead>, AppError> {
    let user = state
        .db
        .get_user(current.id)
        .map_err(AppError::from_core)?
        .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

    Ok(Json(user.into()))
}
