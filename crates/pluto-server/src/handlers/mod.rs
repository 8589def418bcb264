//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod accounts;
pub mod auth;
pub mod insights;
pub mod plaid;
pub mod transactions;

// Re-export all handlers for use in router
pub use accounts::*;
pub use auth::*;
pub use insights::*;
pub use plaid::*;
pub use transactions::*;

use axum::extract::Request;
use axum::Json;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{AppError, AppState, MAX_BODY_SIZE};

/// GET /healthz - Liveness check
pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Read and decode a JSON request body
pub(crate) async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

/// Treat `?name=` like an absent parameter
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an optional integer id query parameter
pub(crate) fn parse_id(value: Option<&str>, name: &str) -> Result<Option<i64>, AppError> {
    present(value)
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::bad_request(&format!("Invalid {}: {}", name, s)))
        })
        .transpose()
}

/// Parse an optional `YYYY-MM-DD` query parameter
pub(crate) fn parse_date(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>, AppError> {
    present(value)
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                AppError::bad_request(&format!("Invalid {}: expected YYYY-MM-DD", name))
            })
        })
        .transpose()
}

/// Parse an optional integer query parameter with a default
pub(crate) fn parse_int(value: Option<&str>, name: &str, default: i64) -> Result<i64, AppError> {
    Ok(parse_id(value, name)?.unwrap_or(default))
}

/// Record an audit entry; failures are logged, never surfaced
pub(crate) fn audit(
    state: &AppState,
    user_id: i64,
    action: &str,
    entity_type: &str,
    entity_id: Option<i64>,
    details: Option<&str>,
) {
    if let Err(e) = state
        .db
        .log_audit(Some(user_id), action, Some(entity_type), entity_id, details)
    {
        warn!(user_id, action, error = %e, "Failed to write audit entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(None, "account_id").unwrap(), None);
        assert_eq!(parse_id(Some(""), "account_id").unwrap(), None);
        assert_eq!(parse_id(Some("12"), "account_id").unwrap(), Some(12));
        assert_eq!(
            parse_id(Some("abc"), "account_id").unwrap_err().status(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2024-06-01"), "from").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert!(parse_date(Some("06/01/2024"), "from").is_err());
        assert_eq!(parse_date(None, "from").unwrap(), None);
    }
}
