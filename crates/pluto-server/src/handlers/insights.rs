//! Analytics and narrative insight handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::{audit, parse_id, parse_int};
use crate::{AppError, AppState, CurrentUser};
use pluto_core::analytics::{
    FinancialSummary, HealthScore, SpendingInsight, TrendAnalysis, Window,
};
use pluto_core::narrative::NarrativeInsights;

/// Default window for the spending summary
pub const SUMMARY_DEFAULT_DAYS: i64 = 30;

/// Default window for trend analysis
pub const TRENDS_DEFAULT_DAYS: i64 = 90;

/// Query parameters shared by windowed analytics endpoints
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub days: Option<String>,
    pub account_id: Option<String>,
}

impl WindowParams {
    fn resolve(&self, default_days: i64) -> Result<(Window, Option<i64>), AppError> {
        let days = parse_int(self.days.as_deref(), "days", default_days)?;
        let account_id = parse_id(self.account_id.as_deref(), "account_id")?;
        let window =
            Window::trailing(days, Utc::now().date_naive()).map_err(AppError::from_core)?;
        Ok((window, account_id))
    }
}

/// GET /insights/spending-summary - Totals, breakdown and half-over-half trend
pub async fn spending_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<WindowParams>,
) -> Result<Json<SpendingInsight>, AppError> {
    let (window, account_id) = params.resolve(SUMMARY_DEFAULT_DAYS)?;
    let summary = state
        .db
        .spending_summary(user.id, &window, account_id)
        .map_err(AppError::from_core)?;

    audit(
        &state,
        user.id,
        "view",
        "spending_summary",
        account_id,
        Some(&format!("days={}", window.days)),
    );

    Ok(Json(summary))
}

/// GET /insights/trends - Daily spending regression and projection
pub async fn spending_trends(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<WindowParams>,
) -> Result<Json<TrendAnalysis>, AppError> {
    let (window, account_id) = params.resolve(TRENDS_DEFAULT_DAYS)?;
    let trends = state
        .db
        .spending_trends(user.id, &window, account_id)
        .map_err(AppError::from_core)?;

    audit(
        &state,
        user.id,
        "view",
        "spending_trends",
        account_id,
        Some(&format!("days={}", window.days)),
    );

    Ok(Json(trends))
}

/// GET /insights/pluto-score - 30-day financial health score
pub async fn pluto_score(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<HealthScore>, AppError> {
    let score = state
        .db
        .pluto_score(user.id, Utc::now().date_naive())
        .map_err(AppError::from_core)?;

    audit(&state, user.id, "view", "pluto_score", None, None);

    Ok(Json(score))
}

/// GET /insights/financial-summary - Balances and all-time totals
pub async fn financial_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<FinancialSummary>, AppError> {
    let summary = state
        .db
        .financial_summary(user.id, Utc::now().date_naive())
        .map_err(AppError::from_core)?;

    audit(&state, user.id, "view", "financial_summary", None, None);

    Ok(Json(summary))
}

/// GET /insights/ai - Narrative insights (cached, never fails)
pub async fn ai_insights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Json<NarrativeInsights> {
    let insights = state.insights.get_insights(user.id).await;

    audit(
        &state,
        user.id,
        "view",
        "narrative_insights",
        None,
        Some(&format!("count={}", insights.insights.len())),
    );

    Json(insights)
}
