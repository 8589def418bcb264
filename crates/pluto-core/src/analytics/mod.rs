//! Statistical insight engine
//!
//! Pure functions over `&[Transaction]` plus thin `Database` wrappers that
//! fetch a trailing window for a user (optionally one account) first.
//!
//! - `stats` - mean, median, sample variance, regression slope
//! - `summary` - spending totals, category breakdown, half-over-half trend
//! - `trend` - daily buckets, regression direction, volatility, projection
//! - `health` - composite savings/diversity score
//! - `financial` - balances and all-time totals

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{Error, Result};

pub mod financial;
pub mod health;
pub mod stats;
pub mod summary;
pub mod trend;

pub use financial::{summarize_finances, FinancialSummary, FINANCIAL_WINDOW_DAYS};
pub use health::{compute_health_score, HealthScore, HEALTH_WINDOW_DAYS};
pub use stats::MathematicalSummary;
pub use summary::{summarize_spending, CategoryBreakdown, SpendingInsight};
pub use trend::{analyze_trend, TrendAnalysis};

/// Longest trailing window a caller may request
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Direction of a spending trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }

    /// Classify a regression slope by sign
    pub fn from_slope(slope: f64) -> Self {
        const EPSILON: f64 = 1e-9;
        if slope > EPSILON {
            Self::Increasing
        } else if slope < -EPSILON {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A trailing date range `[today - days, today]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub days: i64,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Window {
    /// Validate `days` (1..=3650) and anchor the window on `today`
    pub fn trailing(days: i64, today: NaiveDate) -> Result<Self> {
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(Error::InvalidData(format!(
                "days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        Ok(Self {
            days,
            from: today - Duration::days(days),
            to: today,
        })
    }
}

impl Database {
    fn window_transactions(
        &self,
        user_id: i64,
        window: &Window,
        account_id: Option<i64>,
    ) -> Result<Vec<crate::models::Transaction>> {
        if let Some(id) = account_id {
            if self.get_account(user_id, id)?.is_none() {
                return Err(Error::NotFound("Account not found".to_string()));
            }
        }
        self.transactions_in_window(user_id, window.from, window.to, account_id)
    }

    /// Spending summary for a user's trailing window
    pub fn spending_summary(
        &self,
        user_id: i64,
        window: &Window,
        account_id: Option<i64>,
    ) -> Result<SpendingInsight> {
        let txs = self.window_transactions(user_id, window, account_id)?;
        Ok(summarize_spending(&txs, window.days))
    }

    /// Daily trend analysis for a user's trailing window
    pub fn spending_trends(
        &self,
        user_id: i64,
        window: &Window,
        account_id: Option<i64>,
    ) -> Result<TrendAnalysis> {
        let txs = self.window_transactions(user_id, window, account_id)?;
        Ok(analyze_trend(&txs, window.days))
    }

    /// Health score over the trailing 30 days
    pub fn pluto_score(&self, user_id: i64, today: NaiveDate) -> Result<HealthScore> {
        let window = Window::trailing(HEALTH_WINDOW_DAYS, today)?;
        let txs = self.window_transactions(user_id, &window, None)?;
        Ok(compute_health_score(&txs))
    }

    /// Balances, all-time totals and trailing-year statistics
    pub fn financial_summary(&self, user_id: i64, today: NaiveDate) -> Result<FinancialSummary> {
        let accounts = self.list_accounts(user_id)?;
        let all_time = self.all_transactions(user_id)?;
        let window = Window::trailing(FINANCIAL_WINDOW_DAYS, today)?;
        let last_year = self.window_transactions(user_id, &window, None)?;
        Ok(summarize_finances(&accounts, &all_time, &last_year))
    }
}
