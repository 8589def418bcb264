//! Composite financial health ("Pluto") score

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::stats::{finite_transactions, round2, round3};
use crate::models::Transaction;

/// Window the score is computed over
pub const HEALTH_WINDOW_DAYS: i64 = 30;

const SAVINGS_WEIGHT: f64 = 0.7;
const DIVERSITY_WEIGHT: f64 = 0.3;
const DIVERSITY_CAP: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// 0-100
    pub score: f64,
    pub window_days: i64,
    pub income_30d: f64,
    pub spend_30d: f64,
    pub savings_rate: f64,
    /// Distinct non-null categories, uncapped
    pub category_diversity: usize,
}

/// Score transactions already restricted to the trailing 30-day window
///
/// `100 * (0.7 * savings_rate + 0.3 * min(categories, 6) / 6)`, rounded to
/// 2 dp and clamped to [0, 100]. Savings rate is 0 without income.
pub fn compute_health_score(transactions: &[Transaction]) -> HealthScore {
    let finite = finite_transactions(transactions);

    let income: f64 = finite
        .iter()
        .filter(|t| t.is_income())
        .map(|t| t.amount)
        .sum();
    let spend: f64 = finite
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount.abs())
        .sum();

    let savings_rate = if income > 0.0 {
        (income - spend) / income
    } else {
        0.0
    };

    let categories: HashSet<&str> = finite
        .iter()
        .filter_map(|t| t.category.as_deref())
        .collect();
    let diversity = categories.len().min(DIVERSITY_CAP) as f64 / DIVERSITY_CAP as f64;

    let raw = round2(100.0 * (SAVINGS_WEIGHT * savings_rate + DIVERSITY_WEIGHT * diversity));

    HealthScore {
        score: raw.clamp(0.0, 100.0),
        window_days: HEALTH_WINDOW_DAYS,
        income_30d: round2(income),
        spend_30d: round2(spend),
        savings_rate: round3(savings_rate),
        category_diversity: categories.len(),
    }
}
