//! Spending summary: totals, category breakdown and half-over-half trend

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::stats::{finite_transactions, mean, round2, MathematicalSummary};
use super::TrendDirection;
use crate::models::Transaction;

/// Label used for expenses without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    /// Absolute expense total
    pub total: f64,
    /// Share of total expenses, 0-100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingInsight {
    pub window_days: i64,
    pub total_spending: f64,
    pub average_daily: f64,
    pub top_category: String,
    pub spending_trend: TrendDirection,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub mathematical_insights: MathematicalSummary,
}

/// Per-category absolute expense totals, largest first
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryBreakdown> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for t in finite_transactions(transactions) {
        if t.is_expense() {
            let category = t.category.as_deref().unwrap_or(UNCATEGORIZED);
            *totals.entry(category).or_insert(0.0) += t.amount.abs();
        }
    }

    let grand_total: f64 = totals.values().sum();
    if grand_total <= 0.0 {
        return Vec::new();
    }

    let mut breakdown: Vec<CategoryBreakdown> = totals
        .into_iter()
        .map(|(category, total)| CategoryBreakdown {
            category: category.to_string(),
            total: round2(total),
            percentage: round2(total / grand_total * 100.0),
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

/// Compare the mean of the older half of expenses with the recent half
///
/// Increasing above +10%, decreasing below -10%, otherwise stable.
pub fn half_over_half_trend(transactions: &[Transaction]) -> TrendDirection {
    let mut expenses: Vec<&Transaction> = finite_transactions(transactions)
        .into_iter()
        .filter(|t| t.is_expense())
        .collect();
    if expenses.len() < 2 {
        return TrendDirection::Stable;
    }
    expenses.sort_by_key(|t| t.date);

    let amounts: Vec<f64> = expenses.iter().map(|t| t.amount.abs()).collect();
    let (older, recent) = amounts.split_at(amounts.len() / 2);
    let older_mean = mean(older);
    let recent_mean = mean(recent);

    if older_mean == 0.0 {
        TrendDirection::Stable
    } else if recent_mean > older_mean * 1.1 {
        TrendDirection::Increasing
    } else if recent_mean < older_mean * 0.9 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

/// Summarize spending for transactions already restricted to a window
pub fn summarize_spending(transactions: &[Transaction], window_days: i64) -> SpendingInsight {
    let stats = MathematicalSummary::from_transactions(transactions);
    let breakdown = category_breakdown(transactions);
    let top_category = breakdown
        .first()
        .map(|c| c.category.clone())
        .unwrap_or_else(|| "none".to_string());

    let average_daily = if window_days > 0 {
        stats.expense_total / window_days as f64
    } else {
        0.0
    };

    SpendingInsight {
        window_days,
        total_spending: round2(stats.expense_total),
        average_daily: round2(average_daily),
        top_category,
        spending_trend: half_over_half_trend(transactions),
        category_breakdown: breakdown,
        mathematical_insights: stats,
    }
}
