//! Descriptive statistics over transaction amounts
//!
//! Non-finite values are dropped before aggregation: every function returns
//! a well-formed (possibly all-zero) result for empty or degenerate input.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Transaction;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Transactions whose amount is finite, logging how many were dropped
pub(crate) fn finite_transactions(transactions: &[Transaction]) -> Vec<&Transaction> {
    let kept: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.amount.is_finite())
        .collect();
    let dropped = transactions.len() - kept.len();
    if dropped > 0 {
        warn!(dropped, "Ignoring transactions with non-finite amounts");
    }
    kept
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median, averaging the two middle values for even counts
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample variance (divisor n - 1); 0 when fewer than 2 points
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Sample standard deviation; 0 when fewer than 2 points
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Ordinary least-squares slope of `values` against their index
///
/// 0 for fewer than 2 points.
pub fn regression_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Summary statistics for a set of transactions
///
/// Location and spread figures describe the expense set (absolute values);
/// totals cover both income and expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathematicalSummary {
    pub mean: f64,
    pub median: f64,
    pub standard_deviation: f64,
    pub variance: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub total_transactions: usize,
    pub income_total: f64,
    pub expense_total: f64,
    pub net_flow: f64,
}

impl MathematicalSummary {
    pub fn zero() -> Self {
        Self {
            mean: 0.0,
            median: 0.0,
            standard_deviation: 0.0,
            variance: 0.0,
            min_value: 0.0,
            max_value: 0.0,
            total_transactions: 0,
            income_total: 0.0,
            expense_total: 0.0,
            net_flow: 0.0,
        }
    }

    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let finite = finite_transactions(transactions);
        if finite.is_empty() {
            return Self::zero();
        }

        let expenses: Vec<f64> = finite
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount.abs())
            .collect();
        let income_total: f64 = finite
            .iter()
            .filter(|t| t.is_income())
            .map(|t| t.amount)
            .sum();
        let expense_total: f64 = expenses.iter().sum();

        let min_value = expenses.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let max_value = expenses.iter().copied().reduce(f64::max).unwrap_or(0.0);

        Self {
            mean: mean(&expenses),
            median: median(&expenses),
            standard_deviation: round2(std_dev(&expenses)),
            variance: variance(&expenses),
            min_value,
            max_value,
            total_transactions: finite.len(),
            income_total,
            expense_total,
            net_flow: income_total - expense_total,
        }
    }
}
