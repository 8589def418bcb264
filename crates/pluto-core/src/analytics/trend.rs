//! Daily spending trend analysis

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::stats::{finite_transactions, mean, regression_slope, round2, std_dev};
use super::TrendDirection;
use crate::models::Transaction;

/// Days of data needed before the summary text drops its qualifier
const FULL_DETAIL_DAYS: usize = 10;
/// Fewer days than this is reported as insufficient
const MIN_DETAIL_DAYS: usize = 5;
/// Trailing daily totals averaged for the one-week projection
const PROJECTION_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub window_days: i64,
    /// Calendar days with at least one expense
    pub days_analyzed: usize,
    pub trend_direction: TrendDirection,
    /// Absolute regression slope, currency per day
    pub trend_strength: f64,
    /// Sample standard deviation of daily totals
    pub volatility: f64,
    pub prediction_next_week: f64,
    pub mathematical_analysis: String,
}

/// Absolute expense totals per calendar day, oldest first
pub fn daily_expense_totals(transactions: &[Transaction]) -> Vec<(NaiveDate, f64)> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for t in finite_transactions(transactions) {
        if t.is_expense() {
            *buckets.entry(t.date).or_insert(0.0) += t.amount.abs();
        }
    }
    buckets.into_iter().collect()
}

/// Mean of the last `PROJECTION_DAYS` totals (or all of them) times seven
fn project_next_week(totals: &[f64]) -> f64 {
    let start = totals.len().saturating_sub(PROJECTION_DAYS);
    mean(&totals[start..]) * 7.0
}

fn describe(
    days: usize,
    window_days: i64,
    direction: TrendDirection,
    slope: f64,
    volatility: f64,
    projection: f64,
) -> String {
    if days < MIN_DETAIL_DAYS {
        return format!(
            "Insufficient data: only {} day(s) with spending in the last {} days. \
             Projected spending next week: ${:.2}.",
            days, window_days, projection
        );
    }

    let detail = format!(
        "Across {} days with spending, daily spending is {} (slope ${:.2}/day, volatility ${:.2}). \
         Projected spending next week: ${:.2}.",
        days,
        direction.as_str(),
        slope,
        volatility,
        projection
    );

    if days < FULL_DETAIL_DAYS {
        format!("Limited data: {}", detail)
    } else {
        detail
    }
}

/// Fit a line through daily expense totals for transactions in a window
///
/// The regression runs against bucket index, not date. Fewer than two
/// buckets is always stable with zero strength and volatility.
pub fn analyze_trend(transactions: &[Transaction], window_days: i64) -> TrendAnalysis {
    let totals: Vec<f64> = daily_expense_totals(transactions)
        .into_iter()
        .map(|(_, total)| total)
        .collect();
    let days = totals.len();

    let (direction, slope, volatility) = if days >= 2 {
        let slope = regression_slope(&totals);
        (TrendDirection::from_slope(slope), slope, std_dev(&totals))
    } else {
        (TrendDirection::Stable, 0.0, 0.0)
    };
    let projection = project_next_week(&totals);

    TrendAnalysis {
        window_days,
        days_analyzed: days,
        trend_direction: direction,
        trend_strength: round2(slope.abs()),
        volatility: round2(volatility),
        prediction_next_week: round2(projection),
        mathematical_analysis: describe(days, window_days, direction, slope, volatility, projection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(day: u32, amount: f64) -> Transaction {
        Transaction {
            id: day as i64,
            user_id: 1,
            account_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            amount: -amount,
            category: None,
            description: None,
        }
    }

    #[test]
    fn test_three_rising_days() {
        let txs = vec![expense(1, 10.0), expense(2, 20.0), expense(3, 30.0)];
        let t = analyze_trend(&txs, 90);
        assert_eq!(t.trend_direction, TrendDirection::Increasing);
        assert_eq!(t.trend_strength, 10.0);
        assert_eq!(t.volatility, 10.0);
        assert_eq!(t.prediction_next_week, 140.0);
        assert_eq!(t.days_analyzed, 3);
        assert!(t.mathematical_analysis.starts_with("Insufficient data"));
    }

    #[test]
    fn test_same_day_expenses_share_a_bucket() {
        let txs = vec![expense(4, 5.0), expense(4, 7.0), expense(6, 1.0)];
        let totals = daily_expense_totals(&txs);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].1, 12.0);
    }

    #[test]
    fn test_single_bucket_is_stable() {
        let t = analyze_trend(&[expense(1, 50.0)], 30);
        assert_eq!(t.trend_direction, TrendDirection::Stable);
        assert_eq!(t.trend_strength, 0.0);
        assert_eq!(t.volatility, 0.0);
        assert_eq!(t.prediction_next_week, 350.0);
    }

    #[test]
    fn test_empty_is_zero() {
        let t = analyze_trend(&[], 30);
        assert_eq!(t.trend_direction, TrendDirection::Stable);
        assert_eq!(t.days_analyzed, 0);
        assert_eq!(t.prediction_next_week, 0.0);
    }

    #[test]
    fn test_decreasing_and_flat() {
        let falling: Vec<_> = (1..=5).map(|d| expense(d, 60.0 - d as f64 * 10.0)).collect();
        assert_eq!(
            analyze_trend(&falling, 30).trend_direction,
            TrendDirection::Decreasing
        );

        let flat: Vec<_> = (1..=5).map(|d| expense(d, 25.0)).collect();
        let t = analyze_trend(&flat, 30);
        assert_eq!(t.trend_direction, TrendDirection::Stable);
        assert_eq!(t.volatility, 0.0);
    }

    #[test]
    fn test_projection_uses_last_seven_days() {
        // 3 early days at 100, then 7 days at 10
        let mut txs: Vec<_> = (1..=3).map(|d| expense(d, 100.0)).collect();
        txs.extend((4..=10).map(|d| expense(d, 10.0)));
        let t = analyze_trend(&txs, 30);
        assert_eq!(t.prediction_next_week, 70.0);
    }

    #[test]
    fn test_summary_text_tiers() {
        let five: Vec<_> = (1..=5).map(|d| expense(d, d as f64)).collect();
        assert!(analyze_trend(&five, 30)
            .mathematical_analysis
            .starts_with("Limited data"));

        let ten: Vec<_> = (1..=10).map(|d| expense(d, d as f64)).collect();
        let text = analyze_trend(&ten, 30).mathematical_analysis;
        assert!(text.starts_with("Across 10 days"));
        assert!(text.contains("increasing"));
    }

    #[test]
    fn test_income_ignored() {
        let mut txs = vec![expense(1, 10.0), expense(2, 20.0)];
        txs.push(Transaction {
            amount: 5000.0,
            ..expense(3, 0.0)
        });
        assert_eq!(analyze_trend(&txs, 30).days_analyzed, 2);
    }
}
