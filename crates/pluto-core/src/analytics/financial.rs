//! Whole-portfolio financial summary

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::stats::{finite_transactions, round2, MathematicalSummary};
use crate::models::{Account, Transaction};

/// Window of the statistical part of the summary
pub const FINANCIAL_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_balance: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_worth: f64,
    pub account_count: usize,
    pub mathematical_summary: MathematicalSummary,
}

/// Combine balances, all-time totals and the trailing-year statistics
///
/// Net worth is the sum of finite account balances; the balances already
/// carry every posted transaction.
pub fn summarize_finances(
    accounts: &[Account],
    all_time: &[Transaction],
    last_year: &[Transaction],
) -> FinancialSummary {
    let skipped = accounts.iter().filter(|a| !a.balance.is_finite()).count();
    if skipped > 0 {
        warn!(skipped, "Ignoring accounts with non-finite balances");
    }
    let total_balance: f64 = accounts
        .iter()
        .map(|a| a.balance)
        .filter(|b| b.is_finite())
        .sum();

    let finite = finite_transactions(all_time);
    let total_income: f64 = finite
        .iter()
        .filter(|t| t.is_income())
        .map(|t| t.amount)
        .sum();
    let total_expenses: f64 = finite
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount.abs())
        .sum();

    FinancialSummary {
        total_balance: round2(total_balance),
        total_income: round2(total_income),
        total_expenses: round2(total_expenses),
        net_worth: round2(total_balance),
        account_count: accounts.len(),
        mathematical_summary: MathematicalSummary::from_transactions(last_year),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn account(id: i64, balance: f64) -> Account {
        Account {
            id,
            user_id: 1,
            name: format!("Account {}", id),
            nickname: None,
            currency: "USD".to_string(),
            account_type: None,
            mask: None,
            balance,
            created_at: Utc::now(),
        }
    }

    fn tx(amount: f64) -> Transaction {
        Transaction {
            id: 0,
            user_id: 1,
            account_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount,
            category: None,
            description: None,
        }
    }

    #[test]
    fn test_skips_non_finite_balances() {
        let accounts = vec![account(1, 1200.5), account(2, f64::NAN), account(3, 300.0)];
        let s = summarize_finances(&accounts, &[], &[]);
        assert_eq!(s.total_balance, 1500.5);
        assert_eq!(s.net_worth, 1500.5);
        assert_eq!(s.account_count, 3);
        assert_eq!(s.mathematical_summary, MathematicalSummary::zero());
    }

    #[test]
    fn test_totals() {
        let all = vec![tx(1000.0), tx(-250.0), tx(-50.0), tx(f64::INFINITY)];
        let s = summarize_finances(&[account(1, 700.0)], &all, &all[..2]);
        assert_eq!(s.total_income, 1000.0);
        assert_eq!(s.total_expenses, 300.0);
        assert_eq!(s.mathematical_summary.total_transactions, 2);
    }

    #[test]
    fn test_empty() {
        let s = summarize_finances(&[], &[], &[]);
        assert_eq!(s.total_balance, 0.0);
        assert_eq!(s.account_count, 0);
    }
}
