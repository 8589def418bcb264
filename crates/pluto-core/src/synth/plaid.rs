//! Plaid-shaped read model over locally stored transactions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{Database, TransactionQuery};
use crate::error::{Error, Result};
use crate::models::{Account, Transaction};

/// Largest page the Plaid-shaped endpoints return
pub const MAX_PLAID_LIMIT: i64 = 500;
/// Default page size for the Plaid-shaped endpoints
pub const DEFAULT_PLAID_LIMIT: i64 = 100;

/// Map a local category to a Plaid `personal_finance_category.primary` value
pub fn pfc_primary(category: Option<&str>) -> &'static str {
    match category {
        Some("salary") => "INCOME_SALARY",
        Some("rent") | Some("utilities") => "RENT_AND_UTILITIES",
        Some("subscriptions") => "SUBSCRIPTIONS",
        Some("groceries") | Some("dining") => "FOOD_AND_DRINK",
        Some("transport") => "TRANSPORTATION",
        Some("savings") | Some("deposit") => "TRANSFER_IN",
        Some("interest") => "INCOME_INTEREST",
        Some("withdrawal") => "TRANSFER_OUT",
        Some("dividend") => "INCOME_DIVIDEND",
        _ => "GENERAL_MERCHANDISE",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidBalances {
    pub available: f64,
    pub current: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidAccount {
    pub account_id: String,
    pub name: String,
    pub official_name: Option<String>,
    pub subtype: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub mask: Option<String>,
    pub balances: PlaidBalances,
    pub iso_currency_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidPersonalFinanceCategory {
    pub primary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidPaymentMeta {
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidTransaction {
    pub account_id: String,
    pub transaction_id: String,
    pub name: String,
    pub merchant_name: Option<String>,
    pub amount: f64,
    pub iso_currency_code: String,
    pub date: String,
    pub authorized_date: Option<String>,
    pub pending: bool,
    pub payment_channel: String,
    pub transaction_type: Option<String>,
    pub personal_finance_category: PlaidPersonalFinanceCategory,
    pub location: PlaidLocation,
    pub payment_meta: PlaidPaymentMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidItem {
    pub item_id: String,
    pub institution_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidTransactionsResponse {
    pub accounts: Vec<PlaidAccount>,
    pub transactions: Vec<PlaidTransaction>,
    pub total_transactions: i64,
    pub item: PlaidItem,
    pub request_id: String,
}

/// Parameters of a Plaid-style `transactions/get` call
#[derive(Debug, Clone)]
pub struct PlaidTransactionsRequest {
    /// Account mask used as the Plaid account id
    pub account_mask: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PlaidTransactionsRequest {
    fn default() -> Self {
        Self {
            account_mask: String::new(),
            start_date: None,
            end_date: None,
            limit: DEFAULT_PLAID_LIMIT,
            offset: 0,
        }
    }
}

fn to_plaid_account(account: &Account, label: &str) -> PlaidAccount {
    let subtype = account
        .account_type
        .map(|t| t.as_str())
        .unwrap_or("checking");
    let official_name = account.account_type.map(|t| t.label()).unwrap_or("Checking");
    let balance = if account.balance.is_finite() {
        account.balance
    } else {
        0.0
    };

    PlaidAccount {
        account_id: label.to_string(),
        name: account.name.clone(),
        official_name: Some(official_name.to_string()),
        subtype: subtype.to_string(),
        account_type: "depository".to_string(),
        mask: account.mask.clone(),
        balances: PlaidBalances {
            available: balance,
            current: balance,
        },
        iso_currency_code: account.currency.clone(),
    }
}

fn to_plaid_transaction(tx: &Transaction, label: &str) -> PlaidTransaction {
    let date = tx.date.format("%Y-%m-%d").to_string();
    let name = tx
        .description
        .clone()
        .or_else(|| tx.category.clone())
        .unwrap_or_default();

    PlaidTransaction {
        account_id: label.to_string(),
        transaction_id: format!("tx_{}_{}", label, tx.id),
        name,
        merchant_name: tx.description.clone(),
        amount: (tx.amount * 100.0).round() / 100.0,
        iso_currency_code: "USD".to_string(),
        authorized_date: Some(date.clone()),
        date,
        pending: false,
        payment_channel: "online".to_string(),
        transaction_type: Some("special".to_string()),
        personal_finance_category: PlaidPersonalFinanceCategory {
            primary: pfc_primary(tx.category.as_deref()).to_string(),
        },
        location: PlaidLocation {
            city: None,
            region: None,
            country: Some("US".to_string()),
        },
        payment_meta: PlaidPaymentMeta {
            reference_number: None,
        },
    }
}

impl Database {
    /// Plaid-shaped transaction page for the caller's account with the given mask
    ///
    /// Newest first. Returns `Error::NotFound` for an unknown mask.
    pub fn plaid_transactions_get(
        &self,
        user_id: i64,
        request: &PlaidTransactionsRequest,
    ) -> Result<PlaidTransactionsResponse> {
        let label = request.account_mask.as_str();
        let account = self.find_account_by_mask(user_id, label)?.ok_or_else(|| {
            Error::NotFound(format!("Account with mask {} not found", label))
        })?;

        let query = TransactionQuery::new()
            .account_id(Some(account.id))
            .date_range(request.start_date, request.end_date)
            .limit(request.limit.clamp(1, MAX_PLAID_LIMIT))
            .offset(request.offset);

        let total = self.count_transactions(user_id, &query)?;
        let rows = self.list_transactions(user_id, &query)?;

        Ok(PlaidTransactionsResponse {
            accounts: vec![to_plaid_account(&account, label)],
            transactions: rows
                .iter()
                .map(|tx| to_plaid_transaction(tx, label))
                .collect(),
            total_transactions: total,
            item: PlaidItem {
                item_id: format!("fake_item_{}", label),
                institution_id: "ins_fake_demo".to_string(),
            },
            request_id: format!("req_fake_{}", label),
        })
    }
}
