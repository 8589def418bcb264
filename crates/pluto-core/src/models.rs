//! Domain models for Pluto

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Argon2 PHC string, never serialized in API responses
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A financial account owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub nickname: Option<String>,
    pub currency: String,
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    /// Short human-facing reference (e.g. last 4 characters of a linking username)
    pub mask: Option<String>,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

/// Account types supported by the fake banking-data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Trading,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Trading => "trading",
        }
    }

    /// Capitalized label used in generated account names
    pub fn label(&self) -> &'static str {
        match self {
            Self::Checking => "Checking",
            Self::Savings => "Savings",
            Self::Trading => "Trading",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "trading" | "brokerage" => Ok(Self::Trading),
            _ => Err(format!("Unknown account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A new account to be created (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub nickname: Option<String>,
    pub currency: String,
    pub account_type: Option<AccountType>,
    pub mask: Option<String>,
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub date: NaiveDate,
    /// Negative = expense, positive = income
    pub amount: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

/// A new transaction (before DB insertion)
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}
