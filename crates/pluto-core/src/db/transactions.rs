//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use super::{parse_date, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};

const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, date, amount, category, description";

/// Default page size for transaction listings
pub const DEFAULT_LIMIT: i64 = 50;
/// Largest page a caller may request
pub const MAX_LIMIT: i64 = 1000;

pub(crate) fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let date: String = row.get(3)?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_id: row.get(2)?,
        date: parse_date(&date)?,
        amount: row.get(4)?,
        category: row.get(5)?,
        description: row.get(6)?,
    })
}

/// Insert one row on an already checked-out connection
pub(crate) fn insert_row(
    conn: &Connection,
    user_id: i64,
    account_id: i64,
    tx: &NewTransaction,
) -> rusqlite::Result<i64> {
    conn.execute(
        r#"
        INSERT INTO transactions (user_id, account_id, date, amount, category, description)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![
            user_id,
            account_id,
            tx.date.format("%Y-%m-%d").to_string(),
            tx.amount,
            tx.category,
            tx.description,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Filter and paging for transaction listings
///
/// The lifetime `'query` is how long the borrowed category filter lives.
#[derive(Debug, Clone)]
pub struct TransactionQuery<'query> {
    pub account_id: Option<i64>,
    pub category: Option<&'query str>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TransactionQuery<'_> {
    fn default() -> Self {
        Self {
            account_id: None,
            category: None,
            from: None,
            to: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl<'query> TransactionQuery<'query> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_id(mut self, id: Option<i64>) -> Self {
        self.account_id = id;
        self
    }

    pub fn category(mut self, category: Option<&'query str>) -> Self {
        self.category = category;
        self
    }

    /// Inclusive date bounds
    pub fn date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Page size, clamped to 1..=MAX_LIMIT
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Rows to skip, never negative
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset.max(0);
        self
    }

    /// Build the WHERE clause and its parameters for `user_id`
    fn where_clause(&self, user_id: i64) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = vec!["user_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(account_id) = self.account_id {
            conditions.push("account_id = ?".to_string());
            params.push(Box::new(account_id));
        }
        if let Some(category) = self.category {
            conditions.push("category = ?".to_string());
            params.push(Box::new(category.to_string()));
        }
        if let Some(from) = self.from {
            conditions.push("date >= ?".to_string());
            params.push(Box::new(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to {
            conditions.push("date <= ?".to_string());
            params.push(Box::new(to.format("%Y-%m-%d").to_string()));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

impl Database {
    /// Insert a transaction and add its amount to the account balance
    ///
    /// The account must belong to `user_id`.
    pub fn insert_transaction(
        &self,
        user_id: i64,
        account_id: i64,
        tx: &NewTransaction,
    ) -> Result<Transaction> {
        if self.get_account(user_id, account_id)?.is_none() {
            return Err(Error::NotFound("Account not found".to_string()));
        }

        let conn = self.conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            let id = insert_row(&conn, user_id, account_id, tx)?;
            conn.execute(
                "UPDATE accounts SET balance = balance + ? WHERE id = ?",
                params![tx.amount, account_id],
            )?;
            Ok::<_, rusqlite::Error>(id)
        })();

        let id = match result {
            Ok(id) => {
                conn.execute("COMMIT", [])?;
                id
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                return Err(e.into());
            }
        };

        Ok(Transaction {
            id,
            user_id,
            account_id,
            date: tx.date,
            amount: tx.amount,
            category: tx.category.clone(),
            description: tx.description.clone(),
        })
    }

    /// List a user's transactions, newest first
    pub fn list_transactions(
        &self,
        user_id: i64,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let (where_clause, mut params) = query.where_clause(user_id);
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let sql = format!(
            "SELECT {} FROM transactions {} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
            TRANSACTION_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let transactions = stmt
            .query_map(param_refs.as_slice(), row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Count a user's transactions matching the filter (ignores paging)
    pub fn count_transactions(&self, user_id: i64, query: &TransactionQuery) -> Result<i64> {
        let conn = self.conn()?;
        let (where_clause, params) = query.where_clause(user_id);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM transactions {}", where_clause),
            param_refs.as_slice(),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Transactions dated within `[from, to]`, oldest first, for analysis
    pub fn transactions_in_window(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        account_id: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let query = TransactionQuery::new()
            .account_id(account_id)
            .date_range(Some(from), Some(to));
        let (where_clause, params) = query.where_clause(user_id);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions {} ORDER BY date ASC, id ASC",
            TRANSACTION_COLUMNS, where_clause
        ))?;
        let transactions = stmt
            .query_map(param_refs.as_slice(), row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Every transaction the user owns, in insertion order
    pub fn all_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? ORDER BY id",
            TRANSACTION_COLUMNS
        ))?;
        let transactions = stmt
            .query_map(params![user_id], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}
