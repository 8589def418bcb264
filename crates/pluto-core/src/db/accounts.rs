//! Account operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Account, AccountType, NewAccount};

const ACCOUNT_COLUMNS: &str =
    "id, user_id, name, nickname, currency, account_type, mask, balance, created_at";

pub(crate) fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
    let account_type: Option<String> = row.get(5)?;
    let created_at: String = row.get(8)?;
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        nickname: row.get(3)?,
        currency: row.get(4)?,
        account_type: account_type.and_then(|s| s.parse().ok()),
        mask: row.get(6)?,
        balance: row.get(7)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Create an account owned by `user_id` with a zero balance
    pub fn create_account(&self, user_id: i64, account: &NewAccount) -> Result<Account> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO accounts (user_id, name, nickname, currency, account_type, mask)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                account.name,
                account.nickname,
                account.currency,
                account.account_type.map(|t| t.as_str()),
                account.mask,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_account(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Account {} vanished after insert", id)))
    }

    /// List a user's accounts, oldest first
    pub fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM accounts WHERE user_id = ? ORDER BY id",
            ACCOUNT_COLUMNS
        ))?;

        let accounts = stmt
            .query_map(params![user_id], row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Get an account by ID, scoped to its owner
    pub fn get_account(&self, user_id: i64, id: i64) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!(
                    "SELECT {} FROM accounts WHERE id = ? AND user_id = ?",
                    ACCOUNT_COLUMNS
                ),
                params![id, user_id],
                row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    /// Find the caller's account by its human-facing mask
    ///
    /// When several linked accounts share a mask the oldest one wins.
    pub fn find_account_by_mask(&self, user_id: i64, mask: &str) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!(
                    "SELECT {} FROM accounts WHERE user_id = ? AND mask = ? ORDER BY id LIMIT 1",
                    ACCOUNT_COLUMNS
                ),
                params![user_id, mask],
                row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    /// Find an account previously created by linking (user, type, mask)
    pub fn find_linked_account(
        &self,
        user_id: i64,
        account_type: AccountType,
        mask: &str,
    ) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!(
                    "SELECT {} FROM accounts WHERE user_id = ? AND account_type = ? AND mask = ? ORDER BY id LIMIT 1",
                    ACCOUNT_COLUMNS
                ),
                params![user_id, account_type.as_str(), mask],
                row_to_account,
            )
            .optional()?;
        Ok(account)
    }
}
