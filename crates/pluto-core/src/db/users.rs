//! User operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

const USER_COLUMNS: &str = "id, email, hashed_password, full_name, created_at";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let created_at: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        hashed_password: row.get(2)?,
        full_name: row.get(3)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Create a user with an already-hashed password
    ///
    /// Returns `Error::Conflict` when the email is taken.
    pub fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        full_name: Option<&str>,
    ) -> Result<User> {
        if self.get_user_by_email(email)?.is_some() {
            return Err(Error::Conflict("Email already registered".to_string()));
        }

        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO users (email, hashed_password, full_name) VALUES (?, ?, ?)",
            params![email, hashed_password, full_name],
        );

        match inserted {
            Ok(_) => {}
            // Lost a race with a concurrent signup
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::Conflict("Email already registered".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("User {} vanished after insert", id)))
    }

    /// Get a user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by email (exact match, callers normalize)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Count registered users
    pub fn count_users(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}
