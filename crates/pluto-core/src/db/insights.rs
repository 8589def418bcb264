//! Narrative insight cache rows

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{try_parse_datetime, Database};
use crate::error::Result;

/// A cached narrative insight payload
#[derive(Debug, Clone)]
pub struct StoredInsight {
    pub id: i64,
    pub user_id: i64,
    /// `None` when the stored timestamp is unreadable
    pub created_at: Option<DateTime<Utc>>,
    /// Serialized `NarrativeInsights` JSON
    pub insights_json: String,
}

impl Database {
    /// Most recent cached payload for a user, if any
    pub fn latest_narrative_insight(&self, user_id: i64) -> Result<Option<StoredInsight>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT id, user_id, created_at, insights_json
                FROM narrative_insights
                WHERE user_id = ?
                ORDER BY created_at DESC, id DESC
                LIMIT 1
                "#,
                params![user_id],
                |row| {
                    let created_at: String = row.get(2)?;
                    Ok(StoredInsight {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        created_at: try_parse_datetime(&created_at),
                        insights_json: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Store a payload; the write is rolled back on failure
    pub fn save_narrative_insight(
        &self,
        user_id: i64,
        created_at: DateTime<Utc>,
        insights_json: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = conn.execute(
            "INSERT INTO narrative_insights (user_id, created_at, insights_json) VALUES (?, ?, ?)",
            params![
                user_id,
                created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                insights_json
            ],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                conn.execute("COMMIT", [])?;
                Ok(id)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e.into())
            }
        }
    }
}
