//! Narrative insights from a text-generation backend
//!
//! The caller's transaction history is sent with a fixed prompt; the reply
//! is fence-stripped and strictly decoded into [`NarrativeInsights`]. Any
//! failure becomes a typed [`InsightFailure`] which the service turns into a
//! single fallback insight. Successful results are cached per user for 30 days.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::{AIBackend, AIClient};
use crate::db::Database;
use crate::models::Transaction;

/// Cached insights are reused while younger than this
pub const CACHE_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    SpendingReduction,
    EmergencyFund,
    CashFlow,
    Subscriptions,
    Goals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightTrend {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoints {
    pub primary_metric: String,
    pub comparison_period: String,
    pub supporting_details: String,
}

/// One narrative insight card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeInsight {
    pub id: i64,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub action_text: String,
    pub trend_direction: InsightTrend,
    pub impact_level: ImpactLevel,
    pub priority: i64,
    pub data_points: DataPoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeInsights {
    pub insights: Vec<NarrativeInsight>,
}

/// Why a generation attempt produced no usable insights
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InsightFailure {
    #[error("insight service unavailable: {0}")]
    Unavailable(String),
    #[error("insight service returned no content")]
    Empty,
    #[error("insight response is not valid JSON: {0}")]
    Malformed(String),
    #[error("insight response does not match the schema: {0}")]
    SchemaMismatch(String),
}

impl InsightFailure {
    /// User-facing description placed in the fallback insight
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "The insight service is currently unavailable.",
            Self::Empty => "The insight service did not return any content.",
            Self::Malformed(_) => "Failed to parse the insight service's JSON response.",
            Self::SchemaMismatch(_) => "The insight service returned an invalid JSON structure.",
        }
    }
}

/// The fixed single-item payload returned when generation fails
pub fn fallback_insights(description: &str) -> NarrativeInsights {
    let na = || "N/A".to_string();
    NarrativeInsights {
        insights: vec![NarrativeInsight {
            id: 0,
            insight_type: InsightType::Goals,
            title: "No insights available".to_string(),
            description: description.to_string(),
            action_text: "Try Again".to_string(),
            trend_direction: InsightTrend::Neutral,
            impact_level: ImpactLevel::Low,
            priority: 1,
            data_points: DataPoints {
                primary_metric: na(),
                comparison_period: na(),
                supporting_details: na(),
            },
        }],
    }
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?m)^```json\s*|^```\s*|```$").expect("valid regex"))
}

/// Remove Markdown code fences around a JSON reply
pub fn strip_code_fences(raw: &str) -> String {
    fence_regex().replace_all(raw, "").trim().to_string()
}

/// Strictly decode a raw backend reply
pub fn decode_insights(raw: &str) -> Result<NarrativeInsights, InsightFailure> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(InsightFailure::Empty);
    }

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| InsightFailure::Malformed(e.to_string()))?;

    match value.get("insights") {
        Some(serde_json::Value::Array(_)) => {}
        Some(_) => {
            return Err(InsightFailure::SchemaMismatch(
                "`insights` is not an array".to_string(),
            ))
        }
        None => {
            return Err(InsightFailure::SchemaMismatch(
                "missing `insights` key".to_string(),
            ))
        }
    }

    serde_json::from_value(value).map_err(|e| InsightFailure::SchemaMismatch(e.to_string()))
}

/// Wire shape of a transaction in the prompt snapshot
#[derive(Serialize)]
struct SnapshotRow<'a> {
    id: i64,
    user_id: i64,
    account_id: i64,
    date: String,
    amount: f64,
    category: Option<&'a str>,
    description: Option<&'a str>,
}

/// Build the prompt: fixed instructions followed by a JSON snapshot
pub fn build_prompt(transactions: &[Transaction]) -> String {
    let rows: Vec<SnapshotRow> = transactions
        .iter()
        .map(|t| SnapshotRow {
            id: t.id,
            user_id: t.user_id,
            account_id: t.account_id,
            date: t.date.format("%Y-%m-%d").to_string(),
            amount: if t.amount.is_finite() { t.amount } else { 0.0 },
            category: t.category.as_deref(),
            description: t.description.as_deref(),
        })
        .collect();
    let snapshot = serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Given the following list of financial transactions, generate a single JSON object with financial insights and recommendations.
The object must have a key "insights" which is an array of insight objects.
Each insight object must follow this format:
{{
  "id": 1,
  "type": "spending_reduction|emergency_fund|cash_flow|subscriptions|goals",
  "title": "Engaging headline (max 60 chars)",
  "description": "Helpful explanation with data (max 100 chars)",
  "action_text": "Button text (max 20 chars)",
  "trend_direction": "up|down|neutral",
  "impact_level": "high|medium|low",
  "priority": 1,
  "data_points": {{
    "primary_metric": "Main number/percentage",
    "comparison_period": "Context period",
    "supporting_details": "Additional context"
  }}
}}
Respond with JSON only.
Transactions: {}"#,
        snapshot
    )
}

/// Cached, fallback-safe narrative insight retrieval
#[derive(Clone)]
pub struct NarrativeInsightService {
    db: Database,
    ai: Option<AIClient>,
}

impl NarrativeInsightService {
    pub fn new(db: Database, ai: Option<AIClient>) -> Self {
        Self { db, ai }
    }

    /// Insights for `user_id`; never fails, degrading to the fallback payload
    pub async fn get_insights(&self, user_id: i64) -> NarrativeInsights {
        self.get_insights_at(user_id, Utc::now()).await
    }

    /// As [`get_insights`](Self::get_insights) with an explicit clock
    pub async fn get_insights_at(&self, user_id: i64, now: DateTime<Utc>) -> NarrativeInsights {
        if let Some(cached) = self.cached(user_id, now) {
            debug!(user_id, "Narrative insight cache hit");
            return cached;
        }

        match self.generate(user_id).await {
            Ok(insights) => {
                self.store(user_id, now, &insights);
                insights
            }
            Err(failure) => {
                warn!(user_id, error = %failure, "Narrative insight generation failed, using fallback");
                fallback_insights(failure.reason())
            }
        }
    }

    /// Fresh cache entry, if any; read or decode problems count as a miss
    fn cached(&self, user_id: i64, now: DateTime<Utc>) -> Option<NarrativeInsights> {
        let row = match self.db.latest_narrative_insight(user_id) {
            Ok(row) => row?,
            Err(e) => {
                warn!(user_id, error = %e, "Narrative insight cache read failed");
                return None;
            }
        };

        let Some(created_at) = row.created_at else {
            warn!(user_id, row_id = row.id, "Cached narrative insight has an unreadable timestamp");
            return None;
        };
        if now - created_at >= Duration::days(CACHE_TTL_DAYS) {
            debug!(user_id, cached_at = %created_at, "Narrative insight cache expired");
            return None;
        }

        match serde_json::from_str(&row.insights_json) {
            Ok(insights) => Some(insights),
            Err(e) => {
                warn!(user_id, error = %e, "Cached narrative insights are unreadable");
                None
            }
        }
    }

    fn store(&self, user_id: i64, now: DateTime<Utc>, insights: &NarrativeInsights) {
        let json = match serde_json::to_string(insights) {
            Ok(json) => json,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to serialize narrative insights for cache");
                return;
            }
        };
        if let Err(e) = self.db.save_narrative_insight(user_id, now, &json) {
            warn!(user_id, error = %e, "Narrative insight cache write failed");
        }
    }

    /// One uncached generation attempt
    pub async fn generate(&self, user_id: i64) -> Result<NarrativeInsights, InsightFailure> {
        let ai = self.ai.as_ref().ok_or_else(|| {
            InsightFailure::Unavailable("no text-generation backend configured".to_string())
        })?;

        let transactions = self
            .db
            .all_transactions(user_id)
            .map_err(|e| InsightFailure::Unavailable(format!("transaction snapshot: {}", e)))?;

        let prompt = build_prompt(&transactions);
        let raw = ai
            .generate(&prompt)
            .await
            .map_err(|e| InsightFailure::Unavailable(e.to_string()))?;

        let insights = decode_insights(&raw)?;
        info!(
            user_id,
            model = %ai.model(),
            count = insights.insights.len(),
            "Generated narrative insights"
        );
        Ok(insights)
    }
}

#[cfg(test)]
mod tests;
