//! Analytics report commands
//!
//! Reports print as pretty JSON, the same shapes the API returns.

use anyhow::Result;
use chrono::Utc;
use pluto_core::ai::AIClient;
use pluto_core::analytics::Window;
use pluto_core::db::Database;
use pluto_core::narrative::NarrativeInsightService;

use super::find_user;

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn cmd_insights_score(db: &Database, email: &str) -> Result<()> {
    let user = find_user(db, email)?;
    let score = db.pluto_score(user.id, Utc::now().date_naive())?;
    print_json(&score)
}

pub fn cmd_insights_summary(
    db: &Database,
    email: &str,
    days: i64,
    account_id: Option<i64>,
) -> Result<()> {
    let user = find_user(db, email)?;
    let window = Window::trailing(days, Utc::now().date_naive())?;
    let summary = db.spending_summary(user.id, &window, account_id)?;
    print_json(&summary)
}

pub fn cmd_insights_trends(
    db: &Database,
    email: &str,
    days: i64,
    account_id: Option<i64>,
) -> Result<()> {
    let user = find_user(db, email)?;
    let window = Window::trailing(days, Utc::now().date_naive())?;
    let trends = db.spending_trends(user.id, &window, account_id)?;
    print_json(&trends)
}

pub fn cmd_insights_financial(db: &Database, email: &str) -> Result<()> {
    let user = find_user(db, email)?;
    let summary = db.financial_summary(user.id, Utc::now().date_naive())?;
    print_json(&summary)
}

pub async fn cmd_insights_ai(db: &Database, email: &str) -> Result<()> {
    let user = find_user(db, email)?;
    let ai = AIClient::from_env();
    if ai.is_none() {
        println!("   💡 Tip: Set GEMINI_API_KEY (or AI_BACKEND=openai_compatible) for narrative insights");
    }
    let service = NarrativeInsightService::new(db.clone(), ai);
    let insights = service.get_insights(user.id).await;
    print_json(&insights)
}
