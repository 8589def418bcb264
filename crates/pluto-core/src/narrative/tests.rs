use chrono::{Duration, NaiveDate, TimeZone, Utc};

use super::*;
use crate::ai::MockBackend;
use crate::models::{NewAccount, NewTransaction};
use crate::test_utils::MockGenerativeServer;

const VALID_REPLY: &str = r#"```json
{
  "insights": [
    {
      "id": 1,
      "type": "subscriptions",
      "title": "Streaming adds up",
      "description": "You spend $58.97 a month on subscriptions",
      "action_text": "Review",
      "trend_direction": "up",
      "impact_level": "medium",
      "priority": 2,
      "data_points": {
        "primary_metric": "$58.97",
        "comparison_period": "last 3 months",
        "supporting_details": "3 recurring charges"
      }
    }
  ]
}
```"#;

fn setup_user(db: &Database) -> i64 {
    let user = db
        .create_user("narrative@example.com", "hash", None)
        .unwrap();
    let account = db
        .create_account(
            user.id,
            &NewAccount {
                name: "Checking".to_string(),
                nickname: None,
                currency: "USD".to_string(),
                account_type: None,
                mask: None,
            },
        )
        .unwrap();
    db.insert_transaction(
        user.id,
        account.id,
        &NewTransaction {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            amount: -15.99,
            category: Some("Subscriptions".to_string()),
            description: Some("Netflix".to_string()),
        },
    )
    .unwrap();
    user.id
}

fn service_with(db: &Database, mock: &MockBackend) -> NarrativeInsightService {
    NarrativeInsightService::new(db.clone(), Some(AIClient::Mock(mock.clone())))
}

#[test]
fn test_strip_code_fences() {
    assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
    assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
}

#[test]
fn test_decode_valid_reply() {
    let decoded = decode_insights(VALID_REPLY).unwrap();
    assert_eq!(decoded.insights.len(), 1);
    let insight = &decoded.insights[0];
    assert_eq!(insight.insight_type, InsightType::Subscriptions);
    assert_eq!(insight.trend_direction, InsightTrend::Up);
    assert_eq!(insight.impact_level, ImpactLevel::Medium);
    assert_eq!(insight.data_points.primary_metric, "$58.97");
}

#[test]
fn test_decode_empty_list_is_valid() {
    let decoded = decode_insights(r#"{"insights": []}"#).unwrap();
    assert!(decoded.insights.is_empty());
}

#[test]
fn test_decode_failures_are_typed() {
    assert_eq!(decode_insights("   "), Err(InsightFailure::Empty));
    assert_eq!(decode_insights("```json\n```"), Err(InsightFailure::Empty));
    assert!(matches!(
        decode_insights("not json at all"),
        Err(InsightFailure::Malformed(_))
    ));
    assert!(matches!(
        decode_insights("```json\n{\"bad\":true}\n```"),
        Err(InsightFailure::SchemaMismatch(_))
    ));
    assert!(matches!(
        decode_insights(r#"{"insights": {"id": 1}}"#),
        Err(InsightFailure::SchemaMismatch(_))
    ));
    // Element with an unknown type value
    assert!(matches!(
        decode_insights(r#"{"insights": [{"id": 1, "type": "lottery"}]}"#),
        Err(InsightFailure::SchemaMismatch(_))
    ));
}

#[test]
fn test_fallback_shape() {
    let fallback = fallback_insights("Nothing here.");
    assert_eq!(fallback.insights.len(), 1);
    let item = &fallback.insights[0];
    assert_eq!(item.id, 0);
    assert_eq!(item.insight_type, InsightType::Goals);
    assert_eq!(item.title, "No insights available");
    assert_eq!(item.description, "Nothing here.");
    assert_eq!(item.action_text, "Try Again");
    assert_eq!(item.trend_direction, InsightTrend::Neutral);
    assert_eq!(item.impact_level, ImpactLevel::Low);
    assert_eq!(item.priority, 1);
    assert_eq!(item.data_points.supporting_details, "N/A");

    let json = serde_json::to_value(&fallback).unwrap();
    assert_eq!(json["insights"][0]["type"], "goals");
}

#[test]
fn test_prompt_contains_schema_and_snapshot() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let prompt = build_prompt(&db.all_transactions(user_id).unwrap());

    assert!(prompt.contains("spending_reduction|emergency_fund|cash_flow|subscriptions|goals"));
    assert!(prompt.contains("\"date\":\"2024-06-03\""));
    assert!(prompt.contains("Netflix"));
    assert!(prompt.trim_end().ends_with(']'));
}

#[tokio::test]
async fn test_schema_mismatch_returns_fallback_and_is_not_cached() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let mock = MockBackend::with_reply("```json\n{\"bad\":true}\n```");
    let service = service_with(&db, &mock);

    let result = service.get_insights(user_id).await;
    assert_eq!(result.insights.len(), 1);
    assert_eq!(result.insights[0].id, 0);
    assert_eq!(result.insights[0].title, "No insights available");
    assert!(db.latest_narrative_insight(user_id).unwrap().is_none());

    // Not cached, so the next call asks the backend again
    service.get_insights(user_id).await;
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn test_success_is_cached_and_reused() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let mock = MockBackend::with_reply(VALID_REPLY);
    let service = service_with(&db, &mock);
    let now = Utc.with_ymd_and_hms(2024, 6, 18, 12, 0, 0).unwrap();

    let first = service.get_insights_at(user_id, now).await;
    assert_eq!(first.insights[0].id, 1);
    assert_eq!(mock.calls(), 1);

    let second = service
        .get_insights_at(user_id, now + Duration::days(29))
        .await;
    assert_eq!(second, first);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_stale_cache_regenerates() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let mock = MockBackend::with_reply(VALID_REPLY);
    let service = service_with(&db, &mock);
    let now = Utc.with_ymd_and_hms(2024, 6, 18, 12, 0, 0).unwrap();

    let stale = serde_json::to_string(&fallback_insights("old")).unwrap();
    db.save_narrative_insight(user_id, now - Duration::days(30), &stale)
        .unwrap();

    let result = service.get_insights_at(user_id, now).await;
    assert_eq!(result.insights[0].id, 1);
    assert_eq!(mock.calls(), 1);

    let latest = db.latest_narrative_insight(user_id).unwrap().unwrap();
    assert_eq!(latest.created_at, Some(now));
}

#[tokio::test]
async fn test_unreadable_cache_counts_as_miss() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let mock = MockBackend::with_reply(VALID_REPLY);
    let service = service_with(&db, &mock);
    let now = Utc.with_ymd_and_hms(2024, 6, 18, 12, 0, 0).unwrap();

    db.save_narrative_insight(user_id, now, "{not json").unwrap();

    let result = service.get_insights_at(user_id, now).await;
    assert_eq!(result.insights[0].id, 1);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_corrupt_cache_timestamp_counts_as_miss() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let mock = MockBackend::with_reply(VALID_REPLY);
    let service = service_with(&db, &mock);
    let now = Utc.with_ymd_and_hms(2024, 6, 18, 12, 0, 0).unwrap();

    let cached = serde_json::to_string(&fallback_insights("frozen")).unwrap();
    db.conn()
        .unwrap()
        .execute(
            "INSERT INTO narrative_insights (user_id, created_at, insights_json) VALUES (?, 'not a date', ?)",
            rusqlite::params![user_id, cached],
        )
        .unwrap();
    assert_eq!(
        db.latest_narrative_insight(user_id).unwrap().unwrap().created_at,
        None
    );

    let result = service.get_insights_at(user_id, now).await;
    assert_eq!(result.insights[0].id, 1);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_cache_write_failure_still_returns_result() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let mock = MockBackend::with_reply(VALID_REPLY);
    let service = service_with(&db, &mock);

    db.conn()
        .unwrap()
        .execute_batch("DROP TABLE narrative_insights;")
        .unwrap();

    let result = service.get_insights(user_id).await;
    assert_eq!(result.insights[0].id, 1);
    assert_eq!(result.insights[0].title, "Streaming adds up");

    // Nothing was cached, so the next call asks the backend again
    let again = service.get_insights(user_id).await;
    assert_eq!(again, result);
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn test_unavailable_reason_hides_api_key() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let client = AIClient::gemini("http://127.0.0.1:1", "gemini-2.5-flash", "SECRET_KEY_123");
    let service = NarrativeInsightService::new(db.clone(), Some(client));

    match service.generate(user_id).await {
        Err(failure @ InsightFailure::Unavailable(_)) => {
            let text = failure.to_string();
            assert!(!text.contains("SECRET_KEY_123"), "key leaked: {}", text);
        }
        other => panic!("expected Unavailable, got {:?}", other),
    }

    let result = service.get_insights(user_id).await;
    assert_eq!(result.insights[0].id, 0);
}

#[tokio::test]
async fn test_backend_failure_returns_fallback() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let service = service_with(&db, &MockBackend::failing("connection refused"));

    let result = service.get_insights(user_id).await;
    assert_eq!(result.insights[0].id, 0);
    assert_eq!(
        result.insights[0].description,
        InsightFailure::Unavailable(String::new()).reason()
    );
    assert!(matches!(
        service.generate(user_id).await,
        Err(InsightFailure::Unavailable(_))
    ));
}

#[tokio::test]
async fn test_no_backend_configured() {
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let service = NarrativeInsightService::new(db.clone(), None);

    let result = service.get_insights(user_id).await;
    assert_eq!(result.insights[0].title, "No insights available");
    assert!(db.latest_narrative_insight(user_id).unwrap().is_none());
}

#[tokio::test]
async fn test_cache_is_per_user() {
    let db = Database::in_memory().unwrap();
    let first_user = setup_user(&db);
    let second_user = db
        .create_user("other@example.com", "hash", None)
        .unwrap()
        .id;
    let mock = MockBackend::with_reply(VALID_REPLY);
    let service = service_with(&db, &mock);

    service.get_insights(first_user).await;
    service.get_insights(second_user).await;
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn test_gemini_backend_end_to_end() {
    let server = MockGenerativeServer::start(VALID_REPLY).await;
    let db = Database::in_memory().unwrap();
    let user_id = setup_user(&db);
    let service = NarrativeInsightService::new(
        db.clone(),
        Some(AIClient::gemini(&server.url(), "gemini-2.5-flash", "test-key")),
    );

    let result = service.get_insights(user_id).await;
    assert_eq!(result.insights[0].insight_type, InsightType::Subscriptions);
    assert_eq!(server.request_count(), 1);

    server.set_reply(None);
    let cached = service.get_insights(user_id).await;
    assert_eq!(cached, result);
    assert_eq!(server.request_count(), 1);
}
