//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_account(name: &str) -> NewAccount {
        NewAccount {
            name: name.to_string(),
            nickname: None,
            currency: "USD".to_string(),
            account_type: Some(AccountType::Checking),
            mask: Some("1234".to_string()),
        }
    }

    fn new_tx(d: NaiveDate, amount: f64, category: &str) -> NewTransaction {
        NewTransaction {
            date: d,
            amount,
            category: Some(category.to_string()),
            description: Some(format!("{} purchase", category)),
        }
    }

    /// One user with one account
    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("alice@example.com", "hash", Some("Alice")).unwrap();
        let account = db.create_account(user.id, &new_account("Everyday")).unwrap();
        (db, user.id, account.id)
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.count_users().unwrap(), 0);
        assert!(db.list_audit_log(10).unwrap().is_empty());
        assert!(!db.is_encrypted());
    }

    #[test]
    fn test_keyed_database_reopens_with_same_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyed.db");
        let path = path.to_str().unwrap();

        let db = Database::new_with_key(path, Some("correct horse")).unwrap();
        assert!(db.is_encrypted());
        db.create_user("keyed@example.com", "hash", None).unwrap();
        drop(db);

        let reopened = Database::new_with_key(path, Some("correct horse")).unwrap();
        assert!(reopened.is_encrypted());
        assert_eq!(reopened.count_users().unwrap(), 1);
    }

    #[test]
    fn test_schema_tables_exist() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        for table in [
            "users",
            "accounts",
            "transactions",
            "narrative_insights",
            "audit_log",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_create_and_fetch_user() {
        let db = Database::in_memory().unwrap();
        let user = db
            .create_user("bob@example.com", "phc-string", Some("Bob"))
            .unwrap();
        assert!(user.id > 0);
        assert_eq!(user.full_name.as_deref(), Some("Bob"));

        let by_email = db.get_user_by_email("bob@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.hashed_password, "phc-string");

        assert!(db.get_user(user.id + 100).unwrap().is_none());
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let db = Database::in_memory().unwrap();
        db.create_user("dup@example.com", "h1", None).unwrap();

        let err = db.create_user("dup@example.com", "h2", None).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_user_json_hides_password() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("hide@example.com", "secret", None).unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert_eq!(json["email"], "hide@example.com");
    }

    #[test]
    fn test_account_crud() {
        let (db, user_id, account_id) = setup();

        let account = db.get_account(user_id, account_id).unwrap().unwrap();
        assert_eq!(account.name, "Everyday");
        assert_eq!(account.account_type, Some(AccountType::Checking));
        assert_eq!(account.balance, 0.0);

        db.create_account(user_id, &new_account("Second")).unwrap();
        let accounts = db.list_accounts(user_id).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, account_id);
    }

    #[test]
    fn test_accounts_are_scoped_to_owner() {
        let (db, _alice, account_id) = setup();
        let mallory = db.create_user("mallory@example.com", "hash", None).unwrap();

        assert!(db.list_accounts(mallory.id).unwrap().is_empty());
        assert!(db.get_account(mallory.id, account_id).unwrap().is_none());
        assert!(db.find_account_by_mask(mallory.id, "1234").unwrap().is_none());
    }

    #[test]
    fn test_find_accounts_by_mask() {
        let (db, user_id, account_id) = setup();

        let found = db.find_account_by_mask(user_id, "1234").unwrap().unwrap();
        assert_eq!(found.id, account_id);
        assert!(db.find_account_by_mask(user_id, "9999").unwrap().is_none());

        let linked = db
            .find_linked_account(user_id, AccountType::Checking, "1234")
            .unwrap();
        assert_eq!(linked.map(|a| a.id), Some(account_id));
        assert!(db
            .find_linked_account(user_id, AccountType::Savings, "1234")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_insert_transaction_updates_balance() {
        let (db, user_id, account_id) = setup();

        let tx = db
            .insert_transaction(user_id, account_id, &new_tx(date(2024, 6, 1), 3000.0, "Income"))
            .unwrap();
        assert!(tx.id > 0);
        assert_eq!(tx.user_id, user_id);
        db.insert_transaction(user_id, account_id, &new_tx(date(2024, 6, 2), -120.25, "Groceries"))
            .unwrap();

        let account = db.get_account(user_id, account_id).unwrap().unwrap();
        assert!((account.balance - 2879.75).abs() < 1e-9);
    }

    #[test]
    fn test_insert_transaction_foreign_account() {
        let (db, _alice, account_id) = setup();
        let mallory = db.create_user("mallory@example.com", "hash", None).unwrap();

        let err = db
            .insert_transaction(mallory.id, account_id, &new_tx(date(2024, 6, 1), -1.0, "Other"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(db.all_transactions(mallory.id).unwrap().is_empty());
    }

    #[test]
    fn test_list_transactions_filters_and_order() {
        let (db, user_id, account_id) = setup();
        let other = db.create_account(user_id, &new_account("Other")).unwrap();

        db.insert_transaction(user_id, account_id, &new_tx(date(2024, 6, 1), -10.0, "Dining"))
            .unwrap();
        db.insert_transaction(user_id, account_id, &new_tx(date(2024, 6, 3), -20.0, "Groceries"))
            .unwrap();
        db.insert_transaction(user_id, other.id, &new_tx(date(2024, 6, 2), -30.0, "Dining"))
            .unwrap();
        db.insert_transaction(user_id, account_id, &new_tx(date(2024, 6, 3), -40.0, "Dining"))
            .unwrap();

        // Newest date first; same date by id descending
        let all = db.list_transactions(user_id, &TransactionQuery::new()).unwrap();
        let amounts: Vec<f64> = all.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![-40.0, -20.0, -30.0, -10.0]);

        let dining = TransactionQuery::new().category(Some("Dining"));
        assert_eq!(db.list_transactions(user_id, &dining).unwrap().len(), 3);
        assert_eq!(db.count_transactions(user_id, &dining).unwrap(), 3);

        let by_account = TransactionQuery::new().account_id(Some(other.id));
        let rows = db.list_transactions(user_id, &by_account).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, -30.0);

        let range = TransactionQuery::new().date_range(Some(date(2024, 6, 2)), Some(date(2024, 6, 2)));
        assert_eq!(db.count_transactions(user_id, &range).unwrap(), 1);

        let page = TransactionQuery::new().limit(2).offset(1);
        let rows = db.list_transactions(user_id, &page).unwrap();
        assert_eq!(rows.iter().map(|t| t.amount).collect::<Vec<_>>(), vec![-20.0, -30.0]);
        // Count ignores paging
        assert_eq!(db.count_transactions(user_id, &page).unwrap(), 4);
    }

    #[test]
    fn test_query_limit_clamped() {
        assert_eq!(TransactionQuery::new().limit, DEFAULT_LIMIT);
        assert_eq!(TransactionQuery::new().limit(0).limit, 1);
        assert_eq!(TransactionQuery::new().limit(50_000).limit, MAX_LIMIT);
        assert_eq!(TransactionQuery::new().offset(-5).offset, 0);
    }

    #[test]
    fn test_transactions_are_scoped_to_owner() {
        let (db, user_id, account_id) = setup();
        db.insert_transaction(user_id, account_id, &new_tx(date(2024, 6, 1), -10.0, "Dining"))
            .unwrap();
        let mallory = db.create_user("mallory@example.com", "hash", None).unwrap();

        assert!(db
            .list_transactions(mallory.id, &TransactionQuery::new())
            .unwrap()
            .is_empty());
        assert_eq!(
            db.count_transactions(mallory.id, &TransactionQuery::new().account_id(Some(account_id)))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_transactions_in_window_inclusive() {
        let (db, user_id, account_id) = setup();
        for day in [1, 5, 10, 15] {
            db.insert_transaction(user_id, account_id, &new_tx(date(2024, 6, day), -5.0, "Dining"))
                .unwrap();
        }

        let window = db
            .transactions_in_window(user_id, date(2024, 6, 5), date(2024, 6, 10), None)
            .unwrap();
        let days: Vec<NaiveDate> = window.iter().map(|t| t.date).collect();
        assert_eq!(days, vec![date(2024, 6, 5), date(2024, 6, 10)]);

        let none = db
            .transactions_in_window(user_id, date(2024, 6, 1), date(2024, 6, 30), Some(account_id + 100))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_narrative_insight_cache_rows() {
        let (db, user_id, _) = setup();
        assert!(db.latest_narrative_insight(user_id).unwrap().is_none());

        let older = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        db.save_narrative_insight(user_id, newer, r#"{"insights":[]}"#).unwrap();
        db.save_narrative_insight(user_id, older, r#"{"insights":[1]}"#).unwrap();

        let latest = db.latest_narrative_insight(user_id).unwrap().unwrap();
        assert_eq!(latest.created_at, Some(newer));
        assert_eq!(latest.insights_json, r#"{"insights":[]}"#);

        let stranger = db.create_user("stranger@example.com", "hash", None).unwrap();
        assert!(db.latest_narrative_insight(stranger.id).unwrap().is_none());
    }

    #[test]
    fn test_audit_log() {
        let (db, user_id, account_id) = setup();

        db.log_audit(Some(user_id), "create", Some("account"), Some(account_id), None)
            .unwrap();
        db.log_audit(None, "login_failed", Some("user"), None, Some("bad password"))
            .unwrap();

        let entries = db.list_audit_log(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "login_failed");
        assert_eq!(entries[0].user_id, None);
        assert_eq!(entries[1].entity_id, Some(account_id));

        assert_eq!(db.list_audit_log(1).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let sqlite = parse_datetime("2024-06-01 08:30:00");
        assert_eq!(sqlite, Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap());

        let rfc = parse_datetime("2024-06-01T08:30:00+00:00");
        assert_eq!(rfc, sqlite);

        assert_eq!(try_parse_datetime("yesterday-ish"), None);
    }
}
