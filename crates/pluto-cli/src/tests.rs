//! CLI command tests

use pluto_core::db::Database;

use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    commands::cmd_signup(&db, "cli@example.com", "hunter2", Some("CLI User")).unwrap();
    db
}

// ========== Users ==========

#[test]
fn test_cmd_signup_normalizes_email() {
    let db = Database::in_memory().unwrap();
    commands::cmd_signup(&db, "  Mixed@Example.COM ", "pw", None).unwrap();

    let user = db.get_user_by_email("mixed@example.com").unwrap().unwrap();
    assert!(user.full_name.is_none());
    assert_ne!(user.hashed_password, "pw");
}

#[test]
fn test_cmd_signup_rejects_duplicates_and_bad_input() {
    let db = setup_test_db();
    assert!(commands::cmd_signup(&db, "cli@example.com", "again", None).is_err());
    assert!(commands::cmd_signup(&db, "no-at-sign", "pw", None).is_err());
    assert!(commands::cmd_signup(&db, "new@example.com", "", None).is_err());
    assert_eq!(db.count_users().unwrap(), 1);
}

#[test]
fn test_find_user_unknown_email() {
    let db = setup_test_db();
    assert!(commands::find_user(&db, "CLI@example.com").is_ok());
    assert!(commands::find_user(&db, "ghost@example.com").is_err());
}

// ========== Accounts ==========

#[test]
fn test_cmd_link_creates_history_once() {
    let db = setup_test_db();
    commands::cmd_link(&db, "cli@example.com", "jdoe1234", "checking", Some("Main")).unwrap();

    let user = commands::find_user(&db, "cli@example.com").unwrap();
    let accounts = db.list_accounts(user.id).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].mask.as_deref(), Some("1234"));
    assert_eq!(accounts[0].nickname.as_deref(), Some("Main"));
    let generated = db.all_transactions(user.id).unwrap().len();
    assert!(generated > 0);

    commands::cmd_link(&db, "cli@example.com", "jdoe1234", "checking", None).unwrap();
    assert_eq!(db.list_accounts(user.id).unwrap().len(), 1);
    assert_eq!(db.all_transactions(user.id).unwrap().len(), generated);
}

#[test]
fn test_cmd_link_unknown_type() {
    let db = setup_test_db();
    let result = commands::cmd_link(&db, "cli@example.com", "jdoe1234", "crypto", None);
    assert!(result.is_err());
}

#[test]
fn test_cmd_accounts_and_transactions() {
    let db = setup_test_db();
    assert!(commands::cmd_accounts(&db, "cli@example.com").is_ok());
    assert!(commands::cmd_transactions_list(&db, "cli@example.com", 5).is_ok());

    commands::cmd_link(&db, "cli@example.com", "saver", "savings", None).unwrap();
    assert!(commands::cmd_accounts(&db, "cli@example.com").is_ok());
    assert!(commands::cmd_transactions_list(&db, "cli@example.com", 5).is_ok());
    assert!(commands::cmd_accounts(&db, "ghost@example.com").is_err());
}

// ========== Insights ==========

#[test]
fn test_cmd_insights_reports() {
    let db = setup_test_db();
    commands::cmd_link(&db, "cli@example.com", "trader99", "trading", None).unwrap();

    assert!(commands::cmd_insights_score(&db, "cli@example.com").is_ok());
    assert!(commands::cmd_insights_summary(&db, "cli@example.com", 30, None).is_ok());
    assert!(commands::cmd_insights_trends(&db, "cli@example.com", 90, None).is_ok());
    assert!(commands::cmd_insights_financial(&db, "cli@example.com").is_ok());
}

#[test]
fn test_cmd_insights_invalid_window() {
    let db = setup_test_db();
    assert!(commands::cmd_insights_summary(&db, "cli@example.com", 0, None).is_err());
    assert!(commands::cmd_insights_trends(&db, "cli@example.com", 5000, None).is_err());
}

// ========== Status ==========

#[test]
fn test_cmd_init_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pluto.db");

    commands::cmd_init(&path, true).unwrap();
    assert!(path.exists());
    assert!(commands::cmd_status(&path, true).is_ok());
}

#[test]
fn test_cmd_status_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.db");
    assert!(commands::cmd_status(&path, true).is_ok());
    assert!(!path.exists());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a much longer description", 10), "a much ...");
}
