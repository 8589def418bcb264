//! Account commands (list, link)

use anyhow::{anyhow, Result};
use pluto_core::db::Database;
use pluto_core::models::AccountType;
use pluto_core::synth::{self, LinkRequest};

use super::{find_user, truncate};

pub fn cmd_accounts(db: &Database, email: &str) -> Result<()> {
    let user = find_user(db, email)?;
    let accounts = db.list_accounts(user.id)?;

    if accounts.is_empty() {
        println!(
            "No accounts yet. Link one with: pluto link --email {} --username <name>",
            user.email
        );
        return Ok(());
    }

    println!();
    println!(
        "   {:>4}  {:<32} {:<9} {:<6} {:>12}",
        "ID", "Name", "Type", "Mask", "Balance"
    );
    println!("   ─────────────────────────────────────────────────────────────────────");
    for account in &accounts {
        let kind = account
            .account_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:>4}  {:<32} {:<9} {:<6} {:>12.2}",
            account.id,
            truncate(account.nickname.as_deref().unwrap_or(&account.name), 32),
            kind,
            account.mask.as_deref().unwrap_or("-"),
            account.balance
        );
    }
    println!();
    Ok(())
}

pub fn cmd_link(
    db: &Database,
    email: &str,
    username: &str,
    account_type: &str,
    nickname: Option<&str>,
) -> Result<()> {
    let user = find_user(db, email)?;
    let account_type: AccountType = account_type.parse().map_err(|e: String| anyhow!(e))?;

    let request = LinkRequest {
        username: username.to_string(),
        account_type,
        nickname: nickname.map(String::from),
    };
    let today = chrono::Utc::now().date_naive();
    let (account, created) =
        db.link_fake_account(user.id, &request, synth::base_seed_from_env(), today)?;

    if created {
        let count = db
            .all_transactions(user.id)?
            .iter()
            .filter(|t| t.account_id == account.id)
            .count();
        println!(
            "🔗 Linked {} (mask {}) with {} transactions, balance {:.2}",
            account.name,
            account.mask.as_deref().unwrap_or("-"),
            count,
            account.balance
        );
    } else {
        println!(
            "ℹ️  {} (mask {}) is already linked (id {})",
            account.name,
            account.mask.as_deref().unwrap_or("-"),
            account.id
        );
    }
    Ok(())
}
