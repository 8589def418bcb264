//! Transaction listing command

use anyhow::Result;
use pluto_core::db::{Database, TransactionQuery};

use super::{find_user, truncate};

pub fn cmd_transactions_list(db: &Database, email: &str, limit: i64) -> Result<()> {
    let user = find_user(db, email)?;
    let query = TransactionQuery::new().limit(limit);
    let transactions = db.list_transactions(user.id, &query)?;
    let total = db.count_transactions(user.id, &TransactionQuery::new())?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!();
    for tx in &transactions {
        println!(
            "   {}  {:>10.2}  {:<14} {}",
            tx.date,
            tx.amount,
            truncate(tx.category.as_deref().unwrap_or("-"), 14),
            truncate(tx.description.as_deref().unwrap_or(""), 40)
        );
    }
    println!();
    println!("   Showing {} of {} transactions", transactions.len(), total);
    Ok(())
}
