//! Core command implementations and shared utilities
//!
//! - `open_db` - Open the database
//! - `find_user` - Resolve a user by email
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use pluto_core::db::Database;
use pluto_core::models::User;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Look up a user by email (case-insensitive), failing when absent
pub fn find_user(db: &Database, email: &str) -> Result<User> {
    let email = email.trim().to_lowercase();
    db.get_user_by_email(&email)?
        .with_context(|| format!("No user registered with email {}", email))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Register: pluto signup --email you@example.com --password secret");
    println!("  2. Link an account: pluto link --email you@example.com --username jdoe1234");
    println!("  3. Start the API: pluto serve");

    Ok(())
}
