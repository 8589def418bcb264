//! User registration command

use anyhow::{bail, Context, Result};
use pluto_core::db::Database;
use pluto_core::security::hash_password;

pub fn cmd_signup(db: &Database, email: &str, password: &str, name: Option<&str>) -> Result<()> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        bail!("Invalid email address: {}", email);
    }
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let hashed = hash_password(password).context("Failed to hash password")?;
    let user = db.create_user(&email, &hashed, name)?;
    db.log_audit(Some(user.id), "signup", Some("user"), Some(user.id), Some("source=cli"))?;

    println!("✅ Registered {} (id {})", user.email, user.id);
    Ok(())
}
