//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - init and shared utilities (open_db, find_user)
//! - `serve` - Web server command
//! - `status` - Database status
//! - `users` - User registration
//! - `accounts` - Account listing and fake-institution linking
//! - `transactions` - Transaction listing
//! - `insights` - Analytics and narrative insight reports

pub mod accounts;
pub mod core;
pub mod insights;
pub mod serve;
pub mod status;
pub mod transactions;
pub mod users;

// Re-export command functions for main.rs
pub use accounts::*;
pub use core::*;
pub use insights::*;
pub use serve::*;
pub use status::*;
pub use transactions::*;
pub use users::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
