//! CLI argument definitions using clap
//!
//! The command implementations live in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Pluto - Personal finance backend with synthetic bank data and insights
#[derive(Parser)]
#[command(name = "pluto")]
#[command(about = "Personal finance backend with spending analytics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "pluto.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set PLUTO_DB_KEY environment variable with your passphrase.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Directory containing static files to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Register a user
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Full name
        #[arg(long)]
        name: Option<String>,
    },

    /// Link a fake institution account and generate its history
    Link {
        /// Owner's email
        #[arg(long)]
        email: String,

        /// Institution username (the last 4 characters become the mask)
        #[arg(long)]
        username: String,

        /// Account type: checking, savings, trading
        #[arg(long = "type", default_value = "checking")]
        account_type: String,

        #[arg(long)]
        nickname: Option<String>,
    },

    /// List a user's accounts
    Accounts {
        #[arg(long)]
        email: String,
    },

    /// List a user's most recent transactions
    Transactions {
        #[arg(long)]
        email: String,

        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Run analytics for a user
    Insights {
        #[command(subcommand)]
        report: InsightsReport,
    },

    /// Show database status (encryption, size, counts)
    Status,
}

#[derive(Subcommand)]
pub enum InsightsReport {
    /// 30-day financial health score
    Score {
        #[arg(long)]
        email: String,
    },

    /// Spending summary over a trailing window
    Summary {
        #[arg(long)]
        email: String,

        #[arg(long, default_value = "30")]
        days: i64,

        /// Restrict to one account id
        #[arg(long)]
        account: Option<i64>,
    },

    /// Daily spending trend over a trailing window
    Trends {
        #[arg(long)]
        email: String,

        #[arg(long, default_value = "90")]
        days: i64,

        #[arg(long)]
        account: Option<i64>,
    },

    /// Balances and all-time totals
    Financial {
        #[arg(long)]
        email: String,
    },

    /// Narrative insights from the configured text-generation backend
    Ai {
        #[arg(long)]
        email: String,
    },
}
