//! Pluto CLI - Personal finance backend
//!
//! Usage:
//!   pluto init                                  Initialize database
//!   pluto signup --email a@b.c --password pw    Register a user
//!   pluto link --email a@b.c --username jdoe1234 --type checking
//!   pluto insights score --email a@b.c          Health score
//!   pluto serve --port 8080                     Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt, static_dir.as_deref()).await,
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
        Commands::Signup {
            email,
            password,
            name,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_signup(&db, &email, &password, name.as_deref())
        }
        Commands::Link {
            email,
            username,
            account_type,
            nickname,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_link(&db, &email, &username, &account_type, nickname.as_deref())
        }
        Commands::Accounts { email } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_accounts(&db, &email)
        }
        Commands::Transactions { email, limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_transactions_list(&db, &email, limit)
        }
        Commands::Insights { report } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match report {
                InsightsReport::Score { email } => commands::cmd_insights_score(&db, &email),
                InsightsReport::Summary {
                    email,
                    days,
                    account,
                } => commands::cmd_insights_summary(&db, &email, days, account),
                InsightsReport::Trends {
                    email,
                    days,
                    account,
                } => commands::cmd_insights_trends(&db, &email, days, account),
                InsightsReport::Financial { email } => {
                    commands::cmd_insights_financial(&db, &email)
                }
                InsightsReport::Ai { email } => commands::cmd_insights_ai(&db, &email).await,
            }
        }
    }
}
