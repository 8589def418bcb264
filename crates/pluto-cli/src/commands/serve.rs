//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_encrypt: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Pluto API server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    let config = pluto_server::ServerConfig::from_env();
    if config.allowed_origins.is_empty() {
        println!("   🌐 CORS: same-origin only");
    } else {
        println!("   🌐 CORS origins: {}", config.allowed_origins.join(", "));
    }
    println!(
        "   🔑 Token lifetime: {}s (JWT_EXPIRES_SECONDS)",
        config.jwt.expires_seconds
    );
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    pluto_server::serve(db, host, port, static_dir_str, config).await?;

    Ok(())
}
