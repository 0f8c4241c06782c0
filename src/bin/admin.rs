//! CLI administration tool for shortlink.
//!
//! Runs maintenance operations against the database without going through
//! the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Remove expired links now
//! cargo run --bin admin -- cleanup
//!
//! # Show statistics for a short code
//! cargo run --bin admin -- stats abc123
//!
//! # Check database connection / apply migrations
//! cargo run --bin admin -- db check
//! cargo run --bin admin -- db migrate
//! ```
//!
//! Reads the same environment variables as the server (see [`shortlink::config`]).

use shortlink::application::services::SharedResolutionService;
use shortlink::config::{self, Config};
use shortlink::domain::errors::ShortLinkError;
use shortlink::infrastructure::cache::NullCache;
use shortlink::server::{build_service, connect_pool};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing shortlink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete every link whose expiry has passed
    Cleanup {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show statistics for a short code
    Stats {
        /// The short code to inspect
        code: String,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;
    let pool = connect_pool(&config).await?;

    match cli.command {
        Commands::Cleanup { yes } => cleanup(service(&pool, &config), yes).await?,
        Commands::Stats { code } => stats(service(&pool, &config), &code).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Maintenance never needs the cache: cleanup and stats both read the store.
fn service(pool: &PgPool, config: &Config) -> Arc<SharedResolutionService> {
    build_service(pool.clone(), Arc::new(NullCache::new()), config)
}

/// Runs the expired-link sweep once, after confirmation.
async fn cleanup(service: Arc<SharedResolutionService>, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Cleanup expired links".bright_blue().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete all links whose expiry has passed?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let deleted = service
        .cleanup_expired()
        .await
        .context("Cleanup failed")?;

    println!(
        "{} {} expired link(s) removed",
        "✅".green(),
        deleted.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Prints authoritative statistics for a short code.
///
/// # Output Format
///
/// ```text
/// 📊 Statistics for abc123
///
///   Short URL:    http://localhost:8000/abc123
///   Original URL: https://example.com
///   Visits:       42
///   Created:      2025-01-15 10:30
///   Expires:      never
/// ```
async fn stats(service: Arc<SharedResolutionService>, code: &str) -> Result<()> {
    println!(
        "{} {}",
        "📊 Statistics for".bright_blue().bold(),
        code.cyan().bold()
    );
    println!();

    let stats = match service.get_stats(code).await {
        Ok(stats) => stats,
        Err(ShortLinkError::NotFound { .. }) => {
            println!("{}", "  Short code not found or expired".yellow());
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to load statistics"),
    };

    let expires = stats
        .expires_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("  Short URL:    {}", stats.short_url.bright_cyan());
    println!("  Original URL: {}", stats.original_url);
    println!(
        "  Visits:       {}",
        stats.visit_count.to_string().bright_white().bold()
    );
    println!(
        "  Created:      {}",
        stats
            .created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );
    println!("  Expires:      {}", expires.bright_black());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .context("Database check failed")?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Migrate => {
            println!("{}", "📦 Applying migrations...".bright_blue());

            sqlx::migrate!("./migrations")
                .run(pool)
                .await
                .context("Migration failed")?;

            println!("{}", "✅ Migrations applied".green().bold());
        }
    }

    Ok(())
}
