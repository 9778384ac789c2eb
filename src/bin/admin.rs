//! CLI administration tool for sink.
//!
//! Provides commands for inspecting and removing links, running statistics
//! queries, decoding stored access-log rows and checking the database
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List links
//! cargo run --bin admin -- link list --limit 50
//!
//! # Show or delete a link
//! cargo run --bin admin -- link get my-slug
//! cargo run --bin admin -- link delete my-slug
//!
//! # Views per day for one link, bucketed in Berlin time
//! cargo run --bin admin -- stats views --unit day --timezone Europe/Berlin --id n8wdo5mnzq
//!
//! # Decode a stored blob array
//! cargo run --bin admin -- log decode '["abc","https://example.com", ...]'
//!
//! # Generate a SITE_TOKEN value
//! cargo run --bin admin -- token generate
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Commands that touch the link store or the analytics engine read the same
//! environment as the server (see `sink::config`).

use sink::application::services::{LinkService, SlugPolicy, StatsService};
use sink::config::{Config, load_from_env};
use sink::domain::access_log::{LogCodec, LogSchema};
use sink::domain::entities::Link;
use sink::domain::stats::{StatsFilter, StatsQuery, TimeUnit};
use sink::infrastructure::analytics::ClickHouseAnalytics;
use sink::infrastructure::cache::{CacheService, NullCache, RedisCache};
use sink::infrastructure::persistence::PgLinkRepository;
use sink::server::connect_database;
use sink::utils::slug_generator::generate_token;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::sync::Arc;

/// Length of generated site tokens.
const SITE_TOKEN_LEN: usize = 48;

/// CLI tool for managing sink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and delete links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Run statistics queries against the analytics engine
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },

    /// Access-log utilities
    Log {
        #[command(subcommand)]
        action: LogAction,
    },

    /// Site token utilities
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// List links in slug order
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: u32,

        /// Slug to continue after
        #[arg(short, long)]
        cursor: Option<String>,
    },

    /// Show one link
    Get { slug: String },

    /// Delete a link
    Delete {
        slug: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum StatsAction {
    /// Visits and visitors per time bucket
    Views {
        /// Bucket size: hour or day
        #[arg(short, long)]
        unit: TimeUnit,

        /// IANA timezone used for bucketing
        #[arg(short, long, default_value = "Etc/UTC")]
        timezone: String,

        /// Restrict to one link id
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Subcommand)]
enum LogAction {
    /// Decode a JSON array of blobs with the v1 schema
    Decode { blobs: String },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Print a random value suitable for SITE_TOKEN
    Generate,
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Link { action } => handle_link_action(action, &load_from_env()?).await?,
        Commands::Stats { action } => handle_stats_action(action, &load_from_env()?).await?,
        Commands::Log { action } => handle_log_action(action)?,
        Commands::Token { action } => handle_token_action(action),
        Commands::Db { action } => handle_db_action(action, &load_from_env()?).await?,
    }

    Ok(())
}

/// Builds a link service over the configured database and cache.
///
/// Deleting through the service keeps Redis consistent.
async fn link_service(config: &Config) -> Result<LinkService> {
    let pool = connect_database(config).await?;
    let repository = Arc::new(PgLinkRepository::new(Arc::new(pool)));

    let cache: Arc<dyn CacheService> = match &config.redis_url {
        Some(url) => match RedisCache::connect(url, config.cache_ttl_seconds).await {
            Ok(redis) => Arc::new(redis),
            Err(e) => {
                eprintln!("{} {}", "⚠️  Redis unavailable:".yellow(), e);
                Arc::new(NullCache::new())
            }
        },
        None => Arc::new(NullCache::new()),
    };

    let policy = SlugPolicy::new(
        &config.slug_regex,
        config.slug_default_length,
        config.slug_case_sensitive,
    )
    .context("Invalid SLUG_REGEX")?;

    Ok(LinkService::new(repository, cache, policy))
}

async fn handle_link_action(action: LinkAction, config: &Config) -> Result<()> {
    let service = link_service(config).await?;

    match action {
        LinkAction::List { limit, cursor } => {
            let page = service
                .list(limit, cursor)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

            println!("{}", "📋 Links".bright_blue().bold());
            println!();

            if page.links.is_empty() {
                println!("{}", "  No links found".yellow());
                return Ok(());
            }

            println!(
                "  {:<24} {:<20} {}",
                "Slug".bright_white().bold(),
                "Created".bright_white().bold(),
                "URL".bright_white().bold()
            );
            println!("  {}", "─".repeat(75).bright_black());

            for link in &page.links {
                println!(
                    "  {:<24} {:<20} {}",
                    link.slug.cyan(),
                    format_timestamp(link.created_at).bright_black(),
                    link.url
                );
            }

            println!();
            match page.cursor {
                Some(cursor) => println!("  Next cursor: {}", cursor.bright_white().bold()),
                None => println!("  {}", "End of list".bright_black()),
            }
        }
        LinkAction::Get { slug } => {
            let link = service
                .get(&slug)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_link(&link, &config.base_url);
        }
        LinkAction::Delete { slug, yes } => {
            let link = service
                .get(&slug)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_link(&link, &config.base_url);

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete link '{}'?", link.slug))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "Cancelled".yellow());
                    return Ok(());
                }
            }

            service
                .delete(&link.slug)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to delete link: {}", e))?;
            println!("{}", "✅ Link deleted".green().bold());
        }
    }

    Ok(())
}

fn print_link(link: &Link, base_url: &str) {
    println!(
        "  {} {}/{}",
        "Short:".bright_white().bold(),
        base_url.trim_end_matches('/'),
        link.slug
    );
    println!("  {} {}", "URL:".bright_white().bold(), link.url);
    println!("  {} {}", "ID:".bright_white().bold(), link.id.bright_black());
    println!(
        "  {} {}",
        "Created:".bright_white().bold(),
        format_timestamp(link.created_at)
    );
    if let Some(expiration) = link.expiration {
        println!(
            "  {} {}",
            "Expires:".bright_white().bold(),
            format_timestamp(expiration)
        );
    }
    if let Some(title) = &link.title {
        println!("  {} {}", "Title:".bright_white().bold(), title);
    }
    println!();
}

fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| secs.to_string())
}

async fn handle_stats_action(action: StatsAction, config: &Config) -> Result<()> {
    match action {
        StatsAction::Views { unit, timezone, id } => {
            let analytics = ClickHouseAnalytics::new(&config.analytics)?;
            let service = StatsService::new(
                Arc::new(analytics),
                Arc::new(LogSchema::v1()),
                config.analytics.dataset.clone(),
            );

            let query = StatsQuery::new(unit)
                .with_timezone(timezone)
                .with_filter(StatsFilter::new().with_link_id(id));

            let statement = service
                .views_statement(&query)
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            println!("{}", "🧾 Statement".bright_blue().bold());
            println!("  {}", statement.sql.bright_black());
            for (name, value) in &statement.params {
                println!("  {}: {} = {}", name.cyan(), value.type_name(), value);
            }
            println!();

            let rows = service
                .views(&query)
                .await
                .map_err(|e| anyhow::anyhow!("Query failed: {}", e))?;

            println!("{}", "📊 Views".bright_blue().bold());
            if rows.is_empty() {
                println!("{}", "  No data".yellow());
            }
            for row in rows {
                println!(
                    "  {:<16} visits {:>8}  visitors {:>8}",
                    row.time,
                    row.visits.to_string().bright_green().bold(),
                    row.visitors.to_string().bright_green()
                );
            }
            println!();
        }
    }

    Ok(())
}

fn handle_log_action(action: LogAction) -> Result<()> {
    match action {
        LogAction::Decode { blobs } => {
            let blobs: Vec<String> =
                serde_json::from_str(&blobs).context("Expected a JSON array of strings")?;

            let codec = LogCodec::new(Arc::new(LogSchema::v1()));
            let record = codec.decode(&blobs);

            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

fn handle_token_action(action: TokenAction) {
    match action {
        TokenAction::Generate => {
            println!("{}", generate_token(SITE_TOKEN_LEN).bright_green().bold());
            println!();
            println!(
                "  Set it as {} for the server and API clients.",
                "SITE_TOKEN".bright_cyan()
            );
        }
    }
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let pool = connect_database(config).await?;
            sqlx::query("SELECT 1").fetch_one(&pool).await?;

            let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
                .fetch_one(&pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  Links: {}", links.to_string().bright_green().bold());
        }
    }

    Ok(())
}
