use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use megaphone::broadcast::{compose, BroadcastRequest};
use megaphone::config::Config;
use megaphone::dispatch::dry_run::DryRunProvider;
use megaphone::dispatch::resend::ResendProvider;
use megaphone::dispatch::DeliveryProvider;
use megaphone::segment::{resolver, SegmentFilter, TimeFilter};

/// Megaphone: segmented broadcast email for the getstuff.city waitlist.
///
/// Picks an audience from the waitlist registry, personalizes one message
/// per person, and hands the batch to Resend in a single call.
#[derive(Parser)]
#[command(name = "megaphone", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the waitlist registry
    Init,

    /// Show who a broadcast would reach
    Preview {
        /// all | claimed_username | not_claimed_username | not_referred_anyone
        #[arg(long)]
        target_group: Option<String>,

        /// Only people who signed up at least this many days ago ("any" for no cutoff)
        #[arg(long)]
        time_filter: Option<String>,

        /// Max rows to print (default: 20)
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Send a broadcast described by a JSON request file
    Send {
        /// Path to the request JSON (same shape the admin API accepts)
        file: PathBuf,

        /// Log messages instead of calling Resend
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the admin web server
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: 3000)
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// Log messages instead of calling Resend
        #[arg(long)]
        dry_run: bool,
    },

    /// Show registry status and segment sizes
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("megaphone=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing megaphone registry...");
            let config = Config::load()?;
            let db = init_database(&config).await?;
            let table_count = db.table_count().await?;
            println!("Registry initialized at: {}", db_display(&config));
            println!("Tables: {table_count}");
            println!("\nNext step: set RESEND_API_KEY in your .env file");
            println!("  (see .env.example for all variables)");
            println!("\nThen try: megaphone preview --target-group all");
        }

        Commands::Preview {
            target_group,
            time_filter,
            limit,
        } => {
            let config = Config::load()?;
            let db = open_database(&config).await?;

            let filter = SegmentFilter::from_target_group(target_group.as_deref());
            let time_filter = TimeFilter::parse(time_filter.as_deref());
            let recipients = resolver::resolve(db.as_ref(), filter, time_filter).await?;

            megaphone::output::terminal::display_segment(filter, time_filter, &recipients, limit);
        }

        Commands::Send { file, dry_run } => {
            let config = Config::load()?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let request: BroadcastRequest = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid broadcast request in {}", file.display()))?;

            let db = open_database(&config).await?;
            let provider = create_provider(&config, dry_run)?;
            let settings = config.compose_settings();

            if request.test_mode {
                println!("{}", "Test mode: sending to the built-in test recipients only".yellow());
                let preview = compose(&request, &[], &settings);
                if let Some(first) = preview.first() {
                    megaphone::output::terminal::display_message_sample(first);
                }
            }

            let outcome =
                megaphone::pipeline::run(db.as_ref(), provider.as_ref(), &settings, &request)
                    .await?;
            megaphone::output::terminal::display_send_summary(&outcome, provider.name());
        }

        #[cfg(feature = "web")]
        Commands::Serve {
            port,
            bind,
            dry_run,
        } => {
            let config = Config::load()?;
            config.require_web()?;
            let db = open_database(&config).await?;
            let provider = create_provider(&config, dry_run)?;
            megaphone::web::run_server(config, db, provider, port, &bind).await?;
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = open_database(&config).await?;
            megaphone::status::show(&db, &db_display(&config), !uses_postgres(&config)).await?;
        }
    }

    Ok(())
}

fn uses_postgres(config: &Config) -> bool {
    config
        .database_url
        .as_deref()
        .is_some_and(|url| url.starts_with("postgres://") || url.starts_with("postgresql://"))
}

/// Display-friendly registry location. Postgres URLs have their
/// credentials redacted.
fn db_display(config: &Config) -> String {
    match config.database_url.as_deref() {
        Some(url) if uses_postgres(config) => match url.find('@') {
            Some(at) => {
                let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
                format!("{}****@{}", &url[..scheme_end], &url[at + 1..])
            }
            None => url.to_string(),
        },
        _ => config.db_path.clone(),
    }
}

/// Pick the delivery provider: Resend, or the logging stand-in for --dry-run.
fn create_provider(config: &Config, dry_run: bool) -> Result<Arc<dyn DeliveryProvider>> {
    if dry_run {
        info!("Dry run: messages will be logged, not sent");
        return Ok(Arc::new(DryRunProvider));
    }
    config.require_resend()?;
    Ok(Arc::new(ResendProvider::new(
        &config.resend_api_key,
        &config.resend_api_url,
    )?))
}

/// Open the configured registry (must already exist).
async fn open_database(config: &Config) -> Result<Arc<dyn megaphone::db::Database>> {
    if let Some(url) = config.database_url.as_deref().filter(|_| uses_postgres(config)) {
        #[cfg(feature = "postgres")]
        {
            info!("Using PostgreSQL backend");
            return megaphone::db::connect_postgres(url).await;
        }
        #[cfg(not(feature = "postgres"))]
        anyhow::bail!(
            "DATABASE_URL points to PostgreSQL ({url}) but the 'postgres' feature is not compiled in.\n\
             Rebuild with: cargo build --features postgres"
        );
    }
    open_sqlite(config)
}

/// Initialize the registry (create if needed).
async fn init_database(config: &Config) -> Result<Arc<dyn megaphone::db::Database>> {
    if let Some(url) = config.database_url.as_deref().filter(|_| uses_postgres(config)) {
        #[cfg(feature = "postgres")]
        {
            info!("Using PostgreSQL backend");
            return megaphone::db::connect_postgres(url).await;
        }
        #[cfg(not(feature = "postgres"))]
        anyhow::bail!(
            "DATABASE_URL points to PostgreSQL ({url}) but the 'postgres' feature is not compiled in.\n\
             Rebuild with: cargo build --features postgres"
        );
    }
    initialize_sqlite(config)
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &Config) -> Result<Arc<dyn megaphone::db::Database>> {
    megaphone::db::open_sqlite(&config.db_path)
}

#[cfg(feature = "sqlite")]
fn initialize_sqlite(config: &Config) -> Result<Arc<dyn megaphone::db::Database>> {
    megaphone::db::initialize_sqlite(&config.db_path)
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &Config) -> Result<Arc<dyn megaphone::db::Database>> {
    anyhow::bail!("Built without the 'sqlite' feature; set DATABASE_URL to a PostgreSQL URL")
}

#[cfg(not(feature = "sqlite"))]
fn initialize_sqlite(config: &Config) -> Result<Arc<dyn megaphone::db::Database>> {
    open_sqlite(config)
}
