mod import;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pdash-cli")]
#[command(about = "Product analytics ingestion command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest a spreadsheet (xlsx, xls, csv) into the products table
    Import {
        /// Path to the spreadsheet
        path: PathBuf,
        /// Records per upsert statement (defaults to `PDASH_INGEST_BATCH_SIZE`)
        #[arg(long, value_parser = import::parse_batch_size)]
        batch_size: Option<usize>,
        /// Parse and validate only; print what would be written
        #[arg(long)]
        dry_run: bool,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Dry runs never load the full config, so the log level is read directly.
    let log_level = std::env::var("PDASH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Import {
            path,
            batch_size,
            dry_run: true,
        }) => {
            if batch_size.is_some() {
                tracing::debug!("--batch-size has no effect on a dry run");
            }
            import::run_dry_run(&path).await?;
        }
        Some(Commands::Import {
            path,
            batch_size,
            dry_run: false,
        }) => {
            let config = pdash_core::load_app_config()?;
            let pool = connect(&config).await?;
            pdash_db::run_migrations(&pool).await?;
            let batch_size = batch_size.unwrap_or(config.ingest_batch_size);
            import::run_import(&pool, &path, batch_size).await?;
        }
        Some(Commands::Db {
            command: DbCommands::Ping,
        }) => {
            let config = pdash_core::load_app_config()?;
            let pool = connect(&config).await?;
            pdash_db::ping(&pool).await?;
            println!("database reachable");
        }
        Some(Commands::Db {
            command: DbCommands::Migrate,
        }) => {
            let config = pdash_core::load_app_config()?;
            let pool = connect(&config).await?;
            let applied = pdash_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        None => {
            println!("no command given; run `pdash-cli --help` for usage");
        }
    }

    Ok(())
}

async fn connect(config: &pdash_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = pdash_db::PoolConfig::from_app_config(config);
    let pool = pdash_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
