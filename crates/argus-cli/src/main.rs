mod db;
mod pages;
mod reports;
mod scan;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{pages::PagesCommands, reports::ReportsCommands};

#[derive(Debug, Parser)]
#[command(name = "argus-cli")]
#[command(about = "Banner anomaly detection command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Scan all active pages, or a single page by name
    Scan {
        /// Scan only this page
        #[arg(long)]
        page: Option<String>,
    },
    /// Evaluate one banner against one catalog without writing a report
    Detect {
        #[arg(long)]
        banner_url: String,
        #[arg(long)]
        catalog_id: String,
    },
    /// Manage page configurations
    Pages {
        #[command(subcommand)]
        command: PagesCommands,
    },
    /// Browse and prune scan reports
    Reports {
        #[command(subcommand)]
        command: ReportsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert page configurations from the pages file
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("argus-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = argus_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = argus_db::PoolConfig::from_app_config(&config);
    let pool = argus_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_ping(&pool).await,
            DbCommands::Migrate => db::run_migrate(&pool).await,
            DbCommands::Seed => db::run_seed(&pool, &config.pages_path).await,
        },
        Commands::Scan { page } => scan::run_scan(&pool, &config, page.as_deref()).await,
        Commands::Detect {
            banner_url,
            catalog_id,
        } => scan::run_detect(&config, &banner_url, &catalog_id).await,
        Commands::Pages { command } => pages::run(&pool, command).await,
        Commands::Reports { command } => reports::run(&pool, command).await,
    }
}
