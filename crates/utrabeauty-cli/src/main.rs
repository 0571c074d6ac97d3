mod admin;
mod categories;
mod db;
mod import;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{admin::AdminCommands, categories::CategoriesCommands, db::DbCommands};

#[derive(Debug, Parser)]
#[command(name = "utrabeauty-cli")]
#[command(about = "Utrabeauty storefront maintenance commands")]
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
    /// Admin user management
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Scrape a marketplace listing and import it into the CMS
    Import {
        /// Listing URL (Amazon, AliExpress, Shopify, or any page with product metadata)
        #[arg(long)]
        url: String,

        /// Category slug from the catalog to file the product under
        #[arg(long)]
        category: Option<String>,

        /// Print the normalized product without writing to the CMS
        #[arg(long)]
        dry_run: bool,
    },
    /// Category catalog management
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("utrabeauty-cli: run with --help to list commands");
        return Ok(());
    };

    let config = utrabeauty_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Db { command } => db::run_db(&config, command).await,
        Commands::Admin { command } => admin::run_admin(&config, command).await,
        Commands::Import {
            url,
            category,
            dry_run,
        } => import::run_import(&config, &url, category.as_deref(), dry_run).await,
        Commands::Categories { command } => categories::run_categories(&config, command).await,
    }
}

/// Opens the pool with the configured limits.
pub(crate) async fn connect(config: &utrabeauty_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = utrabeauty_db::PoolConfig::from_app_config(config);
    let pool = utrabeauty_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

/// CMS client from config; shared by import, category seed, and admin sync.
pub(crate) fn cms_client(
    config: &utrabeauty_core::AppConfig,
) -> anyhow::Result<utrabeauty_cms::CmsClient> {
    let (api_url, token) = config.cms_credentials()?;
    Ok(utrabeauty_cms::CmsClient::new(
        api_url,
        &config.cms_dataset,
        token,
        config.scraper_request_timeout_secs,
    )?)
}

#[cfg(test)]
mod tests;
