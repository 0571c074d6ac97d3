//! `db` command handlers.

use clap::Subcommand;
use utrabeauty_core::AppConfig;

use crate::connect;

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check that the database accepts connections
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Count rows in every table
    Smoke,
    /// Merge duplicate cart lines for the same product
    Dedupe {
        /// Report how many rows would be removed without changing anything
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn run_db(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = connect(config).await?;

    match command {
        DbCommands::Ping => {
            utrabeauty_db::health_check(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = utrabeauty_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Smoke => {
            let report = utrabeauty_db::smoke_test(&pool).await?;
            for (table, count) in &report.tables {
                println!("{table:<24} {count:>8}");
            }
            println!("{:<24} {:>8}", "total", report.total_rows());
        }
        DbCommands::Dedupe { dry_run } => {
            let removed = utrabeauty_db::dedupe_cart_line_items(&pool, dry_run).await?;
            if dry_run {
                println!("dry-run: would remove {removed} duplicate cart line(s)");
            } else {
                tracing::info!(removed, "deduplicated cart lines");
                println!("removed {removed} duplicate cart line(s)");
            }
        }
    }

    Ok(())
}
