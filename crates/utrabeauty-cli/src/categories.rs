//! `categories` command handlers.

use clap::Subcommand;
use utrabeauty_core::AppConfig;

use crate::cms_client;

/// Sub-commands available under `categories`.
#[derive(Debug, Subcommand)]
pub enum CategoriesCommands {
    /// Write every catalog category into the CMS
    Seed,
    /// Print the catalog as a navigation tree
    List,
}

pub(crate) async fn run_categories(
    config: &AppConfig,
    command: CategoriesCommands,
) -> anyhow::Result<()> {
    let catalog = utrabeauty_core::load_categories(&config.categories_path)?;

    match command {
        CategoriesCommands::Seed => {
            let cms = cms_client(config)?;
            let written = utrabeauty_cms::seed_categories(&cms, &catalog.categories).await?;
            println!(
                "seeded {written} categories into dataset '{}'",
                cms.dataset()
            );
        }
        CategoriesCommands::List => {
            for node in utrabeauty_core::category_tree(&catalog.categories) {
                let marker = if node.category.featured { " *" } else { "" };
                println!("{} ({}){marker}", node.category.title, node.category.slug);
                for child in &node.children {
                    println!("  - {} ({})", child.title, child.slug);
                }
            }
        }
    }

    Ok(())
}
