//! `import` command handler.

use anyhow::Context;
use utrabeauty_cms::{ImportLimits, Importer};
use utrabeauty_core::AppConfig;
use utrabeauty_scraper::{load_selector_set, ListingScraper};

use crate::cms_client;

fn build_importer(config: &AppConfig) -> anyhow::Result<Importer> {
    let categories = utrabeauty_core::load_categories(&config.categories_path)?.categories;

    let mut scraper = ListingScraper::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )?;
    if let Some(path) = &config.selectors_path {
        let selectors = load_selector_set(path)
            .and_then(|set| set.compile())
            .with_context(|| format!("loading selectors from {}", path.display()))?;
        scraper = scraper.with_selectors(selectors);
    }

    Ok(Importer::new(
        scraper,
        cms_client(config)?,
        categories,
        ImportLimits {
            max_images: config.import_max_images,
            max_image_bytes: config.import_max_image_bytes,
        },
    ))
}

/// Scrape `url` and import it. With `dry_run` the CMS document that would be
/// written is printed instead.
///
/// # Errors
///
/// Returns an error if the importer cannot be built or the import fails; an
/// import that wrote a product but failed to attach images names the
/// orphaned document.
pub(crate) async fn run_import(
    config: &AppConfig,
    url: &str,
    category: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let importer = build_importer(config)?;

    if dry_run {
        let (draft, document) = importer.prepare(url, category).await?;
        println!("{}", serde_json::to_string_pretty(&document)?);
        println!(
            "dry-run: would upload {} image(s) for '{}'",
            draft.image_urls.len(),
            draft.title
        );
        return Ok(());
    }

    let report = match importer.import(url, category).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(document_id) = e.orphaned_document_id() {
                eprintln!("product document {document_id} exists without images");
            }
            return Err(e.into());
        }
    };

    println!(
        "imported '{}' as {} ({} image(s) attached)",
        report.title, report.document_id, report.images_attached
    );
    for failed in &report.failed_images {
        println!("  skipped image {}: {}", failed.url, failed.reason);
    }

    Ok(())
}
