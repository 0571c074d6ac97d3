//! Scrape-and-import pipeline: listing URL in, CMS product document out.

use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use utrabeauty_core::{slugify, Category, ProductDraft, ScrapedProduct};
use utrabeauty_scraper::ListingScraper;

use crate::client::CmsClient;
use crate::documents::{ImageRef, ProductDocument};
use crate::error::{CmsError, ImportError};

/// Per-import caps on image work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_images: usize,
    pub max_image_bytes: u64,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_images: 8,
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

/// An image that could not be attached, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedImage {
    pub url: String,
    pub reason: String,
}

/// Summary of one completed import, returned to the API caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub document_id: String,
    pub slug: String,
    pub title: String,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub images_attached: usize,
    pub failed_images: Vec<FailedImage>,
    /// `true` when the document was only built, not written (`--dry-run`).
    pub dry_run: bool,
}

/// Normalizes a scraped listing into the shape written to the CMS.
///
/// The slug derives from the title. Images keep page order, lose
/// duplicates, and are capped at `max_images`.
#[must_use]
pub fn normalize_listing(
    scraped: ScrapedProduct,
    category_slug: Option<&str>,
    max_images: usize,
) -> ProductDraft {
    let mut seen = HashSet::new();
    let image_urls = scraped
        .image_urls
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .take(max_images)
        .collect();

    ProductDraft {
        slug: slugify(&scraped.title),
        title: scraped.title,
        description: scraped.description.filter(|d| !d.trim().is_empty()),
        price: scraped.price,
        currency: scraped.currency,
        source_url: scraped.source_url,
        category_slug: category_slug.map(str::to_owned),
        image_urls,
    }
}

/// Runs the scrape-and-import pipeline against one CMS dataset.
pub struct Importer {
    scraper: ListingScraper,
    cms: CmsClient,
    categories: Vec<Category>,
    limits: ImportLimits,
}

impl Importer {
    #[must_use]
    pub fn new(
        scraper: ListingScraper,
        cms: CmsClient,
        categories: Vec<Category>,
        limits: ImportLimits,
    ) -> Self {
        Self {
            scraper,
            cms,
            categories,
            limits,
        }
    }

    #[must_use]
    pub fn cms(&self) -> &CmsClient {
        &self.cms
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Scrapes `url` and builds the product document without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnknownCategory`], [`ImportError::Scrape`], or
    /// [`ImportError::EmptySlug`].
    pub async fn prepare(
        &self,
        url: &str,
        category_slug: Option<&str>,
    ) -> Result<(ProductDraft, ProductDocument), ImportError> {
        if let Some(slug) = category_slug {
            if !self.categories.iter().any(|c| c.slug == slug) {
                return Err(ImportError::UnknownCategory(slug.to_owned()));
            }
        }

        let scraped = self.scraper.scrape(url).await?;
        let draft = normalize_listing(scraped, category_slug, self.limits.max_images);
        if draft.slug.is_empty() {
            return Err(ImportError::EmptySlug(draft.title));
        }

        let document = ProductDocument::from_draft(&draft, Utc::now());
        Ok((draft, document))
    }

    /// Scrape, normalize, persist, then attach images one at a time.
    ///
    /// A failed image is recorded in the report and skipped; the product keeps
    /// exactly the images that downloaded and uploaded, each asset once. The images patch is
    /// only sent when at least one upload succeeded.
    ///
    /// # Errors
    ///
    /// - [`ImportError::UnknownCategory`] / [`ImportError::EmptySlug`]: bad input.
    /// - [`ImportError::Scrape`]: the listing could not be fetched or read.
    /// - [`ImportError::Persist`]: the product document could not be written.
    /// - [`ImportError::AttachImages`]: the document exists but the images
    ///   patch failed; the error carries its id.
    pub async fn import(
        &self,
        url: &str,
        category_slug: Option<&str>,
    ) -> Result<ImportReport, ImportError> {
        let (draft, document) = self.prepare(url, category_slug).await?;
        let document_id = document.id.clone();

        let value = serde_json::to_value(&document).map_err(|e| {
            ImportError::Persist(CmsError::Serialize {
                context: format!("product document {document_id}"),
                source: e,
            })
        })?;
        self.cms
            .create_or_replace(value)
            .await
            .map_err(ImportError::Persist)?;
        tracing::info!(document_id = %document_id, slug = %draft.slug, "product document written");

        let (attached, failed_images) = self.upload_images(&draft).await;

        if !attached.is_empty() {
            let images = serde_json::to_value(&attached).map_err(|e| ImportError::AttachImages {
                document_id: document_id.clone(),
                source: CmsError::Serialize {
                    context: "image references".to_owned(),
                    source: e,
                },
            })?;
            self.cms
                .patch_set(&document_id, json!({ "images": images }))
                .await
                .map_err(|source| ImportError::AttachImages {
                    document_id: document_id.clone(),
                    source,
                })?;
        }

        tracing::info!(
            document_id = %document_id,
            images_attached = attached.len(),
            images_failed = failed_images.len(),
            "import complete"
        );

        Ok(ImportReport {
            document_id,
            slug: draft.slug,
            title: draft.title,
            price: draft.price,
            currency: draft.currency,
            category: draft.category_slug,
            images_attached: attached.len(),
            failed_images,
            dry_run: false,
        })
    }

    /// Scrapes and normalizes without touching the CMS.
    ///
    /// # Errors
    ///
    /// See [`Importer::prepare`].
    pub async fn dry_run(
        &self,
        url: &str,
        category_slug: Option<&str>,
    ) -> Result<ImportReport, ImportError> {
        let (draft, document) = self.prepare(url, category_slug).await?;
        Ok(ImportReport {
            document_id: document.id,
            images_attached: 0,
            failed_images: Vec::new(),
            slug: draft.slug,
            title: draft.title,
            price: draft.price,
            currency: draft.currency,
            category: draft.category_slug,
            dry_run: true,
        })
    }

    /// Downloads and uploads each image in order. Never runs two at once.
    async fn upload_images(&self, draft: &ProductDraft) -> (Vec<ImageRef>, Vec<FailedImage>) {
        let mut attached = Vec::new();
        let mut failed = Vec::new();

        for image_url in &draft.image_urls {
            let downloaded = match self
                .scraper
                .download_image(image_url, &draft.source_url, self.limits.max_image_bytes)
                .await
            {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(image_url = %image_url, error = %e, "image download failed, skipping");
                    failed.push(FailedImage {
                        url: image_url.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self
                .cms
                .upload_image(
                    downloaded.bytes,
                    &downloaded.content_type,
                    &downloaded.filename,
                )
                .await
            {
                Ok(asset_id) => {
                    // The CMS stores identical bytes once; reference each asset once.
                    if attached.iter().any(|img: &ImageRef| img.asset.target == asset_id) {
                        tracing::debug!(image_url = %image_url, asset_id = %asset_id, "duplicate asset, not attached again");
                        continue;
                    }
                    tracing::debug!(image_url = %image_url, asset_id = %asset_id, "image uploaded");
                    attached.push(ImageRef::for_asset(&asset_id));
                }
                Err(e) => {
                    tracing::warn!(image_url = %image_url, error = %e, "image upload failed, skipping");
                    failed.push(FailedImage {
                        url: image_url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        (attached, failed)
    }
}
