use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw product data extracted from a third-party marketplace listing page.
///
/// Every field except `title` and `source_url` is best-effort: listings vary
/// wildly in markup and a missing price or description is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedProduct {
    /// The listing URL the page was fetched from.
    pub source_url: String,
    pub title: String,
    pub description: Option<String>,
    /// Price parsed from `raw_price`, if it could be interpreted.
    pub price: Option<Decimal>,
    /// Price text exactly as it appeared on the page, e.g. `"US $24.99"`.
    pub raw_price: Option<String>,
    /// ISO 4217 currency code, when the page declares or implies one.
    pub currency: Option<String>,
    /// Absolute image URLs in page order, without duplicates.
    pub image_urls: Vec<String>,
}

/// A scraped product normalized into the shape written to the CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    /// Marketplace listing the product was imported from; later surfaced as
    /// the supplier URL when the product is ordered.
    pub source_url: String,
    pub category_slug: Option<String>,
    pub image_urls: Vec<String>,
}
