//! Marketplace listing scraper: fetch a product page, then pull title,
//! description, price, and images out of it with cascading CSS selectors.

pub mod client;
pub mod error;
pub mod extract;
pub mod price;
mod rate_limit;
pub mod selectors;

pub use client::{validate_listing_url, DownloadedImage, ListingScraper, BROWSER_USER_AGENT};
pub use error::ScraperError;
pub use extract::extract_listing;
pub use price::{clean_price, infer_currency, parse_price};
pub use selectors::{load_selector_set, CompiledSelectors, FieldSelector, SelectorSet};
