//! Headless CMS integration: the content API client, the document shapes the
//! storefront reads, and the scrape-and-import pipeline that writes them.

pub mod client;
pub mod documents;
pub mod error;
pub mod import;
pub mod seed;

pub use client::{CmsClient, MutationOutcome};
pub use documents::{
    category_document_id, product_document_id, CategoryDocument, ImageRef, ProductDocument,
    Reference, UserDocument,
};
pub use error::{CmsError, ImportError};
pub use import::{normalize_listing, FailedImage, ImportLimits, ImportReport, Importer};
pub use seed::seed_categories;
