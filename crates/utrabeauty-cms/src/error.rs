use thiserror::Error;

use utrabeauty_scraper::ScraperError;

/// Errors returned by the CMS HTTP client.
#[derive(Debug, Error)]
pub enum CmsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid CMS API URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Non-2xx response; `body` is truncated to keep logs readable.
    #[error("CMS returned HTTP {status} for {endpoint}: {body}")]
    UnexpectedStatus {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the scrape-and-import pipeline.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Fetching or extracting the listing failed; nothing was written.
    #[error("scrape failed: {0}")]
    Scrape(#[from] ScraperError),

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    /// The listing title produced an empty slug, so no stable id exists.
    #[error("listing title \"{0}\" does not yield a usable slug")]
    EmptySlug(String),

    /// Writing the product document failed; nothing was written.
    #[error("failed to persist product document: {0}")]
    Persist(#[source] CmsError),

    /// The product document exists but attaching its images failed.
    #[error("product {document_id} was created but attaching images failed: {source}")]
    AttachImages {
        document_id: String,
        #[source]
        source: CmsError,
    },
}

impl ImportError {
    /// `true` when the caller supplied bad input rather than an upstream failing.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportError::UnknownCategory(_)
                | ImportError::EmptySlug(_)
                | ImportError::Scrape(ScraperError::InvalidUrl { .. })
        )
    }

    /// Id of a document that was written before the failure, if any.
    #[must_use]
    pub fn orphaned_document_id(&self) -> Option<&str> {
        match self {
            ImportError::AttachImages { document_id, .. } => Some(document_id),
            _ => None,
        }
    }
}
