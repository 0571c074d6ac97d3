use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid listing URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("listing not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{url} served a bot challenge or empty page to every user agent")]
    BlockedPage { url: String },

    #[error("image at {url} exceeds {limit_bytes} bytes")]
    ImageTooLarge { url: String, limit_bytes: u64 },

    #[error("{url} returned non-image content type \"{content_type}\"")]
    NotAnImage { url: String, content_type: String },

    #[error("invalid CSS selector \"{css}\": {reason}")]
    InvalidSelector { css: String, reason: String },

    #[error("no selector produced a {field} for {url}")]
    MissingField { field: &'static str, url: String },

    #[error("failed to read selector file {path}: {source}")]
    SelectorFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selector file: {0}")]
    SelectorFileParse(#[source] serde_yaml::Error),
}
