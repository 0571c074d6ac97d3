//! URL validation and host extraction for listing pages.

use url::Url;

use crate::error::ScraperError;

/// Parses `raw` and checks it is an absolute `http`/`https` URL with a host.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] for relative URLs, other schemes,
/// or URLs without a host.
pub fn validate_listing_url(raw: &str) -> Result<Url, ScraperError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| ScraperError::InvalidUrl {
        url: trimmed.to_owned(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScraperError::InvalidUrl {
            url: trimmed.to_owned(),
            reason: format!("unsupported scheme \"{}\"", url.scheme()),
        });
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ScraperError::InvalidUrl {
            url: trimmed.to_owned(),
            reason: "missing host".to_owned(),
        });
    }

    Ok(url)
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(crate) fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

/// Scheme and host of `url`, sent as the `Referer` for image downloads.
pub(crate) fn extract_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}
