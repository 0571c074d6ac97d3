//! Product image downloads for the CMS importer.

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

use super::origin::{extract_domain, extract_origin, validate_listing_url};
use super::{ListingScraper, BROWSER_USER_AGENT};

/// Raw bytes of one listing image plus what the server said it was.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub url: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Last path segment of the URL, used as the upload filename.
    pub filename: String,
}

impl ListingScraper {
    /// Downloads one image, refusing anything over `max_bytes` or not
    /// served as `image/*`.
    ///
    /// Marketplace CDNs often check the `Referer`, so the listing origin is
    /// sent along with the browser profile.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`]: `url` is not an absolute http(s) URL.
    /// - [`ScraperError::ImageTooLarge`]: body exceeds `max_bytes`.
    /// - [`ScraperError::NotAnImage`]: content type is not `image/*` and cannot
    ///   be inferred from the file extension.
    /// - Status and transport errors as in [`ListingScraper::fetch_page`].
    pub async fn download_image(
        &self,
        url: &str,
        listing_url: &str,
        max_bytes: u64,
    ) -> Result<DownloadedImage, ScraperError> {
        let parsed = validate_listing_url(url)?;
        let referer = validate_listing_url(listing_url)
            .map(|u| extract_origin(&u))
            .ok();
        let filename = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_owned))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "image".to_owned());
        let url = parsed.as_str();

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let referer = referer.clone();
            let filename = filename.clone();
            async move {
                let mut request = self
                    .client
                    .get(url)
                    .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
                    .header(reqwest::header::ACCEPT, "image/avif,image/webp,image/*,*/*;q=0.8");
                if let Some(referer) = &referer {
                    request = request.header(reqwest::header::REFERER, referer);
                }

                let mut response = request.send().await?;
                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(ScraperError::RateLimited {
                        domain: extract_domain(url),
                        retry_after_secs: 0,
                    });
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound {
                        url: url.to_owned(),
                    });
                }
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_owned(),
                    });
                }

                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
                    .unwrap_or_default();
                let content_type = if content_type.starts_with("image/") {
                    content_type
                } else if is_generic_content_type(&content_type) {
                    // CDNs that serve octet-stream still carry a usable extension.
                    match content_type_from_extension(&filename) {
                        Some(inferred) => inferred.to_owned(),
                        None => {
                            return Err(ScraperError::NotAnImage {
                                url: url.to_owned(),
                                content_type,
                            })
                        }
                    }
                } else {
                    return Err(ScraperError::NotAnImage {
                        url: url.to_owned(),
                        content_type,
                    });
                };

                if response.content_length().is_some_and(|len| len > max_bytes) {
                    return Err(ScraperError::ImageTooLarge {
                        url: url.to_owned(),
                        limit_bytes: max_bytes,
                    });
                }

                // Content-Length can be absent or wrong; enforce the cap while reading.
                let mut bytes = Vec::new();
                while let Some(chunk) = response.chunk().await? {
                    if (bytes.len() + chunk.len()) as u64 > max_bytes {
                        return Err(ScraperError::ImageTooLarge {
                            url: url.to_owned(),
                            limit_bytes: max_bytes,
                        });
                    }
                    bytes.extend_from_slice(&chunk);
                }

                Ok(DownloadedImage {
                    url: url.to_owned(),
                    bytes,
                    content_type,
                    filename,
                })
            }
        })
        .await
    }
}

fn is_generic_content_type(content_type: &str) -> bool {
    matches!(
        content_type,
        "" | "application/octet-stream" | "binary/octet-stream"
    )
}

fn content_type_from_extension(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}
