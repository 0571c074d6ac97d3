//! HTTP client for third-party marketplace listing pages.

mod image;
mod origin;

use std::time::Duration;

use reqwest::Client;
use utrabeauty_core::ScrapedProduct;

use crate::error::ScraperError;
use crate::extract::extract_listing;
use crate::rate_limit::retry_with_backoff;
use crate::selectors::CompiledSelectors;

pub use image::DownloadedImage;
pub use origin::validate_listing_url;

/// Desktop browser profile tried when the configured user agent is refused
/// or served a bot challenge.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Fetches marketplace listing pages and extracts product data from them.
///
/// Each fetch tries the configured `User-Agent` first, then
/// [`BROWSER_USER_AGENT`]. Transient errors (429, network failures, 5xx) are
/// retried with exponential backoff per user agent. A 404 ends the fetch
/// immediately since no profile will make the listing reappear.
pub struct ListingScraper {
    client: Client,
    user_agent: String,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
    selectors: CompiledSelectors,
}

impl ListingScraper {
    /// Creates a `ListingScraper` using the built-in selector cascade.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_owned(),
            max_retries,
            backoff_base_secs,
            selectors: CompiledSelectors::builtin()?,
        })
    }

    /// Replaces the selector cascade, e.g. with one loaded from
    /// `UTRABEAUTY_SELECTORS_PATH`.
    #[must_use]
    pub fn with_selectors(mut self, selectors: CompiledSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Fetches `url` and extracts a [`ScrapedProduct`] from the page.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors from [`Self::fetch_page`], and returns
    /// [`ScraperError::MissingField`] when no title selector matched.
    pub async fn scrape(&self, url: &str) -> Result<ScrapedProduct, ScraperError> {
        let parsed = validate_listing_url(url)?;
        let body = self.fetch_page(parsed.as_str()).await?;
        let product = extract_listing(&body, &parsed, &self.selectors)?;
        tracing::info!(
            url = %parsed,
            title = %product.title,
            images = product.image_urls.len(),
            has_price = product.price.is_some(),
            "scraped listing"
        );
        Ok(product)
    }

    /// Fetches the HTML body of a listing page.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`]: `url` is not an absolute http(s) URL.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried, no fallback).
    /// - [`ScraperError::BlockedPage`]: every profile received an empty page or bot challenge.
    /// - Otherwise the last error seen by the browser profile.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let parsed = validate_listing_url(url)?;
        let url = parsed.as_str();

        let mut user_agents = vec![self.user_agent.as_str()];
        if self.user_agent != BROWSER_USER_AGENT {
            user_agents.push(BROWSER_USER_AGENT);
        }

        let mut last_error = None;
        for ua in user_agents {
            match self.fetch_with_retry(url, ua).await {
                Ok(body) => return Ok(body),
                Err(err @ ScraperError::NotFound { .. }) => return Err(err),
                Err(err) => {
                    tracing::debug!(url, user_agent = ua, error = %err, "listing fetch failed for user agent");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ScraperError::BlockedPage {
            url: url.to_owned(),
        }))
    }

    async fn fetch_with_retry(&self, url: &str, user_agent: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, user_agent)
                .header(
                    reqwest::header::ACCEPT,
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .unwrap_or(0);
                return Err(ScraperError::RateLimited {
                    domain: origin::extract_domain(url),
                    retry_after_secs,
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

            let body = response.text().await?;
            if !is_usable_html(&body) {
                return Err(ScraperError::BlockedPage {
                    url: url.to_owned(),
                });
            }
            Ok(body)
        })
        .await
    }
}

fn is_usable_html(body: &str) -> bool {
    let trimmed = body.trim();
    !trimmed.is_empty() && !looks_like_bot_challenge(trimmed)
}

fn looks_like_bot_challenge(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");
    // Amazon's robot check and AliExpress' slider captcha.
    let has_robot_check = lowered.contains("/errors/validatecaptcha")
        || lowered.contains("enter the characters you see below");
    let has_slider_captcha = lowered.contains("x5secdata") || lowered.contains("nc_1_n1z");

    has_cloudflare_banner
        || has_challenge_platform
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
        || has_robot_check
        || has_slider_captcha
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
