//! Pulls listing fields out of a fetched HTML page.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use url::Url;
use utrabeauty_core::ScrapedProduct;

use crate::error::ScraperError;
use crate::price::{infer_currency, parse_price};
use crate::selectors::{CompiledSelector, CompiledSelectors};

/// Extracts a [`ScrapedProduct`] from `html`.
///
/// `page_url` is the URL the page was served from; relative image URLs are
/// resolved against it and it becomes the product's `source_url`.
///
/// # Errors
///
/// Returns [`ScraperError::MissingField`] if no title selector yields text.
/// Every other field is optional.
pub fn extract_listing(
    html: &str,
    page_url: &Url,
    selectors: &CompiledSelectors,
) -> Result<ScrapedProduct, ScraperError> {
    let document = Html::parse_document(html);

    let title = first_match(&document, &selectors.title).ok_or_else(|| {
        ScraperError::MissingField {
            field: "title",
            url: page_url.to_string(),
        }
    })?;
    let description = first_match(&document, &selectors.description);
    let raw_price = first_match(&document, &selectors.price);
    let price = raw_price.as_deref().and_then(parse_price);
    let currency = first_match(&document, &selectors.currency)
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
        .or_else(|| raw_price.as_deref().and_then(infer_currency));
    let image_urls = collect_images(&document, page_url, &selectors.images);

    Ok(ScrapedProduct {
        source_url: page_url.to_string(),
        title,
        description,
        price,
        raw_price,
        currency,
        image_urls,
    })
}

/// First non-empty value produced by the chain, in selector order.
fn first_match(document: &Html, chain: &[CompiledSelector]) -> Option<String> {
    chain.iter().find_map(|sel| {
        document
            .select(&sel.selector)
            .find_map(|el| read_value(el, sel.attr.as_deref()))
    })
}

fn read_value(el: ElementRef<'_>, attr: Option<&str>) -> Option<String> {
    let raw = match attr {
        Some(name) => el.value().attr(name)?.to_owned(),
        None => el.text().collect::<Vec<_>>().join(" "),
    };
    let collapsed = collapse_whitespace(&raw);
    (!collapsed.is_empty()).then_some(collapsed)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every image selector contributes; results keep page order without duplicates.
fn collect_images(document: &Html, page_url: &Url, chain: &[CompiledSelector]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for sel in chain {
        for el in document.select(&sel.selector) {
            let candidates = match sel.attr.as_deref() {
                Some(name) => el.value().attr(name).map(image_candidates),
                None => el.value().attr("src").map(image_candidates),
            };
            for candidate in candidates.into_iter().flatten() {
                let Some(absolute) = resolve_image_url(page_url, &candidate) else {
                    tracing::debug!(
                        css = %sel.css,
                        candidate = %candidate,
                        "skipping unresolvable image reference"
                    );
                    continue;
                };
                if seen.insert(absolute.clone()) {
                    images.push(absolute);
                }
            }
        }
    }

    images
}

/// Expands one attribute value into image URL candidates.
///
/// Handles three shapes: a plain URL, a `srcset` list (last candidate, the
/// largest, wins), and Amazon's `data-a-dynamic-image` JSON object whose
/// keys are URLs.
fn image_candidates(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('{') {
        return serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(trimmed)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
    }

    srcset_urls(trimmed)
        .last()
        .map(|url| vec![(*url).to_owned()])
        .unwrap_or_default()
}

/// Splits a `srcset` value into its candidate URLs, in order.
///
/// A URL runs to the next whitespace, so commas inside it (Amazon's
/// `_CR,0,0,38,50_`) are kept; a comma only separates candidates after the
/// URL or its descriptor. A bare URL yields itself.
fn srcset_urls(value: &str) -> Vec<&str> {
    let mut urls = Vec::new();
    let mut rest = value;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (token, after) = rest.split_at(end);
        rest = if token.ends_with(',') {
            after
        } else {
            after.find(',').map_or("", |i| &after[i + 1..])
        };
        let url = token.trim_end_matches(',');
        if !url.is_empty() {
            urls.push(url);
        }
    }
    urls
}

fn resolve_image_url(page_url: &Url, candidate: &str) -> Option<String> {
    if candidate.starts_with("data:") {
        return None;
    }
    let resolved = page_url.join(candidate).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
