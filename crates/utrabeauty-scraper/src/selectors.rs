//! Ordered CSS selector fallbacks for each listing field.
//!
//! A field is read by trying its selectors in order until one yields
//! non-empty text. Images are the exception: every image selector
//! contributes, so a gallery and an `og:image` tag both count.

use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// One CSS selector, optionally reading an attribute instead of element text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub css: String,
    #[serde(default)]
    pub attr: Option<String>,
}

impl FieldSelector {
    fn text(css: &str) -> Self {
        Self {
            css: css.to_owned(),
            attr: None,
        }
    }

    fn attr(css: &str, attr: &str) -> Self {
        Self {
            css: css.to_owned(),
            attr: Some(attr.to_owned()),
        }
    }
}

/// Selector chains for every extracted field, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    pub title: Vec<FieldSelector>,
    #[serde(default)]
    pub description: Vec<FieldSelector>,
    #[serde(default)]
    pub price: Vec<FieldSelector>,
    #[serde(default)]
    pub currency: Vec<FieldSelector>,
    #[serde(default)]
    pub images: Vec<FieldSelector>,
}

impl Default for SelectorSet {
    /// Marketplace-specific markup first (Amazon, AliExpress, Shopify themes),
    /// then schema.org microdata, then OpenGraph, then bare document structure.
    fn default() -> Self {
        Self {
            title: vec![
                FieldSelector::text("#productTitle"),
                FieldSelector::text("h1[data-pl='product-title']"),
                FieldSelector::text(".product-title-text"),
                FieldSelector::text("h1.product-title"),
                FieldSelector::text("h1.product__title"),
                FieldSelector::text("[itemprop='name']"),
                FieldSelector::attr("meta[property='og:title']", "content"),
                FieldSelector::text("h1"),
                FieldSelector::text("title"),
            ],
            description: vec![
                FieldSelector::text("#feature-bullets"),
                FieldSelector::text("#productDescription"),
                FieldSelector::text(".product-description"),
                FieldSelector::text(".product__description"),
                FieldSelector::text("[itemprop='description']"),
                FieldSelector::attr("meta[property='og:description']", "content"),
                FieldSelector::attr("meta[name='description']", "content"),
            ],
            price: vec![
                FieldSelector::text("#corePrice_feature_div .a-offscreen"),
                FieldSelector::text(".a-price .a-offscreen"),
                FieldSelector::text("#priceblock_ourprice"),
                FieldSelector::text(".product-price-current"),
                FieldSelector::text(".price--current"),
                FieldSelector::text(".price-item--sale"),
                FieldSelector::text(".price-item--regular"),
                FieldSelector::attr("[itemprop='price']", "content"),
                FieldSelector::text("[itemprop='price']"),
                FieldSelector::attr("meta[property='product:price:amount']", "content"),
                FieldSelector::attr("meta[property='og:price:amount']", "content"),
                FieldSelector::text(".product-price"),
                FieldSelector::text(".price"),
            ],
            currency: vec![
                FieldSelector::attr("[itemprop='priceCurrency']", "content"),
                FieldSelector::attr("meta[property='product:price:currency']", "content"),
                FieldSelector::attr("meta[property='og:price:currency']", "content"),
            ],
            images: vec![
                FieldSelector::attr("#landingImage", "data-old-hires"),
                FieldSelector::attr("#landingImage", "data-a-dynamic-image"),
                FieldSelector::attr(".images-view-item img", "src"),
                FieldSelector::attr(".product__media img", "src"),
                FieldSelector::attr(".product-gallery img", "src"),
                FieldSelector::attr("[itemprop='image']", "content"),
                FieldSelector::attr("img[itemprop='image']", "src"),
                FieldSelector::attr("meta[property='og:image']", "content"),
                FieldSelector::attr("meta[property='og:image:secure_url']", "content"),
            ],
        }
    }
}

/// A [`FieldSelector`] with its CSS already parsed.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    pub(crate) css: String,
    pub(crate) selector: Selector,
    pub(crate) attr: Option<String>,
}

/// Parsed form of a [`SelectorSet`], ready for repeated extraction.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub(crate) title: Vec<CompiledSelector>,
    pub(crate) description: Vec<CompiledSelector>,
    pub(crate) price: Vec<CompiledSelector>,
    pub(crate) currency: Vec<CompiledSelector>,
    pub(crate) images: Vec<CompiledSelector>,
}

impl SelectorSet {
    /// Parse every CSS selector up front so extraction never fails on syntax.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] for the first selector that
    /// does not parse, or if the title chain is empty.
    pub fn compile(&self) -> Result<CompiledSelectors, ScraperError> {
        if self.title.is_empty() {
            return Err(ScraperError::InvalidSelector {
                css: String::new(),
                reason: "at least one title selector is required".to_owned(),
            });
        }

        Ok(CompiledSelectors {
            title: compile_chain(&self.title)?,
            description: compile_chain(&self.description)?,
            price: compile_chain(&self.price)?,
            currency: compile_chain(&self.currency)?,
            images: compile_chain(&self.images)?,
        })
    }
}

impl CompiledSelectors {
    /// Compiles the built-in [`SelectorSet::default`].
    ///
    /// # Errors
    ///
    /// Only fails if a built-in selector is malformed, which the unit tests guard.
    pub fn builtin() -> Result<Self, ScraperError> {
        SelectorSet::default().compile()
    }
}

fn compile_chain(chain: &[FieldSelector]) -> Result<Vec<CompiledSelector>, ScraperError> {
    chain
        .iter()
        .map(|fs| {
            let selector = Selector::parse(&fs.css).map_err(|e| ScraperError::InvalidSelector {
                css: fs.css.clone(),
                reason: format!("{e:?}"),
            })?;
            Ok(CompiledSelector {
                css: fs.css.clone(),
                selector,
                attr: fs.attr.clone(),
            })
        })
        .collect()
}

/// Load a selector set from YAML, replacing the built-in defaults.
///
/// # Errors
///
/// Returns [`ScraperError`] if the file cannot be read, parsed, or compiled.
pub fn load_selector_set(path: &Path) -> Result<SelectorSet, ScraperError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ScraperError::SelectorFileIo {
            path: path.display().to_string(),
            source: e,
        })?;
    let set: SelectorSet =
        serde_yaml::from_str(&content).map_err(ScraperError::SelectorFileParse)?;
    // Validate eagerly so a bad file fails at startup, not on the first import.
    set.compile()?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_selectors_compile() {
        let compiled = CompiledSelectors::builtin().expect("built-in selectors must parse");
        assert!(!compiled.title.is_empty());
        assert!(!compiled.images.is_empty());
    }

    #[test]
    fn compile_rejects_invalid_css() {
        let set = SelectorSet {
            title: vec![FieldSelector::text("[[invalid")],
            description: vec![],
            price: vec![],
            currency: vec![],
            images: vec![],
        };
        let err = set.compile().unwrap_err();
        assert!(matches!(err, ScraperError::InvalidSelector { ref css, .. } if css == "[[invalid"));
    }

    #[test]
    fn compile_requires_title_chain() {
        let set = SelectorSet {
            title: vec![],
            description: vec![],
            price: vec![],
            currency: vec![],
            images: vec![],
        };
        assert!(set.compile().is_err());
    }

    #[test]
    fn load_selector_set_reads_yaml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("selectors.yaml");
        std::fs::write(
            &path,
            "title:\n  - css: h2.name\nimages:\n  - css: img.hero\n    attr: src\n",
        )
        .expect("write selectors");

        let set = load_selector_set(&path).expect("load selectors");
        assert_eq!(set.title, vec![FieldSelector::text("h2.name")]);
        assert_eq!(set.images, vec![FieldSelector::attr("img.hero", "src")]);
        assert!(set.price.is_empty());
    }

    #[test]
    fn load_selector_set_rejects_bad_css() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("selectors.yaml");
        std::fs::write(&path, "title:\n  - css: \"[[\"\n").expect("write selectors");
        assert!(matches!(
            load_selector_set(&path),
            Err(ScraperError::InvalidSelector { .. })
        ));
    }
}
