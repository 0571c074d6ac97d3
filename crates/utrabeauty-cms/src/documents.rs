//! CMS document shapes written by the importer and the admin tooling.
//!
//! Field names follow the storefront's content schema (camelCase, with the
//! CMS system fields `_id`, `_type`, `_key`, `_ref`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utrabeauty_core::{Category, ProductDraft};
use uuid::Uuid;

/// Reference to another document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(rename = "_ref")]
    pub target: String,
}

impl Reference {
    #[must_use]
    pub fn to(id: &str) -> Self {
        Self {
            kind: "reference".to_owned(),
            target: id.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    #[serde(rename = "_type")]
    pub kind: String,
    pub current: String,
}

impl Slug {
    #[must_use]
    pub fn new(current: &str) -> Self {
        Self {
            kind: "slug".to_owned(),
            current: current.to_owned(),
        }
    }
}

/// One entry of a product's `images` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(rename = "_type")]
    pub kind: String,
    /// Array item key; stable for a given asset.
    #[serde(rename = "_key")]
    pub key: String,
    pub asset: Reference,
}

impl ImageRef {
    #[must_use]
    pub fn for_asset(asset_id: &str) -> Self {
        Self {
            kind: "image".to_owned(),
            key: short_hash(asset_id, 12),
            asset: Reference::to(asset_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub kind: String,
    pub title: String,
    pub slug: Slug,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Reference>,
    pub images: Vec<ImageRef>,
    pub imported_at: DateTime<Utc>,
}

impl ProductDocument {
    /// Builds the document for `draft` with no images attached yet.
    #[must_use]
    pub fn from_draft(draft: &ProductDraft, imported_at: DateTime<Utc>) -> Self {
        Self {
            id: product_document_id(&draft.slug, &draft.source_url),
            kind: "product".to_owned(),
            title: draft.title.clone(),
            slug: Slug::new(&draft.slug),
            description: draft.description.clone(),
            price: draft.price,
            currency: draft.currency.clone(),
            source_url: draft.source_url.clone(),
            category: draft
                .category_slug
                .as_deref()
                .map(|slug| Reference::to(&category_document_id(slug))),
            images: Vec::new(),
            imported_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub kind: String,
    pub title: String,
    pub slug: Slug,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Reference>,
    pub featured: bool,
}

impl From<&Category> for CategoryDocument {
    fn from(category: &Category) -> Self {
        Self {
            id: category_document_id(&category.slug),
            kind: "category".to_owned(),
            title: category.title.clone(),
            slug: Slug::new(&category.slug),
            description: category.description.clone(),
            parent: category
                .parent
                .as_deref()
                .map(|parent| Reference::to(&category_document_id(parent))),
            featured: category.featured,
        }
    }
}

/// Storefront user mirrored into the CMS so editors can see who placed orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub kind: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl UserDocument {
    #[must_use]
    pub fn new(user_id: Uuid, name: &str, email: &str, role: &str) -> Self {
        Self {
            id: format!("user-{user_id}"),
            kind: "user".to_owned(),
            name: name.to_owned(),
            email: email.to_owned(),
            role: role.to_owned(),
        }
    }
}

/// Deterministic product id: `product-<slug>-<8 hex of sha256(source_url)>`.
///
/// Re-importing the same listing targets the same document; two listings
/// whose titles collide on slug still get distinct ids.
#[must_use]
pub fn product_document_id(slug: &str, source_url: &str) -> String {
    format!("product-{slug}-{}", short_hash(source_url, 8))
}

#[must_use]
pub fn category_document_id(slug: &str) -> String {
    format!("category-{slug}")
}

fn short_hash(input: &str, len: usize) -> String {
    let mut hex = format!("{:x}", Sha256::digest(input.as_bytes()));
    hex.truncate(len);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn draft() -> ProductDraft {
        ProductDraft {
            title: "Rose Glow Serum".to_owned(),
            slug: "rose-glow-serum".to_owned(),
            description: None,
            price: Some(Decimal::new(2499, 2)),
            currency: Some("USD".to_owned()),
            source_url: "https://www.amazon.com/dp/B0TEST123".to_owned(),
            category_slug: Some("serums".to_owned()),
            image_urls: vec![],
        }
    }

    #[test]
    fn product_id_is_deterministic_per_source_url() {
        let a = product_document_id("rose-glow-serum", "https://www.amazon.com/dp/B0TEST123");
        let b = product_document_id("rose-glow-serum", "https://www.amazon.com/dp/B0TEST123");
        let c = product_document_id("rose-glow-serum", "https://www.aliexpress.com/item/1.html");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("product-rose-glow-serum-"));
        assert_eq!(a.len(), "product-rose-glow-serum-".len() + 8);
    }

    #[test]
    fn product_document_serializes_schema_fields() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let doc = ProductDocument::from_draft(&draft(), at);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["_type"], "product");
        assert_eq!(value["slug"], json!({"_type": "slug", "current": "rose-glow-serum"}));
        assert_eq!(value["price"], json!(24.99));
        assert_eq!(value["sourceUrl"], "https://www.amazon.com/dp/B0TEST123");
        assert_eq!(
            value["category"],
            json!({"_type": "reference", "_ref": "category-serums"})
        );
        assert_eq!(value["images"], json!([]));
        assert_eq!(value["importedAt"], "2026-03-01T12:00:00Z");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn image_ref_key_is_stable() {
        let a = ImageRef::for_asset("image-abc123-800x800-jpg");
        let b = ImageRef::for_asset("image-abc123-800x800-jpg");
        assert_eq!(a.key, b.key);
        assert_eq!(a.key.len(), 12);
        assert_eq!(a.asset.target, "image-abc123-800x800-jpg");
    }

    #[test]
    fn category_document_references_parent() {
        let category = Category {
            slug: "serums".to_owned(),
            title: "Serums".to_owned(),
            parent: Some("skincare".to_owned()),
            featured: true,
            description: None,
        };
        let doc = CategoryDocument::from(&category);
        assert_eq!(doc.id, "category-serums");
        assert_eq!(doc.parent, Some(Reference::to("category-skincare")));
        assert!(doc.featured);
    }

    #[test]
    fn user_document_id_uses_uuid() {
        let id = Uuid::nil();
        let doc = UserDocument::new(id, "Ana", "ana@example.com", "admin");
        assert_eq!(doc.id, format!("user-{id}"));
        assert_eq!(doc.kind, "user");
    }
}
