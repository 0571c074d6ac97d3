use utrabeauty_core::Category;

use crate::client::CmsClient;
use crate::documents::CategoryDocument;
use crate::error::CmsError;

/// Writes every catalog category to the CMS in one transaction.
///
/// Categories use deterministic ids (`category-<slug>`), so re-seeding
/// replaces documents in place. Returns the number of documents written.
///
/// # Errors
///
/// Returns [`CmsError`] if serialization or the mutation fails; the
/// transaction is atomic, so nothing is written on failure.
pub async fn seed_categories(cms: &CmsClient, categories: &[Category]) -> Result<usize, CmsError> {
    if categories.is_empty() {
        return Ok(0);
    }

    let mutations = categories
        .iter()
        .map(|category| {
            let document = CategoryDocument::from(category);
            serde_json::to_value(&document)
                .map(|doc| serde_json::json!({ "createOrReplace": doc }))
                .map_err(|e| CmsError::Serialize {
                    context: format!("category {}", category.slug),
                    source: e,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = cms.mutate(mutations).await?;
    tracing::info!(
        transaction_id = %outcome.transaction_id,
        categories = categories.len(),
        "seeded categories"
    );
    Ok(categories.len())
}
