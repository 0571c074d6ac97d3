use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::slug::slugify;
use crate::ConfigError;

/// One entry of the storefront category catalog, as listed in
/// `config/categories.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub title: String,
    /// Slug of the parent category; `None` for top-level navigation entries.
    #[serde(default)]
    pub parent: Option<String>,
    /// Featured categories are promoted in the navigation mega-menu.
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<Category>,
}

/// A top-level category with its direct children, in catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

/// Load and validate the category catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CategoriesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CatalogFileParse)?;

    validate_categories(&file.categories)?;

    Ok(file)
}

fn validate_categories(categories: &[Category]) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for category in categories {
        if category.title.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' has an empty title",
                category.slug
            )));
        }

        if category.slug.is_empty() || slugify(&category.slug) != category.slug {
            return Err(ConfigError::Validation(format!(
                "category slug '{}' is not a valid slug (expected '{}')",
                category.slug,
                slugify(&category.slug)
            )));
        }

        if !seen_slugs.insert(category.slug.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category slug: '{}'",
                category.slug
            )));
        }
    }

    for category in categories {
        if let Some(parent) = &category.parent {
            if parent == &category.slug {
                return Err(ConfigError::Validation(format!(
                    "category '{}' lists itself as parent",
                    category.slug
                )));
            }
            if !seen_slugs.contains(parent.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "category '{}' references unknown parent '{parent}'",
                    category.slug
                )));
            }
        }
    }

    let parents: HashMap<&str, &str> = categories
        .iter()
        .filter_map(|c| c.parent.as_deref().map(|p| (c.slug.as_str(), p)))
        .collect();
    for category in categories {
        let mut visited = HashSet::from([category.slug.as_str()]);
        let mut current = category.slug.as_str();
        while let Some(&parent) = parents.get(current) {
            if !visited.insert(parent) {
                return Err(ConfigError::Validation(format!(
                    "parent chain of category '{}' loops back to '{parent}'",
                    category.slug
                )));
            }
            current = parent;
        }
    }

    Ok(())
}

/// Group the flat catalog into top-level nodes with their direct children.
///
/// Children whose parent is itself a child are attached to that parent's
/// top-level ancestor so the navigation stays two levels deep.
#[must_use]
pub fn category_tree(categories: &[Category]) -> Vec<CategoryNode> {
    let parents: HashMap<&str, Option<&str>> = categories
        .iter()
        .map(|c| (c.slug.as_str(), c.parent.as_deref()))
        .collect();

    let root_of = |slug: &str| -> String {
        let mut current = slug;
        // Bounded so an unvalidated cyclic catalog cannot loop forever.
        for _ in 0..categories.len() {
            match parents.get(current).copied().flatten() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current.to_string()
    };

    let mut nodes: Vec<CategoryNode> = categories
        .iter()
        .filter(|c| c.parent.is_none())
        .map(|c| CategoryNode {
            category: c.clone(),
            children: Vec::new(),
        })
        .collect();

    for child in categories.iter().filter(|c| c.parent.is_some()) {
        let root = root_of(&child.slug);
        if let Some(node) = nodes.iter_mut().find(|n| n.category.slug == root) {
            node.children.push(child.clone());
        }
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(slug: &str, parent: Option<&str>) -> Category {
        Category {
            slug: slug.to_string(),
            title: slug.replace('-', " "),
            parent: parent.map(str::to_string),
            featured: false,
            description: None,
        }
    }

    #[test]
    fn validate_accepts_well_formed_catalog() {
        let categories = vec![
            category("skincare", None),
            category("serums", Some("skincare")),
            category("makeup", None),
        ];
        assert!(validate_categories(&categories).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_slug() {
        let categories = vec![category("skincare", None), category("skincare", None)];
        let err = validate_categories(&categories).unwrap_err();
        assert!(err.to_string().contains("duplicate category slug"));
    }

    #[test]
    fn validate_rejects_non_slug_value() {
        let categories = vec![category("Skin Care", None)];
        let err = validate_categories(&categories).unwrap_err();
        assert!(err.to_string().contains("expected 'skin-care'"));
    }

    #[test]
    fn validate_rejects_empty_title() {
        let mut c = category("skincare", None);
        c.title = "   ".to_string();
        let err = validate_categories(&[c]).unwrap_err();
        assert!(err.to_string().contains("empty title"));
    }

    #[test]
    fn validate_rejects_unknown_parent() {
        let categories = vec![category("serums", Some("skincare"))];
        let err = validate_categories(&categories).unwrap_err();
        assert!(err.to_string().contains("unknown parent 'skincare'"));
    }

    #[test]
    fn validate_rejects_self_parent() {
        let categories = vec![category("skincare", Some("skincare"))];
        let err = validate_categories(&categories).unwrap_err();
        assert!(err.to_string().contains("itself as parent"));
    }

    #[test]
    fn validate_rejects_parent_cycle() {
        let categories = vec![
            category("skincare", None),
            category("a", Some("b")),
            category("b", Some("a")),
        ];
        let err = validate_categories(&categories).unwrap_err();
        assert!(err.to_string().contains("loops back to"));
    }

    #[test]
    fn validate_rejects_longer_cycle_behind_a_valid_child() {
        let categories = vec![
            category("serums", Some("a")),
            category("a", Some("b")),
            category("b", Some("c")),
            category("c", Some("a")),
        ];
        assert!(validate_categories(&categories).is_err());
    }

    #[test]
    fn load_categories_rejects_cyclic_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("categories.yaml");
        std::fs::write(
            &path,
            "categories:\n  - slug: skincare\n    title: Skincare\n  - slug: a\n    title: A\n    parent: b\n  - slug: b\n    title: B\n    parent: a\n",
        )
        .expect("write catalog");

        let err = load_categories(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn tree_groups_children_under_top_level_ancestor() {
        let categories = vec![
            category("skincare", None),
            category("makeup", None),
            category("serums", Some("skincare")),
            category("vitamin-c-serums", Some("serums")),
            category("lipstick", Some("makeup")),
        ];
        let tree = category_tree(&categories);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.slug, "skincare");
        let skincare_children: Vec<&str> =
            tree[0].children.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(skincare_children, vec!["serums", "vitamin-c-serums"]);
        assert_eq!(tree[1].children.len(), 1);
        assert_eq!(tree[1].children[0].slug, "lipstick");
    }

    #[test]
    fn load_categories_reads_yaml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("categories.yaml");
        std::fs::write(
            &path,
            "categories:\n  - slug: skincare\n    title: Skincare\n    featured: true\n  - slug: serums\n    title: Serums\n    parent: skincare\n",
        )
        .expect("write catalog");

        let file = load_categories(&path).expect("load catalog");
        assert_eq!(file.categories.len(), 2);
        assert!(file.categories[0].featured);
        assert_eq!(file.categories[1].parent.as_deref(), Some("skincare"));
    }

    #[test]
    fn load_categories_reports_missing_file() {
        let err = load_categories(Path::new("/nonexistent/categories.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CatalogFileIo { .. }));
    }

    #[test]
    fn tree_node_serializes_flat_with_children() {
        let tree = category_tree(&[category("skincare", None), category("serums", Some("skincare"))]);
        let json = serde_json::to_value(&tree).expect("serialize tree");
        assert_eq!(json[0]["slug"], "skincare");
        assert_eq!(json[0]["children"][0]["slug"], "serums");
    }
}
