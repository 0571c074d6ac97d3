pub mod app_config;
pub mod categories;
pub mod config;
pub mod orders;
pub mod products;
pub mod slug;

pub use app_config::{AppConfig, Environment};
pub use categories::{category_tree, load_categories, CategoriesFile, Category, CategoryNode};
pub use config::{load_app_config, load_app_config_from_env};
pub use orders::{OrderStatus, UnknownOrderStatus};
pub use products::{ProductDraft, ScrapedProduct};
pub use slug::slugify;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read category catalog at {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse category catalog: {0}")]
    CatalogFileParse(#[source] serde_yaml::Error),

    #[error("category catalog validation failed: {0}")]
    Validation(String),
}
