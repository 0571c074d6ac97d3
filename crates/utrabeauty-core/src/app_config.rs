use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub categories_path: PathBuf,
    /// Optional YAML file replacing the built-in extraction selectors.
    pub selectors_path: Option<PathBuf>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// CMS API base including the API version segment,
    /// e.g. `https://abc123.api.sanity.io/v2023-05-03`. Only processes that
    /// talk to the CMS need it; see [`AppConfig::cms_credentials`].
    pub cms_api_url: Option<String>,
    pub cms_dataset: String,
    pub cms_token: Option<String>,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    pub import_max_images: usize,
    pub import_max_image_bytes: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("categories_path", &self.categories_path)
            .field("selectors_path", &self.selectors_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("cms_api_url", &self.cms_api_url)
            .field("cms_dataset", &self.cms_dataset)
            .field("cms_token", &self.cms_token.as_ref().map(|_| "[redacted]"))
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .field("import_max_images", &self.import_max_images)
            .field("import_max_image_bytes", &self.import_max_image_bytes)
            .finish()
    }
}

impl AppConfig {
    /// Returns `(api_url, token)` for building a CMS client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the first CMS variable
    /// that is unset.
    pub fn cms_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let api_url = self
            .cms_api_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("UTRABEAUTY_CMS_API_URL".to_string()))?;
        let token = self
            .cms_token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("UTRABEAUTY_CMS_TOKEN".to_string()))?;
        Ok((api_url, token))
    }
}
