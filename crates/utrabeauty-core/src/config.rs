use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::str::FromStr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    }

    let database_url = require("DATABASE_URL")?;
    let cms_api_url =
        optional("UTRABEAUTY_CMS_API_URL").map(|url| url.trim_end_matches('/').to_string());
    let cms_token = optional("UTRABEAUTY_CMS_TOKEN");

    let env = parse_environment(&or_default("UTRABEAUTY_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_as(
        "UTRABEAUTY_BIND_ADDR",
        &or_default("UTRABEAUTY_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("UTRABEAUTY_LOG_LEVEL", "info");
    let categories_path = PathBuf::from(or_default(
        "UTRABEAUTY_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let selectors_path = optional("UTRABEAUTY_SELECTORS_PATH").map(PathBuf::from);

    let db_max_connections: u32 = parse_as(
        "UTRABEAUTY_DB_MAX_CONNECTIONS",
        &or_default("UTRABEAUTY_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "UTRABEAUTY_DB_MIN_CONNECTIONS",
        &or_default("UTRABEAUTY_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "UTRABEAUTY_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("UTRABEAUTY_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let cms_dataset = or_default("UTRABEAUTY_CMS_DATASET", "production");

    let scraper_request_timeout_secs: u64 = parse_as(
        "UTRABEAUTY_SCRAPER_REQUEST_TIMEOUT_SECS",
        &or_default("UTRABEAUTY_SCRAPER_REQUEST_TIMEOUT_SECS", "30"),
    )?;
    let scraper_user_agent = or_default(
        "UTRABEAUTY_SCRAPER_USER_AGENT",
        "utrabeauty-importer/0.1",
    );
    let scraper_max_retries: u32 = parse_as(
        "UTRABEAUTY_SCRAPER_MAX_RETRIES",
        &or_default("UTRABEAUTY_SCRAPER_MAX_RETRIES", "2"),
    )?;
    let scraper_retry_backoff_base_secs: u64 = parse_as(
        "UTRABEAUTY_SCRAPER_RETRY_BACKOFF_BASE_SECS",
        &or_default("UTRABEAUTY_SCRAPER_RETRY_BACKOFF_BASE_SECS", "1"),
    )?;

    let import_max_images: usize = parse_as(
        "UTRABEAUTY_IMPORT_MAX_IMAGES",
        &or_default("UTRABEAUTY_IMPORT_MAX_IMAGES", "8"),
    )?;
    let import_max_image_bytes: u64 = parse_as(
        "UTRABEAUTY_IMPORT_MAX_IMAGE_BYTES",
        &or_default("UTRABEAUTY_IMPORT_MAX_IMAGE_BYTES", "10485760"),
    )?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "UTRABEAUTY_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        categories_path,
        selectors_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        cms_api_url,
        cms_dataset,
        cms_token,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        import_max_images,
        import_max_image_bytes,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "UTRABEAUTY_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
