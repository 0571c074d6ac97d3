mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use utrabeauty_cms::{CmsClient, ImportLimits, Importer};
use utrabeauty_core::AppConfig;
use utrabeauty_scraper::{load_selector_set, ListingScraper};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = utrabeauty_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = utrabeauty_db::PoolConfig::from_app_config(&config);
    let pool = utrabeauty_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = utrabeauty_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let categories = utrabeauty_core::load_categories(&config.categories_path)?.categories;
    let importer = build_importer(&config, categories.clone())?;

    let _scheduler = scheduler::build_scheduler(pool.clone()).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        utrabeauty_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        importer: Arc::new(importer),
        categories: Arc::new(categories),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_importer(
    config: &AppConfig,
    categories: Vec<utrabeauty_core::Category>,
) -> anyhow::Result<Importer> {
    let mut scraper = ListingScraper::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )?;
    if let Some(path) = &config.selectors_path {
        let selectors = load_selector_set(path)
            .and_then(|set| set.compile())
            .with_context(|| format!("loading selectors from {}", path.display()))?;
        scraper = scraper.with_selectors(selectors);
    }

    let (api_url, token) = config.cms_credentials()?;
    let cms = CmsClient::new(
        api_url,
        &config.cms_dataset,
        token,
        config.scraper_request_timeout_secs,
    )?;

    Ok(Importer::new(
        scraper,
        cms,
        categories,
        ImportLimits {
            max_images: config.import_max_images,
            max_image_bytes: config.import_max_image_bytes,
        },
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
