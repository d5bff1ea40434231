mod api;
mod catalog;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use ssn_core::{AppConfig, CatalogSource};
use ssn_geocode::GeocodeClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, rate_limit_state, AppState},
    catalog::Catalog,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ssn_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        env = %config.env,
        catalog = %config.catalog_source,
        bind_addr = %config.bind_addr,
        "starting ssn-server"
    );

    let catalog = init_catalog(&config).await?;
    let geocoder = init_geocoder(&config)?;

    let state = AppState {
        catalog: catalog.clone(),
        geocoder,
        geolocation_timeout: Duration::from_secs(config.geolocation_timeout_secs),
    };
    let app = build_app(state, rate_limit_state(config.rate_limit_per_minute));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    catalog.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Snapshot load failures leave the server running with an unavailable
/// catalog; database failures in live mode abort startup.
async fn init_catalog(config: &AppConfig) -> anyhow::Result<Catalog> {
    match &config.catalog_source {
        CatalogSource::Snapshot(path) => match ssn_core::load_snapshot(path) {
            Ok(snapshot) => {
                tracing::info!(
                    path = %path.display(),
                    services = snapshot.services.len(),
                    locations = snapshot.locations.len(),
                    "catalog snapshot loaded"
                );
                Ok(Catalog::from_snapshot(snapshot))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path.display(),
                    "failed to load catalog snapshot"
                );
                Ok(Catalog::Missing)
            }
        },
        CatalogSource::Live => {
            let pool = ssn_db::connect_pool_from_config(config).await?;
            let applied = ssn_db::run_migrations(&pool).await?;
            tracing::info!(applied, "database ready");
            Ok(Catalog::Live(pool))
        }
    }
}

fn init_geocoder(config: &AppConfig) -> anyhow::Result<Option<Arc<GeocodeClient>>> {
    let Some(api_key) = config.geocode_api_key.as_deref() else {
        tracing::warn!("SSN_GEOCODE_API_KEY not set; postcode lookups will fail");
        return Ok(None);
    };
    let client = GeocodeClient::with_base_url(
        api_key,
        config.geocode_timeout_secs,
        &config.user_agent,
        &config.geocode_base_url,
    )?;
    Ok(Some(Arc::new(client)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
