mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use astromap_ephem::{SwissEphOracle, AstronomicalOracle};
use astromap_matcher::{CityCatalog, PowerSpotMatcher};
use astromap_store::ResultStore;
use astromap_tz::{HttpTimezoneLookup, TimeNormalizer};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = astromap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = Arc::new(CityCatalog::load(&config.cities_path));
    let oracle: Arc<dyn AstronomicalOracle> = Arc::new(SwissEphOracle::new());
    let matcher = PowerSpotMatcher::new(oracle, Arc::clone(&catalog))
        .with_parallel(config.match_parallel);

    let lookup = HttpTimezoneLookup::new(
        &config.tz_lookup_url,
        config.tz_lookup_timeout_secs,
        &config.user_agent,
    )?;

    let state = AppState {
        matcher,
        normalizer: TimeNormalizer::new(Arc::new(lookup)),
        store: ResultStore::new(config.results_dir.clone()),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    };
    let app = build_app(state);

    tracing::info!(
        env = %config.env,
        bind_addr = %config.bind_addr,
        cities = catalog.len(),
        catalog_source = %catalog.source(),
        results_dir = %config.results_dir.display(),
        "starting astromap server"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
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
