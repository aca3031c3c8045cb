//! Beacon Daemon — Location Sharing & Presence Synchronization
//!
//! Main entry point that wires all crates together and runs the engine.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use beacon_cache::CacheManager;
use beacon_core::config::AppConfig;
use beacon_core::error::AppError;
use beacon_core::traits::cache::CacheProvider;
use beacon_core::traits::location::LocationProvider;
use beacon_engine::SyncEngine;
use beacon_geo::{GeoSampler, HttpGeocoder, ReverseGeocoder, SimulatedProvider};
use beacon_store::{RosterManager, RosterStore};

#[tokio::main]
async fn main() {
    let env = std::env::var("BEACON_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main daemon run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Beacon v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Initialize cache ─────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing presence cache...");
    let cache = CacheManager::new(&config.cache).await?;
    cache.health_check().await?;
    tracing::info!("Presence cache initialized");

    // ── Step 2: Initialize roster store ──────────────────────────
    tracing::info!(backend = %config.store.backend, "Initializing roster store...");
    let store = RosterManager::new(&config.store)?;
    if !store.health_check().await.unwrap_or(false) {
        tracing::warn!("Roster store unreachable; operating in degraded mode");
    }

    // ── Step 3: Location provider + sampler ──────────────────────
    let origin = (35.6895, 139.6917);
    let provider = Arc::new(SimulatedProvider::with_position(origin.0, origin.1));
    let walk = SimulatedProvider::start_walk(
        &provider,
        origin,
        Duration::from_millis(config.geo.min_interval_ms),
    );
    let geo = Arc::new(GeoSampler::new(
        Arc::clone(&provider) as Arc<dyn LocationProvider>,
        config.geo.clone(),
    ));

    // ── Step 4: Optional reverse geocoder ────────────────────────
    let geocoder: Option<Arc<dyn ReverseGeocoder>> = if config.geocoder.enabled {
        tracing::info!(base_url = %config.geocoder.base_url, "Reverse geocoder enabled");
        Some(Arc::new(HttpGeocoder::new(&config.geocoder)?))
    } else {
        None
    };

    // ── Step 5: Build and initialize the engine ──────────────────
    let engine = SyncEngine::new(None, geo, store, cache, geocoder).await?;
    engine.initialize().await?;

    let _location_log = engine.add_location_listener(|sample| {
        tracing::info!(
            latitude = sample.latitude,
            longitude = sample.longitude,
            timestamp_ms = sample.timestamp_ms,
            "Location update"
        );
    });
    let _sharing_log = engine.add_share_status_listener(|sharing| {
        tracing::info!(sharing, "Sharing state changed");
    });

    engine.start_location_sharing().await?;
    tracing::info!(user = %engine.user_id(), "Beacon daemon running; Ctrl+C to stop");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    walk.abort();
    engine.cleanup().await;
    tracing::info!("Beacon daemon shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
