//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors are
//! rendered by the rendezvous crate.

mod settings;

use axum::{
    Router, http,
    http::{Method, header},
};
use platform::clock::{SharedClock, SystemClock};
use rendezvous::domain::repository::{CodeRegistry, IdentityRepository};
use rendezvous::{
    MemoryRendezvousRepository, PgRendezvousRepository, ReapExpiredUseCase, RendezvousConfig,
    rendezvous_router, spawn_reaper,
};
use settings::{Settings, Storage};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,rendezvous=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let clock = SystemClock::shared();

    tracing::info!(
        storage = ?settings.storage,
        code_length = settings.rendezvous.code_length,
        alphabet_len = settings.rendezvous.alphabet.len(),
        "Configuration loaded"
    );

    match settings.storage {
        Storage::Memory => serve(MemoryRendezvousRepository::new(), settings, clock).await,
        Storage::Postgres => {
            let database_url = settings
                .database_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            serve(PgRendezvousRepository::new(pool), settings, clock).await
        }
    }
}

async fn serve<R>(repo: R, settings: Settings, clock: SharedClock) -> anyhow::Result<()>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let config: RendezvousConfig = settings.rendezvous.clone();
    let reaper = ReapExpiredUseCase::new(Arc::new(repo.clone()), clock.clone());

    // Startup cleanup: remove entries that expired while we were down
    // Errors here should not prevent server startup
    match reaper.execute().await {
        Ok(removed) => {
            tracing::info!(removed = removed, "Startup sweep completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Startup sweep failed, continuing anyway");
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper_handle = spawn_reaper(reaper, config.reap_interval, shutdown_rx);

    // Build router
    let app = Router::new()
        .merge(rendezvous_router(repo, config, clock))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&settings.frontend_origins));

    // Start server
    let addr = settings.bind_addr;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    reaper_handle.await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn cors_layer(frontend_origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let allow_origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]))
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
