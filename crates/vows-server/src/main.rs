mod config;

use std::sync::Arc;

use argon2::Argon2;
use tower_http::trace::TraceLayer;
use tracing::info;

use vows_api::{AppState, AppStateInner};
use vows_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vows=debug,vows_api=debug,vows_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if !config.secure_cookies {
        info!("Session cookies are not marked Secure (set VOWS_SECURE_COOKIES=true behind HTTPS)");
    }

    // Init database
    let db = Database::open(&config.db_path)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner::new(db, Argon2::default(), config.secure_cookies)?);

    let app = vows_api::router(state).layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Wedding planner listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable ({}), waiting for Ctrl+C", e);
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
