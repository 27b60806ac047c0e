mod admin;
mod auth;
mod config;
mod db;
mod errors;
mod fallback;
mod models;
mod newsletter_sync;
mod payments;
mod routes;
mod state;
mod store;
mod submissions;


use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{apply_schema, create_pool};
use crate::fallback::LocalJsonStore;
use crate::newsletter_sync::NewsletterSync;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "founders_api={},tower_http={}",
                &config.rust_log, &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting founders API v{}", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(&config.database_url)?;
    if config.run_migrations {
        apply_schema(&pool).await;
    }

    let local = LocalJsonStore::new(config.data_dir.clone());
    info!("Local fallback directory: {}", config.data_dir.display());

    let newsletter_sync = NewsletterSync::new(
        config.newsletter_sync_url.clone(),
        config.newsletter_sync_api_key.clone(),
    )?;
    if newsletter_sync.is_enabled() {
        info!("Newsletter provider sync enabled");
    }

    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN is not set; admin list views are unauthenticated");
    }

    let state = AppState {
        remote: Arc::new(PgStore::new(pool)),
        local,
        newsletter_sync,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
