mod admin;
mod auth;
mod config;
mod dashboard;
mod db;
mod errors;
mod models;
mod profiles;
mod routes;
mod state;
mod storage;
mod store;
mod students;
mod tickets;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::HostedAuthClient;
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3DocumentStorage;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tremplin API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config).await?;
    let store = Arc::new(PgStore::new(db));

    let identity = Arc::new(HostedAuthClient::new(
        config.auth_url.clone(),
        config.auth_anon_key.clone(),
        config.auth_service_role_key.clone(),
    )?);
    info!("Identity provider client initialized ({})", config.auth_url);

    let storage = Arc::new(S3DocumentStorage::from_config(&config).await);
    info!("Document storage initialized (bucket: {})", config.s3_bucket);

    if config.admin_secret.is_none() {
        warn!("ADMIN_SECRET is not set; admin listing and role elevation are disabled");
    }

    let state = AppState {
        store,
        identity,
        storage,
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
