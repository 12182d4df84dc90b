pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod document;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod stores;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::{AppState, SharedState, Stores};
use crate::stores::{LocalStore, PgStore, StoreError, TenantStore};

const MIGRATION_RETRY: Duration = Duration::from_secs(30);

/// Opens the configured backends. The primary pool connects lazily so an
/// unreachable database only marks that store unavailable; its migrations
/// are retried in the background until they succeed. Tenant databases are
/// migrated when an organization is provisioned.
pub async fn connect_stores(config: &Config) -> Result<Stores, StoreError> {
    let primary = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.store_timeout)
                .connect_lazy(url)?;
            let store = Arc::new(PgStore::new(pool));
            migrate_primary(store.clone(), config.store_timeout).await;
            Some(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, primary store disabled");
            None
        }
    };

    let tenant = config.tenant_database_url.as_ref().map(|template| {
        tracing::info!("Per-tenant store enabled");
        Arc::new(TenantStore::new(template.clone(), config.store_timeout))
    });

    let local = Arc::new(LocalStore::in_dir(&config.data_dir));
    tracing::info!(path = %config.data_dir.display(), "Local fallback store ready");

    Ok(Stores {
        primary,
        tenant,
        local,
    })
}

async fn try_migrate(store: &PgStore, timeout: Duration) -> Result<(), String> {
    match tokio::time::timeout(timeout, store.migrate()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("timed out".to_string()),
    }
}

async fn migrate_primary(store: Arc<PgStore>, timeout: Duration) {
    match try_migrate(&store, timeout).await {
        Ok(()) => {
            tracing::info!("Primary store connected, migrations applied");
            return;
        }
        Err(e) => {
            tracing::warn!("Primary store unavailable at startup, serving from fallbacks: {e}");
        }
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MIGRATION_RETRY);
        interval.tick().await;
        loop {
            interval.tick().await;
            match try_migrate(&store, timeout).await {
                Ok(()) => {
                    tracing::info!("Primary store reachable, migrations applied");
                    break;
                }
                Err(e) => tracing::debug!("Primary store migrations still pending: {e}"),
            }
        }
    });
}

pub fn build_state(config: Config, stores: Stores) -> SharedState {
    Arc::new(AppState::new(config, stores))
}

pub fn build_app(state: SharedState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
