//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dailyspend_auth::{Hs256Tokens, PasswordHasher};
use dailyspend_core::{Clock, SystemClock};
use dailyspend_infra::{InMemoryStore, LedgerService, PostgresStore, Store};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Connects and migrates Postgres when `database_url` is set, otherwise
/// keeps everything in memory. Bootstraps the admin account if configured.
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url).await.context("failed to connect to DATABASE_URL")?;
            store.migrate().await.context("failed to migrate database schema")?;
            tracing::info!("using postgres store");
            Arc::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let tokens = Arc::new(Hs256Tokens::with_ttl(config.jwt_secret.as_bytes(), config.token_ttl));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = LedgerService::new(
        store,
        PasswordHasher::new(config.password_hash_rounds),
        tokens.clone(),
        clock.clone(),
    );

    if let Some(admin) = &config.admin {
        service
            .ensure_admin(&admin.username, &admin.password)
            .await
            .context("failed to bootstrap admin account")?;
    }

    let auth_state = middleware::AuthState { jwt: tokens, clock };
    Ok(router(Arc::new(service), auth_state, config.cors_permissive))
}

/// Assemble routes and layers around an already-built service.
pub fn router(service: Arc<LedgerService>, auth_state: middleware::AuthState, cors_permissive: bool) -> Router {
    // Protected routes: require a valid bearer token.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let app = Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::public_router().merge(protected))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(service)),
        );

    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
