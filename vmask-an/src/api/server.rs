//! HTTP server setup and routing
//!
//! Sets up the Axum router for the anonymization and agreement endpoints.

use crate::config::Config;
use crate::replace::ReplacementEngine;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application context passed to all handlers
///
/// AppContext implements Clone, which gives us `FromRef<AppContext>` for free
/// via Axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub engine: Arc<ReplacementEngine>,
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
}

/// Build the application router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Anonymization
        .route("/anonymize", post(super::handlers::anonymize))
        // Annotation sets
        .route("/annotations", post(super::handlers::store_annotations))
        .route(
            "/annotations/:fingerprint",
            get(super::handlers::list_annotations),
        )
        // Agreement
        .route(
            "/agreement/:fingerprint",
            get(super::handlers::agreement_records),
        )
        .route(
            "/agreement/:fingerprint/summary",
            get(super::handlers::agreement_summary),
        )
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
