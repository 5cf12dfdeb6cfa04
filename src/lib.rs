//! Biofeedback journal service.
//!
//! An axum API over a single PostgreSQL table of journal entries, plus the
//! transcript ingestion adapter used by the `biofeedback-ingest` binary.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod ingest;
pub mod models;

use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route(
            "/biofeedback",
            get(handlers::biofeedback::list_entries)
                .post(handlers::biofeedback::create_entry)
                .delete(handlers::biofeedback::clear_entries),
        )
        .route("/biofeedback/debug", get(handlers::biofeedback::debug_entries))
        .route("/biofeedback/schema", get(handlers::biofeedback::describe_schema))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
