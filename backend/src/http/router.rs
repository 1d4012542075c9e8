//! Route table and middleware stack.
//!
//! Every API route lives under `/{version}/api`; only `/health` sits at the root.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Version segment of every API path, taken from the crate version.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default request body limit.
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Create the main application router with the default body limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_limit(state, DEFAULT_BODY_LIMIT)
}

/// Create the router, accepting request bodies up to `body_limit` bytes.
pub fn create_router_with_limit(state: AppState, body_limit: usize) -> Router {
    // CORS configuration - permissive, the gateway sits on a plant network
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/status", get(handlers::status))
        .route("/version", get(handlers::version))
        // Measurements
        .route("/data/write", post(handlers::write_data))
        .route("/data/read/{measurement}", get(handlers::read_data))
        // Dictionaries
        .route("/dataDictionary/write", post(handlers::write_data_dictionary))
        .route("/dataDictionary/read", get(handlers::read_data_dictionary))
        .route("/equipmentDictionary/write", post(handlers::write_equipment_dictionary))
        .route("/equipmentDictionary/read", get(handlers::read_equipment_dictionary));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest(&api_prefix(), api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `/{version}/api`
pub fn api_prefix() -> String {
    format!("/{}/api", API_VERSION)
}
