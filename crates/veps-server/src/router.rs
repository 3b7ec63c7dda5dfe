use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{fracture_api, ingest, store_api, validate};
use crate::runtime::SharedState;

/// Boundary surface: ingest, batch ingest, warmup, health.
pub fn build_ingest_router(state: SharedState) -> Router {
    Router::new()
        .route("/ingest", post(ingest::ingest))
        .route("/ingest/batch", post(ingest::ingest_batch))
        .route("/warmup", post(ingest::warmup))
        .route("/health", get(ingest::health))
        .with_state(state)
}

/// Validator surface: validate, health.
pub fn build_validator_router(state: SharedState) -> Router {
    Router::new()
        .route("/validate", post(validate::validate))
        .route("/health", get(validate::health))
        .with_state(state)
}

/// Context-store surface: update, event lookup, causality, query, health.
pub fn build_store_router(state: SharedState) -> Router {
    Router::new()
        .route("/update", post(store_api::update))
        .route("/event", get(store_api::get_event))
        .route("/causality", post(store_api::causality))
        .route("/events/query", post(store_api::query_events))
        .route("/health", get(store_api::health))
        .with_state(state)
}

/// Fracture-archive surface: log, batch log, read-by-date, health.
pub fn build_fracture_router(state: SharedState) -> Router {
    Router::new()
        .route("/fracture", post(fracture_api::log_fracture))
        .route("/fracture/batch", post(fracture_api::log_fracture_batch))
        .route("/fractures", get(fracture_api::read_fractures))
        .route("/health", get(fracture_api::health))
        .with_state(state)
}

/// Every surface on one listener (single-process deployments and tests).
/// The store surface's health handler answers `/health` since it is the
/// only one with a dependency worth pinging.
pub fn build_standalone_router(state: SharedState) -> Router {
    Router::new()
        .route("/ingest", post(ingest::ingest))
        .route("/ingest/batch", post(ingest::ingest_batch))
        .route("/warmup", post(ingest::warmup))
        .route("/validate", post(validate::validate))
        .route("/update", post(store_api::update))
        .route("/event", get(store_api::get_event))
        .route("/causality", post(store_api::causality))
        .route("/events/query", post(store_api::query_events))
        .route("/fracture", post(fracture_api::log_fracture))
        .route("/fracture/batch", post(fracture_api::log_fracture_batch))
        .route("/fractures", get(fracture_api::read_fractures))
        .route("/health", get(store_api::health))
        .with_state(state)
}
