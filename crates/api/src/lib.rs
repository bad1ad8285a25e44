//! HTTP API server with observability for the storefront order engine.
//!
//! Provides REST endpoints for businesses, inventory and orders,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::InMemoryStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, CommerceStore};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CommerceStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/businesses", post(routes::businesses::register::<S>))
        .route(
            "/businesses/{business_id}/inventory",
            get(routes::inventory::list::<S>).post(routes::inventory::create::<S>),
        )
        .route(
            "/businesses/{business_id}/inventory/{item_id}",
            patch(routes::inventory::update::<S>).delete(routes::inventory::delete::<S>),
        )
        .route(
            "/businesses/{business_id}/orders",
            get(routes::orders::list::<S>).post(routes::orders::place::<S>),
        )
        .route(
            "/businesses/{business_id}/orders/{order_id}",
            get(routes::orders::get::<S>),
        )
        .route(
            "/businesses/{business_id}/orders/{order_id}/ship",
            post(routes::orders::ship::<S>),
        )
        .route(
            "/businesses/{business_id}/orders/{order_id}/complete",
            post(routes::orders::complete::<S>),
        )
        .route(
            "/businesses/{business_id}/orders/{order_id}/cancel",
            post(routes::orders::cancel::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over a fresh in-memory store.
pub fn create_default_state(place_order_timeout: Duration) -> Arc<AppState<InMemoryStore>> {
    create_state(InMemoryStore::new(), place_order_timeout)
}

/// Creates application state over the given store.
pub fn create_state<S: CommerceStore>(store: S, place_order_timeout: Duration) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, place_order_timeout))
}
