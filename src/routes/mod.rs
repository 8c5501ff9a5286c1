pub mod customers;
pub mod invoices;
pub mod products;

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Full application: `/api/*` behind bearer auth, plus open health checks.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(invoices::routes())
        .merge(products::routes())
        .merge(customers::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", api)
        .route("/", get(|| async { "POS API" }))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
