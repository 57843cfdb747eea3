//! HTTP surface of the proxy.

mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/incidents", get(handlers::list_incidents))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
