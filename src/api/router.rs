//! Status API router.
//!
//! Read-only and unauthenticated: the API binds to loopback for the
//! serving layer's poll loop, so there is no middleware stack.

use axum::routing::get;
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the status API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn status_api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/status/:session_id", get(endpoints::status::lookup))
        .with_state(ctx)
}
