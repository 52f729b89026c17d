//! HTTP route modules.

pub mod health;
pub mod status;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full status router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(status::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
