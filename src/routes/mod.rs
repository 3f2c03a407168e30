//! Route tables.

mod common;
mod readings;
pub use common::common_routes;
pub use readings::reading_routes;

use crate::state::AppState;
use axum::Router;

/// Readings at `/` plus health, readiness, and version. Middleware is layered on by the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(reading_routes(state))
}
