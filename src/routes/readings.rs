//! Reading routes: GET / lists, PUT / inserts.

use crate::handlers::readings::{insert, list};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn reading_routes(state: AppState) -> Router {
    Router::new().route("/", get(list).put(insert)).with_state(state)
}
