//! Shared application state for all routes.

use crate::service::ReadingStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
    /// Secret expected in `X-Authorization` on writes. `None` rejects every write.
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ReadingStore>, api_key: Option<String>) -> Self {
        AppState {
            store,
            api_key: api_key.map(Arc::from),
        }
    }
}
