//! Shared state for the status API.

use std::sync::Arc;

use crate::store::ObjectStore;

/// Shared context for all API routes: the session store plus the prefix
/// the serving layer logs under.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn ObjectStore>,
    pub source_prefix: String,
}

impl ApiContext {
    pub fn new(store: Arc<dyn ObjectStore>, source_prefix: impl Into<String>) -> Self {
        Self {
            store,
            source_prefix: source_prefix.into(),
        }
    }
}
