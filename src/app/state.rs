use std::sync::Arc;

use crate::mongo::registry::ClientRegistry;

/// Shared per-process state handed to every handler. The registry is the
/// only shared mutable piece in the core; constructing one per test keeps
/// instances isolated.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ClientRegistry>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ClientRegistry::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
