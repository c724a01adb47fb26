use std::sync::Arc;

use minikart::MemberIdAllocator;
use minikart_store::Store;

use crate::server::config::ServerConfig;

/// Shared state handed to every handler.
pub struct AppState {
    pub store: Store,
    pub allocator: MemberIdAllocator,
    pub config: ServerConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Opens the document store and wires up the allocator.
    pub fn new(config: ServerConfig) -> anyhow::Result<SharedState> {
        let store = Store::open(&config.db_path)?;
        Ok(Arc::new(Self {
            store,
            allocator: MemberIdAllocator::default(),
            config,
        }))
    }
}
