use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::RwLock;

use lineups_core::contest::ContestCatalog;
use lineups_core::session::ConnectionId;

use crate::config::ServerConfig;
use crate::registry::SessionRegistry;

pub type SharedRegistry = Arc<RwLock<SessionRegistry>>;

#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub catalog: Arc<ContestCatalog>,
    pub config: Arc<ServerConfig>,
    pub ws_connection_count: Arc<AtomicUsize>,
    next_connection_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: ServerConfig, catalog: ContestCatalog) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            registry: Arc::new(RwLock::new(SessionRegistry::new(Arc::clone(&catalog)))),
            catalog,
            config: Arc::new(config),
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
            next_connection_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Hand out a fresh, never-reused connection handle.
    pub fn alloc_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Counts a live WebSocket connection for as long as it is held.
pub struct ConnectionGuard {
    count: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self { count }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }
}
