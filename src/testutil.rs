//! Shared test helpers for aurora-nexus unit tests.

use std::sync::Arc;

use crate::auth::SessionStore;
use crate::config::{AuthConfig, Config, NodeConfig, StorageBackend, StorageConfig};
use crate::registry::FileRegistry;
use crate::storage::{KeyValueStore, MemoryStore};
use crate::AppState;

/// Create a test AppState over an in-memory backend with no login delay.
pub fn test_state() -> Arc<AppState> {
    let config = Config {
        auth: AuthConfig {
            login_delay_ms: 0,
            ..AuthConfig::default()
        },
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        },
        max_upload_size: 1024 * 1024, // 1MB for tests
    };

    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let sessions =
        SessionStore::open(Arc::clone(&kv), &config.auth).expect("Failed to open session store");
    let files = FileRegistry::open(kv);

    Arc::new(AppState {
        config,
        files,
        sessions,
    })
}
