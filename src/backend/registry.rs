//! Client registry.
//!
//! Creating a backend client builds an HTTP connection pool, which is too
//! expensive to repeat per document. The registry hands out exactly one
//! cached client per backend kind for the life of the process; `shutdown`
//! releases every cached client and is intended to run once at process
//! exit.

use super::{AzureClient, BackendClient, DoclingClient};
use crate::config::{BackendKind, HybridSettings};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Caches one client instance per backend kind.
///
/// Safe for concurrent use by multiple documents: creation-on-miss happens
/// at most once per backend kind, and cache entries are immutable handles
/// once populated.
pub struct ClientRegistry {
    cache: Mutex<HashMap<BackendKind, Arc<dyn BackendClient>>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static ClientRegistry {
        static GLOBAL: OnceLock<ClientRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ClientRegistry::new)
    }

    /// Get the cached client for a backend, creating it on first request.
    ///
    /// Settings are only consulted when the client is created; later calls
    /// for the same backend return the cached instance unchanged.
    pub fn get_or_create(
        &self,
        kind: BackendKind,
        settings: &HybridSettings,
    ) -> Result<Arc<dyn BackendClient>> {
        // The lock is held across creation so a concurrent first access
        // cannot construct a second client for the same backend.
        let mut cache = self.lock_cache();

        if let Some(client) = cache.get(&kind) {
            return Ok(Arc::clone(client));
        }

        log::info!("creating {} backend client", kind);
        let client: Arc<dyn BackendClient> = match kind {
            BackendKind::Docling => Arc::new(DoclingClient::new(settings)?),
            BackendKind::Azure => Arc::new(AzureClient::new(settings)?),
        };

        cache.insert(kind, Arc::clone(&client));
        Ok(client)
    }

    /// Shut down every cached client and clear the cache.
    pub fn shutdown(&self) {
        let mut cache = self.lock_cache();
        for (kind, client) in cache.drain() {
            log::debug!("shutting down {} client", kind);
            client.shutdown();
        }
    }

    /// Number of cached clients.
    pub fn len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<BackendKind, Arc<dyn BackendClient>>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
