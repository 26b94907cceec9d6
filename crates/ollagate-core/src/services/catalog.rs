//! Model catalog resolver.
//!
//! Holds the last fetched list of upstream identifiers and maps client
//! aliases onto it. The snapshot is replaced wholesale: a fetch builds the
//! new list without holding the lock and only swaps the `Arc` under a
//! short write lock, so resolves never wait on the network and never see
//! a partially built list.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::{ModelDescriptor, ModelIdentifier};
use crate::error::GatewayError;
use crate::ports::ChatBackendPort;
use crate::services::metadata;

/// Ordered list of upstream identifiers from a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    identifiers: Vec<ModelIdentifier>,
}

impl CatalogSnapshot {
    #[must_use]
    pub const fn new(identifiers: Vec<ModelIdentifier>) -> Self {
        Self { identifiers }
    }

    #[must_use]
    pub fn identifiers(&self) -> &[ModelIdentifier] {
        &self.identifiers
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Exact match first, then the first identifier (in snapshot order)
    /// that ends with `alias`.
    #[must_use]
    pub fn lookup(&self, alias: &str) -> Option<&ModelIdentifier> {
        if alias.is_empty() {
            return None;
        }
        self.identifiers
            .iter()
            .find(|id| id.as_str() == alias)
            .or_else(|| self.identifiers.iter().find(|id| id.ends_with(alias)))
    }

    /// Find the identifier whose display name or full id equals `name`.
    #[must_use]
    pub fn find_named(&self, name: &str) -> Option<&ModelIdentifier> {
        self.identifiers
            .iter()
            .find(|id| metadata::display_name(id) == name || id.as_str() == name)
    }

    /// Descriptors for every identifier, in snapshot order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ModelDescriptor> {
        self.identifiers
            .iter()
            .map(|id| metadata::describe(id))
            .collect()
    }
}

/// Owner of the catalog snapshot.
#[derive(Debug)]
pub struct ModelCatalog {
    backend: Arc<dyn ChatBackendPort>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl ModelCatalog {
    pub fn new(backend: Arc<dyn ChatBackendPort>) -> Self {
        Self {
            backend,
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::default())),
        }
    }

    /// The current snapshot, possibly empty.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Fetch the model list from the backend and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::UpstreamUnavailable` if the backend call fails.
    /// The previous snapshot is kept in that case.
    pub async fn fetch_catalog(&self) -> Result<Arc<CatalogSnapshot>, GatewayError> {
        let identifiers = self.backend.list_models().await.map_err(|e| {
            warn!("Failed to fetch model catalog: {e}");
            GatewayError::UpstreamUnavailable(format!("failed to get models: {e}"))
        })?;

        debug!(count = identifiers.len(), "Fetched model catalog");
        let fresh = Arc::new(CatalogSnapshot::new(identifiers));
        *self.snapshot.write().await = Arc::clone(&fresh);
        Ok(fresh)
    }

    /// Return the cached snapshot, fetching first if it is empty.
    ///
    /// # Errors
    ///
    /// Propagates `fetch_catalog` failures.
    pub async fn ensure_loaded(&self) -> Result<Arc<CatalogSnapshot>, GatewayError> {
        let current = self.snapshot().await;
        if current.is_empty() {
            return self.fetch_catalog().await;
        }
        Ok(current)
    }

    /// Resolve a client alias to an upstream identifier.
    ///
    /// Unknown aliases are returned unchanged so identifiers added upstream
    /// after the last fetch still work.
    ///
    /// # Errors
    ///
    /// Fails only when the catalog is empty and the fetch fails.
    pub async fn resolve(&self, alias: &str) -> Result<ModelIdentifier, GatewayError> {
        let snapshot = self.ensure_loaded().await?;
        let resolved = snapshot
            .lookup(alias)
            .cloned()
            .unwrap_or_else(|| alias.to_string());
        debug!(alias, resolved = %resolved, "Resolved model alias");
        Ok(resolved)
    }
}
