//! Gateway service - the facade the HTTP dispatcher talks to.
//!
//! Orchestrates translation, alias resolution, the backend call and
//! reframing. It knows nothing about HTTP or the Ollama wire format.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{Completion, ModelDescriptor, ModelIdentifier};
use crate::error::GatewayError;
use crate::ports::{BackendStream, ChatBackendPort, EventSink};
use crate::services::catalog::ModelCatalog;
use crate::services::metadata;
use crate::services::reframe::{StreamOutcome, StreamReframer};
use crate::services::translate::{InboundRequest, translate};

/// Translation gateway over a single chat backend.
#[derive(Debug)]
pub struct Gateway {
    backend: Arc<dyn ChatBackendPort>,
    catalog: ModelCatalog,
}

/// A backend stream that has been opened successfully.
///
/// All fallible pre-stream work (validation, alias resolution, opening the
/// upstream call) is done by the time this exists, so the dispatcher can
/// commit to a success status before pumping.
pub struct PreparedStream {
    model: ModelIdentifier,
    stream: BackendStream,
}

impl std::fmt::Debug for PreparedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStream")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl PreparedStream {
    /// Resolved upstream identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Reframe the backend stream into `sink` until `Done` or `Aborted`.
    pub async fn pump<W>(self, sink: &mut W) -> StreamOutcome
    where
        W: EventSink + ?Sized,
    {
        StreamReframer::new(self.model).run(self.stream, sink).await
    }
}

impl Gateway {
    pub fn new(backend: Arc<dyn ChatBackendPort>) -> Self {
        Self {
            catalog: ModelCatalog::new(Arc::clone(&backend)),
            backend,
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Resolve a client alias to an upstream identifier.
    ///
    /// # Errors
    ///
    /// `UpstreamUnavailable` if the catalog had to be fetched and that failed.
    pub async fn resolve_alias(&self, alias: &str) -> Result<ModelIdentifier, GatewayError> {
        self.catalog.resolve(alias).await
    }

    /// Refresh the catalog and describe every model in it.
    ///
    /// # Errors
    ///
    /// `UpstreamUnavailable` if the catalog fetch fails.
    pub async fn list_descriptors(&self) -> Result<Vec<ModelDescriptor>, GatewayError> {
        Ok(self.catalog.fetch_catalog().await?.descriptors())
    }

    /// Describe the model an alias refers to.
    ///
    /// Matches the alias or its resolved identifier against both display
    /// names and full identifiers of the cached catalog.
    ///
    /// # Errors
    ///
    /// `NotFound` if neither matches a catalog entry, `UpstreamUnavailable`
    /// if the catalog could not be loaded.
    pub async fn describe_model(&self, alias: &str) -> Result<ModelDescriptor, GatewayError> {
        let snapshot = self.catalog.ensure_loaded().await?;
        let resolved = snapshot.lookup(alias).map_or(alias, String::as_str);

        snapshot
            .find_named(alias)
            .or_else(|| snapshot.find_named(resolved))
            .map(|id| metadata::describe(id))
            .ok_or_else(|| GatewayError::NotFound(alias.to_string()))
    }

    /// Validate, resolve and open the backend stream.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for bad input (no upstream call is made),
    /// `UpstreamUnavailable` if resolution or the stream open fails.
    pub async fn open_stream(
        &self,
        request: InboundRequest,
    ) -> Result<PreparedStream, GatewayError> {
        let translated = translate(request)?;
        let model = self.catalog.resolve(&translated.alias).await?;
        info!(alias = %translated.alias, model = %model, "Opening backend stream");

        let stream = self
            .backend
            .stream(translated.into_chat_request(model.clone(), true))
            .await?;
        Ok(PreparedStream { model, stream })
    }

    /// Translate a request and stream the reframed events into `sink`.
    ///
    /// Returns only after the stream is `Done` or `Aborted`.
    ///
    /// # Errors
    ///
    /// Pre-stream failures only; mid-stream failures are reported in-band
    /// and through the returned `StreamOutcome`.
    pub async fn translate_and_stream<W>(
        &self,
        request: InboundRequest,
        sink: &mut W,
    ) -> Result<StreamOutcome, GatewayError>
    where
        W: EventSink + ?Sized,
    {
        let prepared = self.open_stream(request).await?;
        Ok(prepared.pump(sink).await)
    }

    /// Run a non-streaming completion.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for bad input, `UpstreamUnavailable` otherwise.
    pub async fn complete(&self, request: InboundRequest) -> Result<Completion, GatewayError> {
        let translated = translate(request)?;
        let model = self.catalog.resolve(&translated.alias).await?;
        debug!(alias = %translated.alias, model = %model, "Requesting completion");

        Ok(self
            .backend
            .complete(translated.into_chat_request(model, false))
            .await?)
    }
}
