//! Model identity and synthesized metadata.

use serde::Serialize;

/// Upstream's canonical model name, e.g. `meta-llama/llama-3-70b-instruct`.
pub type ModelIdentifier = String;

/// Client-supplied model name. May be a full identifier, the suffix of
/// one, or something the catalog has never seen.
pub type ModelAlias = str;

/// Presentation-only metadata derived from a model identifier.
///
/// Nothing here is measured. The upstream API exposes only identifiers, so
/// size class and family are guessed lexically and the remaining fields are
/// fixed placeholders that Ollama clients expect to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    /// Full upstream identifier.
    pub identifier: ModelIdentifier,
    /// Final `/`-delimited segment of the identifier.
    pub display_name: String,
    /// Hex SHA-256 of the identifier.
    pub digest: String,
    /// Size class label such as `"70B"`.
    pub parameter_size: String,
    /// Nominal parameter count matching `parameter_size`.
    pub parameter_count: u64,
    pub family: String,
    pub quantization_level: String,
    pub format: String,
    pub context_length: u64,
    /// Nominal on-disk size reported to clients.
    pub size: u64,
}
