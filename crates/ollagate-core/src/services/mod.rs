//! Core services - the gateway's translation logic.
//!
//! Services orchestrate between ports (trait interfaces) and domain
//! logic. They don't know about concrete HTTP clients or servers.

pub mod catalog;
pub mod gateway;
pub mod metadata;
pub mod reframe;
pub mod translate;

pub use catalog::{CatalogSnapshot, ModelCatalog};
pub use gateway::{Gateway, PreparedStream};
pub use reframe::{DEFAULT_FINISH_REASON, ReframerState, StreamOutcome, StreamReframer};
pub use translate::{InboundRequest, MessagesRequest, PromptRequest, TranslatedRequest, translate};
