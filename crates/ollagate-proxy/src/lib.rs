//! Ollama-compatible HTTP surface for ollagate.
//!
//! Serves the Ollama `/api/*` routes on top of [`ollagate_core::Gateway`]
//! and provides [`upstream::OpenAiBackend`], the HTTP adapter for an
//! OpenAI-compatible chat completion service.
#![deny(unsafe_code)]

pub mod config;
pub mod error;
mod ollama_handlers;
pub mod ollama_models;
pub mod ollama_pull;
pub mod ollama_stream;
pub mod server;
pub mod upstream;

pub use config::{ModelFilter, ProxyConfig};
pub use server::{create_router, serve};
pub use upstream::{OpenAiBackend, UpstreamConfig};
