//! Command-line entry point for the ollagate gateway.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;

// Used by the binary target only
use dotenvy as _;

pub mod bootstrap;
pub mod error;
pub mod logging;
pub mod parser;

pub use bootstrap::{GatewayContext, bootstrap, run};
pub use error::CliError;
pub use parser::Cli;
