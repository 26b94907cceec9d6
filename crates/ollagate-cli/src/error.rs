//! CLI error types and exit codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// No API key from flag, environment or argument.
    #[error("OPENAI_API_KEY environment variable or command-line argument not set")]
    MissingApiKey,

    /// Configuration could not be loaded or applied.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listener could not be bound.
    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Exit codes follow sysexits.h.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingApiKey => 2, // EX_USAGE
            Self::Config(_) => 78,    // EX_CONFIG
            Self::Io(_) => 74,        // EX_IOERR
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::MissingApiKey.exit_code(), 2);
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
        assert_eq!(
            CliError::from(std::io::Error::other("bind")).exit_code(),
            74
        );
    }
}
