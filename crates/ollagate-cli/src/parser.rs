//! Command-line arguments.
//!
//! Every option can also come from the environment; `.env` files are
//! loaded before parsing.

use std::path::PathBuf;

use clap::Parser;

use ollagate_proxy::config::DEFAULT_MODELS_FILTER_PATH;
use ollagate_proxy::upstream::DEFAULT_BASE_URL;

/// Serve the Ollama API on top of an OpenAI-compatible backend.
#[derive(Debug, Parser)]
#[command(name = "ollagate")]
#[command(about = "Ollama-compatible gateway for OpenAI-compatible chat backends")]
#[command(version)]
pub struct Cli {
    /// Upstream API key
    #[arg(long = "api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API key given as a bare argument (used when no flag or env var is set)
    #[arg(value_name = "API_KEY", hide = true)]
    pub api_key_positional: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long = "base-url", env = "OLLAGATE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Address to listen on
    #[arg(long, env = "OLLAGATE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "OLLAGATE_PORT", default_value_t = 11434)]
    pub port: u16,

    /// File listing the model names `/api/tags` may show, one per line
    #[arg(long = "models-filter", env = "OLLAGATE_MODELS_FILTER", default_value = DEFAULT_MODELS_FILTER_PATH)]
    pub models_filter: PathBuf,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// The API key from `--api-key`/`OPENAI_API_KEY`, else the positional
    /// argument. Blank values count as missing.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.api_key_positional
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
            })
    }

    /// `host:port` to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "ollagate",
            "--api-key",
            "sk-flag",
            "--base-url",
            "http://127.0.0.1:8080/v1",
            "--port",
            "8000",
            "--models-filter",
            "/etc/ollagate/models",
            "--verbose",
        ]);
        assert_eq!(cli.api_key(), Some("sk-flag"));
        assert_eq!(cli.base_url, "http://127.0.0.1:8080/v1");
        assert_eq!(cli.listen_addr(), "0.0.0.0:8000");
        assert_eq!(cli.models_filter, PathBuf::from("/etc/ollagate/models"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_flag_beats_positional() {
        let cli = Cli::parse_from(["ollagate", "--api-key", "sk-flag", "sk-positional"]);
        assert_eq!(cli.api_key(), Some("sk-flag"));
    }

    #[test]
    fn test_blank_key_falls_back_to_positional() {
        let cli = Cli::parse_from(["ollagate", "--api-key", "", "sk-positional"]);
        assert_eq!(cli.api_key(), Some("sk-positional"));
    }

    #[test]
    fn test_no_key() {
        let cli = Cli {
            api_key: None,
            api_key_positional: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 11434,
            models_filter: PathBuf::from(DEFAULT_MODELS_FILTER_PATH),
            verbose: false,
        };
        assert_eq!(cli.api_key(), None);
        assert_eq!(cli.listen_addr(), "127.0.0.1:11434");
    }
}
