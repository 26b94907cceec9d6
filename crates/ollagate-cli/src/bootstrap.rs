//! Composition root: turns parsed arguments into a running gateway.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use ollagate_core::Gateway;
use ollagate_proxy::{ModelFilter, OpenAiBackend, ProxyConfig, UpstreamConfig};

use crate::error::CliError;
use crate::parser::Cli;

/// Everything `serve` needs, built from the command line.
#[derive(Debug)]
pub struct GatewayContext {
    pub gateway: Arc<Gateway>,
    pub proxy_config: ProxyConfig,
    pub listen_addr: String,
}

/// Validate arguments and wire the backend, gateway and proxy config.
pub fn bootstrap(cli: &Cli) -> Result<GatewayContext, CliError> {
    let api_key = cli.api_key().ok_or(CliError::MissingApiKey)?;

    let upstream = UpstreamConfig::new(api_key).with_base_url(cli.base_url.clone());
    info!(base_url = %upstream.base_url, "Using upstream API");
    let backend =
        OpenAiBackend::new(upstream).map_err(|e| CliError::Config(format!("{e:#}")))?;

    let model_filter = ModelFilter::load(&cli.models_filter).map_err(|e| {
        CliError::Config(format!(
            "failed to read models filter {}: {e}",
            cli.models_filter.display()
        ))
    })?;

    Ok(GatewayContext {
        gateway: Arc::new(Gateway::new(Arc::new(backend))),
        proxy_config: ProxyConfig::default().with_model_filter(model_filter),
        listen_addr: cli.listen_addr(),
    })
}

/// Bind the listener and serve until Ctrl-C.
pub async fn run(ctx: GatewayContext) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&ctx.listen_addr)
        .await
        .map_err(CliError::from)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
        }
        on_signal.cancel();
    });

    ollagate_proxy::serve(listener, ctx.gateway, ctx.proxy_config, cancel).await
}
