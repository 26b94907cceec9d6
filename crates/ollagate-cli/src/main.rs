//! ollagate binary - the composition root.

use clap::Parser;

use ollagate_cli::{Cli, CliError, bootstrap, logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    let ctx = match bootstrap(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = run(ctx).await {
        if let Some(cli_err) = e.downcast_ref::<CliError>() {
            tracing::error!("{cli_err}");
            std::process::exit(cli_err.exit_code());
        }
        return Err(e);
    }
    Ok(())
}
