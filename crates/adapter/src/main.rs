use clap::Parser;
use restbridge_mcp::config::Cli;
use restbridge_mcp::logging::init_logging;
use restbridge_mcp::{RestBridge, serve_stdio};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format)?;

    let discovery_enabled = !cli.no_discovery;
    let bridge = match cli
        .into_server_config()
        .and_then(|config| RestBridge::start(config, discovery_enabled))
    {
        Ok(bridge) => bridge,
        Err(e) => {
            error!(error = %e, "failed to start");
            return Err(e.into());
        }
    };

    serve_stdio(bridge).await?;
    Ok(())
}
