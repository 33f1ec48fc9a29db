use anyhow::Result;
use clap::Parser;
use keepsake_core::{KeepsakeConfig, ServerSettings};
use keepsake_logger::{
    Logger, ObservabilityConfig, StructuredLog, init_observability, install_panic_hook,
};
use keepsake_server::{AppState, ReqwestFetcher, serve, shutdown_signal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Keepsake media download proxy", long_about = None)]
struct Args {
    /// Configuration file (default: ./keepsake.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind, overriding the configuration
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    /// Export spans to stdout
    #[arg(long)]
    export_spans: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = KeepsakeConfig::load_with(args.config.as_deref())?;
    if args.host.is_some() || args.port.is_some() {
        let server = ServerSettings::new(
            args.host.unwrap_or_else(|| config.server().host().clone()),
            args.port.unwrap_or(*config.server().port()),
        );
        config = config.with_server(server);
    }

    let _observability = init_observability(
        ObservabilityConfig::new(config.app_name().as_str())
            .with_json_logs(args.json_logs)
            .with_span_export(args.export_spans),
    )
    .map_err(|e| anyhow::anyhow!(e))?;

    let logger: Arc<dyn StructuredLog> =
        Arc::new(Logger::from_config(&config)?.with_tag("component", "server"));
    install_panic_hook(Arc::clone(&logger));

    info!(
        environment = %config.environment(),
        address = %config.server().address(),
        "Starting Keepsake download proxy"
    );

    let state = AppState::new(logger, Arc::new(ReqwestFetcher::new()?));
    serve(&config.server().address(), state, shutdown_signal()).await?;

    Ok(())
}
