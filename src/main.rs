use clap::Parser;
use methodica::config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "methodica", version, about = "Methodology-driven tutoring gateway")]
struct Args {
    /// TOML config file; defaults plus environment overrides when absent.
    #[arg(short, long, env = "METHODICA_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file and BIND_ADDR.
    #[arg(short, long)]
    bind: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    methodica::telemetry::init(args.json_logs);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    methodica::run(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown requested");
    })
    .await
}
