//! Route registration demo server.

use clap::Parser;
use tracing::{error, info};

use route_demos::api::{create_hello_world_router, Variant};
use route_demos::config::Config;
use route_demos::server;
use route_demos::utils::init_logging;

/// Serves `/ping` next to parameter, wildcard and grouped placeholder routes.
#[derive(Parser, Debug)]
#[command(name = "hello-world")]
#[command(about = "Route registration demo: /ping plus placeholder routes")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json: bool,

    /// Port to listen on (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// Route set to serve.
    #[arg(long, value_enum, default_value_t = Variant::Basic)]
    variant: Variant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    init_logging(args.verbose, args.json, &config.rust_log);

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Starting hello-world server ({} routes)", args.variant);
    let router = create_hello_world_router(args.variant)?;

    server::run(&config, router).await?;
    Ok(())
}
