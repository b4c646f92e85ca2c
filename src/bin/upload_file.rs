//! Single-file upload demo server.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use route_demos::api::create_upload_router;
use route_demos::config::Config;
use route_demos::server;
use route_demos::upload::{FileStore, UploadState};
use route_demos::utils::init_logging;

/// Accepts one multipart `file` field on POST /upload and stores it.
#[derive(Parser, Debug)]
#[command(name = "upload-file")]
#[command(about = "Upload demo: POST /upload with a multipart `file` field")]
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

    /// Directory uploads are written to (overrides UPLOAD_DIR).
    #[arg(long)]
    upload_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    init_logging(args.verbose, args.json, &config.rust_log);

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = args.upload_dir {
        config.upload_dir = dir;
    }
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    let store = FileStore::new(&config.upload_dir);
    store.ensure_dir().await?;
    info!(
        "Storing uploads in {} (limit {} bytes)",
        store.dir().display(),
        config.max_upload_bytes
    );

    let state = UploadState::new(store, config.max_upload_bytes);
    let router = create_upload_router(state)?;

    server::run(&config, router).await?;
    Ok(())
}
