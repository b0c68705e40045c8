//! Weather Sensor API - Main Entry Point

use api::{init_logging, run_server, ApiConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load()?;
    init_logging(&config.logging)?;

    info!("=== Weather Sensor API v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(config).await
}
