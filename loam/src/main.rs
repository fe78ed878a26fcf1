//! The loam server binary.

use loam::{LoamServer, config::LOAM_CONFIG, logging};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = &*LOAM_CONFIG;
    logging::init(&config.log_filter)?;

    let server = LoamServer::new(config)?;
    let cancel_token = server.cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for ctrl-c: {e}");
        }
        log::info!("Received shutdown signal");
        cancel_token.cancel();
    });

    server.run().await?;
    Ok(())
}
