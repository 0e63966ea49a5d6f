//! `outbox run` – redeliver pending mutations on schedule until Ctrl-C.

use anyhow::{Context, Result};
use outbox_core::config::OutboxConfig;
use outbox_core::queue::MutationQueue;
use outbox_core::transport::HttpTransport;
use std::sync::Arc;

pub async fn run_daemon(queue: &MutationQueue, cfg: &OutboxConfig) -> Result<()> {
    let transport = HttpTransport::new(&cfg.server)?;
    queue.set_flush_handler(Arc::new(transport));
    tracing::info!(
        pending = queue.count(),
        server = %cfg.server.base_url,
        "redelivery loop running"
    );
    println!(
        "{} pending; first flush in {}s. Ctrl-C to stop.",
        queue.count(),
        queue.current_interval().as_secs()
    );

    // Shutdown does not flush; pending entries stay on disk.
    tokio::signal::ctrl_c()
        .await
        .context("wait for Ctrl-C")?;
    tracing::info!(pending = queue.count(), "stopping");
    println!("Stopped with {} pending.", queue.count());
    Ok(())
}
