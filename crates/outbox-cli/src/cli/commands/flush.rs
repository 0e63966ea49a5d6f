//! `outbox flush` – drain the queue once through the HTTP transport.

use anyhow::Result;
use outbox_core::config::OutboxConfig;
use outbox_core::queue::MutationQueue;
use outbox_core::transport::HttpTransport;
use std::sync::Arc;

pub async fn run_flush(queue: &MutationQueue, cfg: &OutboxConfig) -> Result<()> {
    if queue.count() == 0 {
        println!("Queue is empty.");
        return Ok(());
    }
    let transport = HttpTransport::new(&cfg.server)?;
    queue.set_flush_handler(Arc::new(transport));
    match queue.flush().await {
        Some(s) => println!(
            "delivered: {}  abandoned: {}  remaining: {}",
            s.delivered, s.failed, s.remaining
        ),
        None => println!("A drain is already in progress."),
    }
    Ok(())
}
