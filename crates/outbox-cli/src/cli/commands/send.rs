//! `outbox send` – perform one request through the deferring client.

use anyhow::Result;
use outbox_core::classify;
use outbox_core::client::Client;
use outbox_core::config::OutboxConfig;
use outbox_core::method::Method;
use outbox_core::queue::MutationQueue;
use outbox_core::transport::HttpTransport;

pub async fn run_send(
    queue: &MutationQueue,
    cfg: &OutboxConfig,
    method: Method,
    endpoint: &str,
    body: Option<&str>,
) -> Result<()> {
    let client = Client::new(HttpTransport::new(&cfg.server)?, queue.clone());
    let pending = client.queue();
    let before = pending.count();
    match client.request(method, endpoint, body).await {
        Ok(resp) => {
            println!("HTTP {}", resp.status);
            let text = resp.text();
            if !text.is_empty() {
                println!("{}", text);
            }
            Ok(())
        }
        Err(err) => {
            if classify::is_connectivity_failure(&err) && pending.count() > before {
                println!("Server unreachable; request deferred ({} pending).", pending.count());
            }
            Err(err.into())
        }
    }
}
