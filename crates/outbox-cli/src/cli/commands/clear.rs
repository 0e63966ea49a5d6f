//! `outbox clear` – discard all pending mutations.

use anyhow::Result;
use outbox_core::queue::MutationQueue;

pub fn run_clear(queue: &MutationQueue, yes: bool) -> Result<()> {
    let pending = queue.count();
    if pending == 0 {
        println!("Queue is empty.");
        return Ok(());
    }
    if !yes {
        anyhow::bail!(
            "{} pending mutation(s) would be discarded; re-run with --yes to confirm",
            pending
        );
    }
    queue.clear();
    println!("Discarded {} pending mutation(s).", pending);
    Ok(())
}
