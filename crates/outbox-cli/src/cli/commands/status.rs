//! `outbox status` – show pending mutations.

use outbox_core::queue::MutationQueue;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn run_status(queue: &MutationQueue) {
    let entries = queue.entries();
    println!("queue file: {}", queue.path().display());
    println!(
        "pending: {}  next flush interval: {}s",
        entries.len(),
        queue.current_interval().as_secs()
    );
    if entries.is_empty() {
        return;
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();
    println!(
        "{:<38} {:<7} {:<8} {:<8} {}",
        "ID", "METHOD", "RETRIES", "AGE", "ENDPOINT"
    );
    for e in entries {
        println!(
            "{:<38} {:<7} {:<8} {:<8} {}",
            e.id,
            e.method.as_str(),
            e.retries,
            format_age(now_ms.saturating_sub(e.created_at)),
            e.endpoint
        );
    }
}

fn format_age(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}
