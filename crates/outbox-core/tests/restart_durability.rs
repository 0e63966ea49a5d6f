//! Integration test: pending mutations survive a process restart and are
//! delivered in their original order afterwards.

use std::sync::{Arc, Mutex};

use outbox_core::method::Method;
use outbox_core::queue::{MutationQueue, QueueSettings};
use outbox_core::store;
use tempfile::tempdir;

#[tokio::test]
async fn queue_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("queue.json");

    {
        let queue = MutationQueue::open(QueueSettings::default(), &path);
        queue.enqueue(Method::Post, "/memory", Some("a".to_string()));
        queue.enqueue(Method::Patch, "/workers/42", Some("running".to_string()));
        queue.enqueue(Method::Post, "/workers/42/plan", Some("plan".to_string()));
        queue.enqueue(Method::Patch, "/workers/42", Some("done".to_string()));
        // Dropped without flushing, as on shutdown.
    }

    let persisted = store::load_from_path(&path).unwrap().expect("file exists");
    assert_eq!(persisted.entries.len(), 3);

    let queue = MutationQueue::open(QueueSettings::default(), &path);
    assert_eq!(queue.entries(), persisted.entries);

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);
    queue.set_flush_handler(Arc::new(
        move |method: Method, endpoint: String, body: Option<String>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock()
                    .unwrap()
                    .push(format!("{method} {endpoint} {}", body.unwrap_or_default()));
                true
            }
        },
    ));
    let summary = queue.flush().await.unwrap();
    assert_eq!(summary.delivered, 3);
    assert_eq!(
        *delivered.lock().unwrap(),
        vec![
            "POST /memory a",
            "POST /workers/42/plan plan",
            "PATCH /workers/42 done",
        ]
    );
    assert!(store::load_from_path(&path).unwrap().unwrap().entries.is_empty());
}
