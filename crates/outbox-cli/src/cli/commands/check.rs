//! `outbox check` – show how the policy classifies a request.

use outbox_core::method::Method;
use outbox_core::policy::QueuePolicy;

pub fn run_check(policy: &QueuePolicy, method: Method, endpoint: &str) {
    let category = policy.category(method, endpoint);
    println!("{} {}", method, endpoint);
    println!("category: {}", category.label());
    println!(
        "deferred on connectivity failure: {}",
        if category.is_eligible() { "yes" } else { "no" }
    );
}
