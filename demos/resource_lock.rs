//! # Example: resource_lock
//!
//! Serializes updates to one order across concurrent handlers with [`ResourceLocker`],
//! while a different order proceeds in parallel.
//!
//! ## Flow
//! ```text
//! handler ─► with_lock("order", id, f)
//!              ├─ acquire "demo:resource-lock:order:{id}"
//!              ├─ f(lock)
//!              └─ release (failure only logged)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example resource_lock
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use slotvisor::{MemoryLockProvider, ResourceLocker, RetryPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let provider = Arc::new(
        MemoryLockProvider::new().with_retry(RetryPolicy::fixed(50, Duration::from_millis(10))),
    );
    let locker = ResourceLocker::new(provider)
        .with_namespace("demo")
        .with_ttl(Duration::from_secs(2));

    let started = Instant::now();
    let mut joins = Vec::new();
    for (handler, order) in [(1, "42"), (2, "42"), (3, "42"), (4, "7")] {
        let locker = locker.clone();
        joins.push(tokio::spawn(async move {
            locker
                .with_lock("order", order, |lock| async move {
                    println!(
                        "[{:>4}ms] handler {handler} holds {}",
                        started.elapsed().as_millis(),
                        lock.resource()
                    );
                    tokio::time::sleep(Duration::from_millis(100)).await;
                })
                .await
        }));
    }

    for j in joins {
        if let Err(e) = j.await? {
            println!("gave up: {}", e.as_message());
        }
    }
    Ok(())
}
