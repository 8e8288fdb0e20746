//! # Custom Subscriber Example
//!
//! Shows how to plug event subscribers into a governor: the built-in [`LogWriter`]
//! plus a custom subscriber counting admission outcomes.
//!
//! The example counts:
//! - Requests
//! - Completions (ok or task error)
//! - Declines
//! - Lost attempts
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example subscriber --features logging
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use slotvisor::{
    Event, EventKind, Governor, GovernorConfig, LockProvider, LogWriter, MemoryLockProvider,
    RetryPolicy, Subscribe,
};

#[derive(Default)]
struct AdmissionStats {
    requested: AtomicU64,
    completed: AtomicU64,
    declined: AtomicU64,
    lost: AtomicU64,
}

impl AdmissionStats {
    fn print(&self) {
        println!();
        println!("Admissions:");
        println!(" ├─► Requested: {}", self.requested.load(Ordering::Relaxed));
        println!(" ├─► Completed: {}", self.completed.load(Ordering::Relaxed));
        println!(" ├─► Declined:  {}", self.declined.load(Ordering::Relaxed));
        println!(" └─► Lost:      {}", self.lost.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for AdmissionStats {
    async fn on_event(&self, ev: &Event) {
        let counter = match ev.kind {
            EventKind::AdmissionRequested => &self.requested,
            EventKind::AdmissionCompleted => &self.completed,
            EventKind::AdmissionDeclined => &self.declined,
            EventKind::AttemptLost => &self.lost,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn name(&self) -> &'static str {
        "admission-stats"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let stats = Arc::new(AdmissionStats::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![
        Arc::new(LogWriter),
        Arc::clone(&stats) as Arc<dyn Subscribe>,
    ];

    // Short retry budget so that some submissions get declined.
    let provider: Arc<dyn LockProvider> = Arc::new(
        MemoryLockProvider::new().with_retry(RetryPolicy::fixed(3, Duration::from_millis(20))),
    );
    let cfg = GovernorConfig::named("thumbnail")
        .with_namespace("demo")
        .with_max_concurrency(2);
    let governor = Arc::new(Governor::builder(cfg).with_subscribers(subs).build(provider)?);

    let mut joins = Vec::new();
    for _ in 0..6 {
        let governor = Arc::clone(&governor);
        joins.push(tokio::spawn(async move {
            governor
                .run(|_slot| async {
                    tokio::time::sleep(Duration::from_millis(150)).await;
                    Ok(())
                })
                .await
        }));
    }
    for j in joins {
        j.await??;
    }

    // Let subscriber workers drain their queues.
    tokio::time::sleep(Duration::from_millis(100)).await;
    stats.print();
    Ok(())
}
