//! # Example: basic_governor
//!
//! Two "processes" (governors sharing one lock provider) push eight jobs through a
//! global limit of two concurrent executions.
//!
//! Demonstrates how to:
//! - Build a [`Governor`] over a shared [`MemoryLockProvider`].
//! - Hold a slot with [`SlotPermit`] and release it with the job result.
//! - Tell completed, failed and declined submissions apart.
//!
//! ## Flow
//! ```text
//! worker-a ─┐                          ┌─► slot 0 ─► job ─► release
//!           ├─► submit ─► race slots ──┤
//! worker-b ─┘                          └─► slot 1 ─► job ─► release
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_governor
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use slotvisor::{
    Admission, Governor, GovernorConfig, LockProvider, MemoryLockProvider, RetryPolicy, TaskError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,slotvisor=debug".into()),
        )
        .init();

    // 1. One lock store shared by every worker process
    let provider: Arc<dyn LockProvider> = Arc::new(
        MemoryLockProvider::new().with_retry(RetryPolicy::fixed(100, Duration::from_millis(20))),
    );

    // 2. Same task class and limit in each process
    let cfg = GovernorConfig::named("report")
        .with_namespace("demo")
        .with_max_concurrency(2)
        .with_ttl(Duration::from_secs(10));
    let workers = [
        Arc::new(Governor::new(cfg.clone(), Arc::clone(&provider))?),
        Arc::new(Governor::new(cfg, Arc::clone(&provider))?),
    ];

    let running = Arc::new(AtomicUsize::new(0));
    let mut joins = Vec::new();

    // 3. Submit jobs from both workers at once
    for job in 0..8 {
        let gov = Arc::clone(&workers[job % 2]);
        let running = Arc::clone(&running);
        joins.push(tokio::spawn(async move {
            let out = gov
                .submit(move |permit| async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    println!("[job {job}] slot {} (running: {now})", permit.slot());
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    running.fetch_sub(1, Ordering::SeqCst);

                    let res = if job == 5 {
                        Err(TaskError::fail("upstream unavailable"))
                    } else {
                        Ok(())
                    };
                    permit.release(res);
                })
                .await;
            (job, out)
        }));
    }

    // 4. Report outcomes
    for j in joins {
        match j.await? {
            (job, Ok(Admission::Completed { slot })) => println!("[job {job}] done in slot {slot}"),
            (job, Ok(Admission::Declined { attempts })) => {
                println!("[job {job}] declined after {attempts} attempts")
            }
            (job, Err(e)) => println!("[job {job}] failed: {}", e.as_message()),
        }
    }
    Ok(())
}
