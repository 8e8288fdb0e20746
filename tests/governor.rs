use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use slotvisor::{
    Admission, ConfigError, EventKind, Governor, GovernorConfig, LockProvider, MemoryLockProvider,
    RetryPolicy, TaskError,
};

fn provider(retries: u32, delay_ms: u64) -> Arc<MemoryLockProvider> {
    Arc::new(
        MemoryLockProvider::new()
            .with_retry(RetryPolicy::fixed(retries, Duration::from_millis(delay_ms))),
    )
}

fn governor(name: &str, k: usize, provider: Arc<MemoryLockProvider>) -> Arc<Governor> {
    let cfg = GovernorConfig::named(name)
        .with_namespace("test")
        .with_max_concurrency(k)
        .with_ttl(Duration::from_secs(10))
        .with_bus_capacity(4096);
    Arc::new(Governor::new(cfg, provider).unwrap())
}

/// Active/peak counters shared by task bodies.
#[derive(Default)]
struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_never_exceeds_limit() {
    const K: usize = 3;
    let gov = governor("bound", K, provider(1000, 5));
    let gauge = Arc::new(Gauge::default());

    let mut joins = Vec::new();
    for _ in 0..10 * K {
        let gov = gov.clone();
        let gauge = gauge.clone();
        joins.push(tokio::spawn(async move {
            gov.run(move |_slot| async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(20)).await;
                gauge.leave();
                Ok(())
            })
            .await
        }));
    }

    for j in joins {
        let out = j.await.unwrap();
        assert!(matches!(out, Ok(Admission::Completed { .. })), "{out:?}");
    }
    assert!(gauge.peak() <= K, "peak {} > {K}", gauge.peak());
    assert!(gauge.peak() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_limit_holds_across_governor_instances() {
    const K: usize = 2;
    let p = provider(1000, 5);
    let instances: Vec<_> = (0..3).map(|_| governor("shared", K, p.clone())).collect();
    assert!(instances.iter().all(|g| g.key_prefix() == "test:governor:shared"));
    let gauge = Arc::new(Gauge::default());

    let mut joins = Vec::new();
    for i in 0..10 * K {
        let gov = instances[i % instances.len()].clone();
        let gauge = gauge.clone();
        joins.push(tokio::spawn(async move {
            gov.run(move |_slot| async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(20)).await;
                gauge.leave();
                Ok(())
            })
            .await
        }));
    }

    for j in joins {
        let out = j.await.unwrap();
        assert!(matches!(out, Ok(Admission::Completed { .. })), "{out:?}");
    }
    assert!(gauge.peak() <= K, "peak {} > {K}", gauge.peak());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_release_from_plain_thread_frees_slot() {
    let p = provider(0, 1);
    let gov = governor("thread", 1, p.clone());

    let out = gov
        .submit(|permit| async move {
            std::thread::spawn(move || permit.release(Ok(())))
                .join()
                .unwrap();
        })
        .await;

    assert_eq!(out, Ok(Admission::Completed { slot: 0 }));
    assert_eq!(p.held().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_six_tasks_two_slots() {
    let gov = governor("six", 2, provider(1000, 5));
    let gauge = Arc::new(Gauge::default());

    let mut joins = Vec::new();
    for _ in 0..6 {
        let gov = gov.clone();
        let gauge = gauge.clone();
        joins.push(tokio::spawn(async move {
            gov.submit(move |permit| async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(250)).await;
                gauge.leave();
                permit.release(Ok(()));
            })
            .await
        }));
    }

    let mut slots = HashSet::new();
    for j in joins {
        let out = j.await.unwrap().unwrap();
        slots.insert(out.slot().unwrap());
    }
    assert_eq!(gauge.peak(), 2);
    assert!(slots.iter().all(|s| *s < 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_only_failing_task_reports_error() {
    let gov = governor("errors", 2, provider(1000, 5));

    let mut joins = Vec::new();
    for i in 0..4 {
        let gov = gov.clone();
        joins.push(tokio::spawn(async move {
            gov.run(move |_slot| async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                if i == 3 {
                    Err(TaskError::fail("task 3 failed"))
                } else {
                    Ok(())
                }
            })
            .await
        }));
    }

    for (i, j) in joins.into_iter().enumerate() {
        let out = j.await.unwrap();
        if i == 3 {
            assert_eq!(out, Err(TaskError::fail("task 3 failed")));
        } else {
            assert!(matches!(out, Ok(Admission::Completed { .. })), "task {i}: {out:?}");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_submit_completes_exactly_once() {
    const SUBMITS: usize = 12;
    let gov = governor("once", 3, provider(1000, 5));
    let mut events = gov.subscribe();

    let mut joins = Vec::new();
    for _ in 0..SUBMITS {
        let gov = gov.clone();
        joins.push(tokio::spawn(async move {
            gov.run(|_| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            })
            .await
        }));
    }
    for j in joins {
        j.await.unwrap().unwrap();
    }

    let mut replies: HashMap<u64, usize> = HashMap::new();
    let mut requested = 0;
    while let Ok(ev) = events.try_recv() {
        match ev.kind {
            EventKind::AdmissionRequested => requested += 1,
            EventKind::AdmissionCompleted | EventKind::AdmissionDeclined => {
                *replies.entry(ev.request.unwrap()).or_default() += 1;
            }
            _ => {}
        }
    }
    assert_eq!(requested, SUBMITS);
    assert_eq!(replies.len(), SUBMITS);
    assert!(replies.values().all(|n| *n == 1));
}

#[tokio::test]
async fn test_rotation_spreads_winning_slots() {
    let gov = governor("rotation", 3, provider(100, 2));

    let mut winners = Vec::new();
    for _ in 0..9 {
        let out = gov.run(|_| async { Ok(()) }).await.unwrap();
        winners.push(out.slot().unwrap());
    }

    let distinct: HashSet<_> = winners.iter().collect();
    assert!(distinct.len() > 1, "all wins on one slot: {winners:?}");
    assert!(winners.iter().any(|s| *s != 0));
}

#[tokio::test]
async fn test_double_release_is_harmless() {
    let p = provider(100, 2);
    let gov = governor("double", 1, p.clone());
    let mut events = gov.subscribe();

    let probe = p.clone();
    let out = gov
        .submit(move |permit| async move {
            probe.release(permit.lock()).await.unwrap();
            permit.release(Ok(()));
        })
        .await;
    assert_eq!(out, Ok(Admission::Completed { slot: 0 }));

    let mut kinds = Vec::new();
    while let Ok(ev) = events.try_recv() {
        kinds.push(ev.kind);
    }
    assert!(kinds.contains(&EventKind::ReleaseFailed));
    assert_eq!(
        kinds
            .iter()
            .filter(|k| **k == EventKind::AdmissionCompleted)
            .count(),
        1
    );

    // State is intact: the slot is free and reusable.
    assert_eq!(p.held().await, 0);
    let again = gov.run(|_| async { Ok(()) }).await;
    assert_eq!(again, Ok(Admission::Completed { slot: 0 }));
}

#[tokio::test]
async fn test_declined_when_every_slot_is_held_elsewhere() {
    let p = Arc::new(MemoryLockProvider::new().with_retry(RetryPolicy::once()));
    let gov = governor("busy", 2, p.clone());
    let _a = p.acquire(&gov.slot_key(0), Duration::from_secs(5)).await.unwrap();
    let _b = p.acquire(&gov.slot_key(1), Duration::from_secs(5)).await.unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let r = ran.clone();
    let out = gov
        .run(move |_| async move {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

    assert_eq!(out, Ok(Admission::Declined { attempts: 2 }));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_free_slot_is_found_when_others_are_held() {
    let p = Arc::new(MemoryLockProvider::new().with_retry(RetryPolicy::once()));
    let gov = governor("partial", 3, p.clone());
    let _a = p.acquire(&gov.slot_key(0), Duration::from_secs(5)).await.unwrap();
    let _c = p.acquire(&gov.slot_key(2), Duration::from_secs(5)).await.unwrap();

    for _ in 0..3 {
        let out = gov.run(|slot| async move {
            assert_eq!(slot, 1);
            Ok(())
        });
        assert_eq!(out.await, Ok(Admission::Completed { slot: 1 }));
    }
}

#[tokio::test]
async fn test_dropped_permit_releases_slot() {
    let p = provider(0, 1);
    let gov = governor("abandon", 1, p.clone());

    let out = gov.submit(|permit| async move { drop(permit) }).await;
    assert_eq!(out, Err(TaskError::Abandoned { slot: 0 }));
    assert!(!p.is_locked(&gov.slot_key(0)).await);
}

#[tokio::test]
async fn test_permit_extend_keeps_slot() {
    let p = provider(0, 1);
    let gov = governor("extend", 1, p.clone());

    let probe = p.clone();
    let out = gov
        .submit(move |mut permit| async move {
            let before = permit.lock().token();
            let res = permit
                .extend(Duration::from_secs(30))
                .await
                .map_err(TaskError::fail);
            assert_eq!(permit.lock().token(), before);
            assert!(probe.is_locked(permit.lock().resource()).await);
            permit.release(res);
        })
        .await;
    assert_eq!(out, Ok(Admission::Completed { slot: 0 }));
}

#[tokio::test]
async fn test_caller_timeout_does_not_strand_locks() {
    let p = provider(0, 1);
    let gov = governor("timeout", 2, p.clone());

    let res = tokio::time::timeout(
        Duration::from_millis(30),
        gov.run(|_| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        }),
    )
    .await;
    assert!(res.is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(p.held().await, 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let p = provider(0, 1);
    let cfg = GovernorConfig::named("bad").with_max_concurrency(0);
    assert_eq!(
        Governor::new(cfg, p.clone()).unwrap_err(),
        ConfigError::ZeroConcurrency
    );

    let cfg = GovernorConfig::named("bad").with_ttl(Duration::ZERO);
    assert_eq!(Governor::new(cfg, p.clone()).unwrap_err(), ConfigError::ZeroTtl);

    let cfg = GovernorConfig::named("  ");
    assert_eq!(Governor::new(cfg, p).unwrap_err(), ConfigError::EmptyName);
}
