//! Integration tests for the event fanout manager.

use async_trait::async_trait;
use herald_core::{EventFanoutManager, EventListener, FanoutConfig, FanoutError, FnListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct Counting {
    seen: AtomicUsize,
}

#[async_trait]
impl EventListener<String> for Counting {
    async fn on_event(&self, _event: Arc<String>) -> anyhow::Result<()> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl EventListener<String> for Failing {
    async fn on_event(&self, event: Arc<String>) -> anyhow::Result<()> {
        anyhow::bail!("cannot handle {event}")
    }
}

struct Panicking;

#[async_trait]
impl EventListener<String> for Panicking {
    async fn on_event(&self, _event: Arc<String>) -> anyhow::Result<()> {
        panic!("listener blew up");
    }
}

fn manager() -> EventFanoutManager<String> {
    EventFanoutManager::new(FanoutConfig::default()).expect("inside a runtime")
}

#[tokio::test]
async fn failing_listeners_do_not_affect_others() {
    let fanout = manager();
    let counting = Arc::new(Counting::default());
    fanout.register(Arc::new(Failing)).unwrap();
    fanout.register(Arc::new(Panicking)).unwrap();
    fanout.register(counting.clone()).unwrap();

    assert_eq!(fanout.handle("hello".to_string()), 3);
    fanout.shutdown().await;

    assert_eq!(counting.seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn duplicate_registration_delivers_twice() {
    let fanout = manager();
    let counting = Arc::new(Counting::default());
    let listener: Arc<dyn EventListener<String>> = counting.clone();
    fanout.register(Arc::clone(&listener)).unwrap();
    fanout.register(Arc::clone(&listener)).unwrap();

    fanout.handle("twice".to_string());
    fanout.shutdown().await;

    assert_eq!(counting.seen.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unregister_removes_first_match_only() {
    let fanout = manager();
    let listener: Arc<dyn EventListener<String>> = Arc::new(Counting::default());
    let other: Arc<dyn EventListener<String>> = Arc::new(Counting::default());
    fanout.register(Arc::clone(&listener)).unwrap();
    fanout.register(Arc::clone(&other)).unwrap();
    fanout.register(Arc::clone(&listener)).unwrap();

    assert!(fanout.unregister(&listener));
    let remaining = fanout.listeners();
    assert_eq!(remaining.len(), 2);
    assert!(Arc::ptr_eq(&remaining[0], &other));
    assert!(Arc::ptr_eq(&remaining[1], &listener));

    assert!(fanout.unregister(&listener));
    assert!(!fanout.unregister(&listener));
    assert_eq!(fanout.listeners().len(), 1);
}

#[tokio::test]
async fn snapshot_is_unaffected_by_later_changes() {
    let fanout = manager();
    fanout.register(Arc::new(Counting::default())).unwrap();

    let snapshot = fanout.listeners();
    fanout.register(Arc::new(Failing)).unwrap();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(fanout.listeners().len(), 2);
}

#[tokio::test]
async fn shutdown_rejects_registration_and_events() {
    let fanout = manager();
    let counting = Arc::new(Counting::default());
    fanout.register(counting.clone()).unwrap();
    fanout.shutdown().await;

    assert!(fanout.is_shut_down());
    assert!(matches!(
        fanout.register(Arc::new(Failing)),
        Err(FanoutError::ShutDown)
    ));
    assert_eq!(fanout.handle("late".to_string()), 0);
    assert_eq!(counting.seen.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_work() {
    let fanout = manager();
    let release = Arc::new(Notify::new());
    let done = Arc::new(AtomicUsize::new(0));
    let (gate, finished) = (Arc::clone(&release), Arc::clone(&done));
    fanout
        .register(Arc::new(FnListener::new("slow", move |_event: Arc<String>| {
            let gate = Arc::clone(&gate);
            let finished = Arc::clone(&finished);
            async move {
                gate.notified().await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            }
        })))
        .unwrap();

    fanout.handle("wait".to_string());
    assert_eq!(fanout.in_flight(), 1);

    let releaser = tokio::spawn({
        let release = Arc::clone(&release);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            release.notify_one();
        }
    });
    fanout.shutdown().await;
    releaser.await.unwrap();

    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(fanout.in_flight(), 0);
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let fanout = EventFanoutManager::<u32>::new(FanoutConfig {
        max_concurrency: 2,
        listener_timeout: None,
    })
    .unwrap();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    for _ in 0..8 {
        let (running, peak) = (Arc::clone(&running), Arc::clone(&peak));
        fanout
            .register(Arc::new(FnListener::new("busy", move |_event: Arc<u32>| {
                let (running, peak) = (Arc::clone(&running), Arc::clone(&peak));
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), anyhow::Error>(())
                }
            })))
            .unwrap();
    }

    assert_eq!(fanout.handle(7), 8);
    fanout.shutdown().await;

    let peak = peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak concurrency was {peak}");
}

#[tokio::test]
async fn stuck_listener_is_abandoned_after_timeout() {
    let fanout = EventFanoutManager::<String>::new(FanoutConfig {
        max_concurrency: 4,
        listener_timeout: Some(Duration::from_millis(20)),
    })
    .unwrap();
    let counting = Arc::new(Counting::default());
    fanout
        .register(Arc::new(FnListener::new("stuck", |_event: Arc<String>| async {
            std::future::pending::<()>().await;
            Ok::<(), anyhow::Error>(())
        })))
        .unwrap();
    fanout.register(counting.clone()).unwrap();

    fanout.handle("tick".to_string());
    tokio::time::timeout(Duration::from_secs(5), fanout.shutdown())
        .await
        .expect("shutdown drains once the stuck listener times out");

    assert_eq!(counting.seen.load(Ordering::SeqCst), 1);
}
