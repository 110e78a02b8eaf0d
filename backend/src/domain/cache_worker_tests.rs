//! Tests for the cache invalidation worker.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mockall::predicate::eq;
use rstest::rstest;
use tokio::sync::mpsc::UnboundedSender;

use super::*;
use crate::domain::ports::{MockBookingCache, MockTrainRepository};
use crate::test_support::{at, train_date};

const WAIT: Duration = Duration::from_secs(2);

fn slot_lookup(times: usize) -> MockTrainRepository {
    let mut trains = MockTrainRepository::new();
    trains
        .expect_find_train_date_by_id()
        .times(times)
        .returning(|id| Ok(Some(train_date(id, at(12), at(6)))));
    trains
}

fn config(workers: usize, queue_capacity: usize) -> CacheWorkerConfig {
    CacheWorkerConfig {
        queue_capacity,
        workers,
        job_timeout: Duration::from_millis(200),
    }
}

#[rstest]
#[tokio::test]
async fn job_clears_monthly_stats_and_schedule() {
    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut cache = MockBookingCache::new();
    cache
        .expect_clean_stats_cache()
        .withf(|user, year, month| user.as_str() == "user-a" && *year == 2026 && *month == 5)
        .times(1)
        .return_once(|_, _, _| Ok(()));
    cache
        .expect_clean_train_cache()
        .times(1)
        .return_once(move |_| {
            let _ = done_tx.send(());
            Ok(())
        });

    let worker = spawn_cache_worker(Arc::new(slot_lookup(1)), Arc::new(cache), config(2, 8));
    assert!(worker.handle().clean("user-a", "td-1"));

    tokio::time::timeout(WAIT, done_rx.recv())
        .await
        .expect("job processed")
        .expect("signal sent");
    worker.shutdown().await;
}

#[rstest]
#[tokio::test]
async fn full_queue_drops_jobs_without_blocking() {
    let worker = spawn_cache_worker(
        Arc::new(MockTrainRepository::new()),
        Arc::new(MockBookingCache::new()),
        config(0, 1),
    );
    let handle = worker.handle();

    assert!(handle.clean("user-a", "td-1"));
    assert!(!handle.clean("user-a", "td-2"));
    worker.shutdown().await;
}

#[rstest]
#[tokio::test]
async fn stopped_worker_rejects_jobs() {
    let worker = spawn_cache_worker(
        Arc::new(MockTrainRepository::new()),
        Arc::new(MockBookingCache::new()),
        config(1, 4),
    );
    let handle = worker.handle();
    worker.shutdown().await;

    assert!(!handle.clean("user-a", "td-1"));
}

#[rstest]
#[tokio::test]
async fn missing_slot_skips_cache_calls() {
    let mut trains = MockTrainRepository::new();
    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    trains
        .expect_find_train_date_by_id()
        .with(eq("gone"))
        .times(1)
        .return_once(move |_| {
            let _ = done_tx.send(());
            Ok(None)
        });
    let mut cache = MockBookingCache::new();
    cache.expect_clean_stats_cache().never();
    cache.expect_clean_train_cache().never();

    let worker = spawn_cache_worker(Arc::new(trains), Arc::new(cache), config(1, 4));
    worker.handle().clean("user-a", "gone");
    tokio::time::timeout(WAIT, done_rx.recv())
        .await
        .expect("lookup ran")
        .expect("signal sent");
    worker.shutdown().await;
}

/// Panics on its first call and reports every later call.
struct FlakyCache {
    calls: AtomicUsize,
    seen: UnboundedSender<usize>,
    stall: Option<Duration>,
}

#[async_trait]
impl BookingCache for FlakyCache {
    async fn clean_stats_cache(
        &self,
        _user_id: &UserId,
        _year: i32,
        _month: u32,
    ) -> Result<(), BookingCacheError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            } else {
                panic!("cache exploded");
            }
        }
        let _ = self.seen.send(call);
        Ok(())
    }

    async fn clean_train_cache(&self, _user_id: &UserId) -> Result<(), BookingCacheError> {
        Ok(())
    }
}

#[rstest]
#[case::panic(None)]
#[case::timeout(Some(Duration::from_secs(30)))]
#[tokio::test]
async fn worker_survives_a_failed_job(#[case] stall: Option<Duration>) {
    let (seen, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();
    let cache = FlakyCache {
        calls: AtomicUsize::new(0),
        seen,
        stall,
    };

    let worker = spawn_cache_worker(Arc::new(slot_lookup(2)), Arc::new(cache), config(1, 4));
    let handle = worker.handle();
    assert!(handle.clean("user-a", "td-1"));
    assert!(handle.clean("user-a", "td-2"));

    let call = tokio::time::timeout(WAIT, seen_rx.recv())
        .await
        .expect("second job processed")
        .expect("signal sent");
    assert_eq!(call, 1);
    worker.shutdown().await;
}
