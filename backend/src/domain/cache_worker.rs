//! Background invalidation of per-user caches.
//!
//! Write use cases hand jobs to a [`CacheWorkerHandle`] without waiting. A
//! fixed pool of tasks drains the bounded queue; each job resolves the slot's
//! month and clears the user's statistics and schedule entries. Jobs run under
//! their own deadline, and a panicking job is logged without stopping its
//! worker.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use futures_util::FutureExt;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::UserId;
use super::ports::{BookingCache, BookingCacheError, CacheQueue, RepositoryError, TrainRepository};

/// Queue and pool sizing for the cache worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheWorkerConfig {
    pub queue_capacity: usize,
    pub workers: usize,
    pub job_timeout: Duration,
}

impl Default for CacheWorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1_000,
            workers: 5,
            job_timeout: Duration::from_millis(10_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CleanJob {
    user_id: String,
    train_date_id: String,
}

#[derive(Debug, thiserror::Error)]
enum CleanJobError {
    #[error("invalid user id: {0}")]
    User(#[from] super::UserValidationError),
    #[error(transparent)]
    Lookup(#[from] RepositoryError),
    #[error("train date {0} not found")]
    TrainDateMissing(String),
    #[error(transparent)]
    Cache(#[from] BookingCacheError),
}

/// Producer side of the queue; cheap to clone.
#[derive(Debug, Clone)]
pub struct CacheWorkerHandle {
    sender: mpsc::Sender<CleanJob>,
}

impl CacheQueue for CacheWorkerHandle {
    fn clean(&self, user_id: &str, train_date_id: &str) -> bool {
        let job = CleanJob {
            user_id: user_id.to_owned(),
            train_date_id: train_date_id.to_owned(),
        };
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(
                    user_id = %job.user_id,
                    train_date_id = %job.train_date_id,
                    "cache invalidation queue full; job dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(
                    user_id = %job.user_id,
                    train_date_id = %job.train_date_id,
                    "cache worker stopped; job dropped"
                );
                false
            }
        }
    }
}

struct JobProcessor<T, C: ?Sized> {
    trains: Arc<T>,
    cache: Arc<C>,
    job_timeout: Duration,
}

impl<T, C> JobProcessor<T, C>
where
    T: TrainRepository,
    C: BookingCache + ?Sized,
{
    async fn clean(&self, job: &CleanJob) -> Result<(), CleanJobError> {
        let user_id = UserId::new(job.user_id.as_str())?;
        let train_date = self
            .trains
            .find_train_date_by_id(&job.train_date_id)
            .await?
            .ok_or_else(|| CleanJobError::TrainDateMissing(job.train_date_id.clone()))?;
        let start = train_date.period().start();
        self.cache
            .clean_stats_cache(&user_id, start.year(), start.month())
            .await?;
        self.cache.clean_train_cache(&user_id).await?;
        Ok(())
    }

    async fn process(&self, job: CleanJob) {
        match tokio::time::timeout(self.job_timeout, self.clean(&job)).await {
            Ok(Ok(())) => debug!(
                user_id = %job.user_id,
                train_date_id = %job.train_date_id,
                "caches invalidated"
            ),
            Ok(Err(err)) => warn!(
                user_id = %job.user_id,
                train_date_id = %job.train_date_id,
                error = %err,
                "cache invalidation failed"
            ),
            Err(_) => warn!(
                user_id = %job.user_id,
                train_date_id = %job.train_date_id,
                timeout_ms = u64::try_from(self.job_timeout.as_millis()).unwrap_or(u64::MAX),
                "cache invalidation timed out"
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

async fn worker_loop<T, C>(
    worker: usize,
    jobs: Arc<Mutex<mpsc::Receiver<CleanJob>>>,
    mut shutdown: watch::Receiver<bool>,
    processor: Arc<JobProcessor<T, C>>,
) where
    T: TrainRepository,
    C: BookingCache + ?Sized,
{
    loop {
        let job = {
            let mut receiver = jobs.lock().await;
            tokio::select! {
                biased;
                _ = shutdown.changed() => None,
                job = receiver.recv() => job,
            }
        };
        let Some(job) = job else {
            break;
        };
        if let Err(payload) = AssertUnwindSafe(processor.process(job))
            .catch_unwind()
            .await
        {
            error!(
                worker,
                panic = %panic_message(payload.as_ref()),
                "cache worker recovered from panic"
            );
        }
    }
    debug!(worker, "cache worker stopped");
}

/// A started pool. The queue stays open until the pool is shut down or
/// dropped; dropping it stops the workers without waiting for them.
pub struct RunningCacheWorker {
    handle: CacheWorkerHandle,
    shutdown: watch::Sender<bool>,
    jobs: Arc<Mutex<mpsc::Receiver<CleanJob>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningCacheWorker {
    pub fn handle(&self) -> CacheWorkerHandle {
        self.handle.clone()
    }

    /// Signal every worker and wait for them to finish their current job.
    pub async fn shutdown(self) {
        let Self {
            shutdown,
            jobs,
            tasks,
            ..
        } = self;
        let _ = shutdown.send(true);
        drop(jobs);
        for task in tasks {
            if let Err(err) = task.await {
                error!(error = %err, "cache worker task failed");
            }
        }
        info!("cache worker shut down");
    }
}

/// Start the worker pool on the current runtime.
pub fn spawn_cache_worker<T, C>(
    trains: Arc<T>,
    cache: Arc<C>,
    config: CacheWorkerConfig,
) -> RunningCacheWorker
where
    T: TrainRepository + 'static,
    C: BookingCache + ?Sized + 'static,
{
    let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
    let (shutdown, shutdown_rx) = watch::channel(false);
    let jobs = Arc::new(Mutex::new(receiver));
    let processor = Arc::new(JobProcessor {
        trains,
        cache,
        job_timeout: config.job_timeout,
    });
    let tasks = (0..config.workers)
        .map(|worker| {
            tokio::spawn(worker_loop(
                worker,
                Arc::clone(&jobs),
                shutdown_rx.clone(),
                Arc::clone(&processor),
            ))
        })
        .collect();
    info!(
        workers = config.workers,
        queue_capacity = config.queue_capacity,
        "cache worker started"
    );
    RunningCacheWorker {
        handle: CacheWorkerHandle { sender },
        shutdown,
        jobs,
        tasks,
    }
}

#[cfg(test)]
#[path = "cache_worker_tests.rs"]
mod tests;
