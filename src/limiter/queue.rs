// Per-provider request queue with sliding-window admission and retries
// Author: kelexine (https://github.com/kelexine)

use super::events::{LimiterEvent, LimiterObserver, TracingObserver};
use super::models::{LimiterConfig, LimiterStats};
use super::window::RateWindow;
use crate::error::{GovernorError, Result};
use crate::utils::retry::{create_backoff, MAX_RETRY_DELAY};
use backoff::{backoff::Backoff, ExponentialBackoff};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// How long the worker sleeps when every concurrency slot is taken.
pub const CONCURRENCY_POLL_INTERVAL: Duration = Duration::from_millis(100);

type Work<T> = Box<dyn FnMut() -> BoxFuture<'static, Result<T>> + Send>;

struct QueueItem<T> {
    id: Uuid,
    work: Work<T>,
    enqueued_at: Instant,
    attempt: u32,
    backoff: ExponentialBackoff,
    responder: oneshot::Sender<Result<T>>,
}

impl<T> QueueItem<T> {
    fn settle(self, result: Result<T>) {
        // The caller may have stopped waiting; nothing left to do then.
        let _ = self.responder.send(result);
    }
}

struct Shared<T> {
    name: String,
    config: LimiterConfig,
    queue: Mutex<VecDeque<QueueItem<T>>>,
    window: Mutex<RateWindow>,
    in_flight: AtomicUsize,
    closed: AtomicBool,
    wake: Notify,
    observer: Arc<dyn LimiterObserver>,
}

impl<T> Shared<T> {
    fn emit(&self, event: LimiterEvent) {
        self.observer.on_event(&self.name, &event);
    }

    fn publish_gauges(&self, queue_length: usize) {
        crate::metrics::update_limiter_gauges(
            &self.name,
            queue_length,
            self.in_flight.load(Ordering::SeqCst),
        );
    }

    fn enqueue(&self, item: QueueItem<T>, front: bool) {
        if self.closed.load(Ordering::SeqCst) {
            item.settle(Err(GovernorError::QueueCleared));
            return;
        }

        let id = item.id;
        let queue_length = {
            let mut queue = self.queue.lock();
            if front {
                queue.push_front(item);
            } else {
                queue.push_back(item);
            }
            queue.len()
        };

        if !front {
            self.emit(LimiterEvent::Queued { id, queue_length });
        }
        self.publish_gauges(queue_length);
        self.wake.notify_one();
    }

    fn drain(&self) -> usize {
        let drained: Vec<QueueItem<T>> = self.queue.lock().drain(..).collect();
        let rejected = drained.len();
        for item in drained {
            item.settle(Err(GovernorError::QueueCleared));
        }
        self.emit(LimiterEvent::QueueCleared { rejected });
        self.publish_gauges(0);
        rejected
    }
}

/// Decrements the in-flight counter even if the work future panics.
struct InFlightGuard<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        let queue_length = self.shared.queue.lock().len();
        self.shared.publish_gauges(queue_length);
    }
}

/// Admission control for one upstream provider.
///
/// Work submitted through [`RateLimiter::execute`] is queued and dispatched by
/// a single worker task, subject to per-minute and per-hour sliding windows and
/// a concurrency ceiling. Transient failures are retried with doubling delays
/// and put back at the head of the queue. Every submitted item settles exactly
/// once: with its result, with its final error, or with
/// [`GovernorError::QueueCleared`].
pub struct RateLimiter<T = Value> {
    shared: Arc<Shared<T>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> RateLimiter<T> {
    /// Create a limiter and spawn its worker. Must be called inside a Tokio runtime.
    pub fn new(name: impl Into<String>, config: LimiterConfig) -> Self {
        Self::with_observer(name, config, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        name: impl Into<String>,
        mut config: LimiterConfig,
        observer: Arc<dyn LimiterObserver>,
    ) -> Self {
        // Zero limits would never admit anything.
        config.requests_per_minute = config.requests_per_minute.max(1);
        config.requests_per_hour = config.requests_per_hour.max(1);
        config.max_concurrent = config.max_concurrent.max(1);

        let shared = Arc::new(Shared {
            name: name.into(),
            config,
            queue: Mutex::new(VecDeque::new()),
            window: Mutex::new(RateWindow::new()),
            in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            wake: Notify::new(),
            observer,
        });

        let worker = tokio::spawn(run_worker(Arc::clone(&shared)));
        debug!(limiter = %shared.name, "Rate limiter started");

        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.shared.config
    }

    /// Queue `work` and return a future that settles when the item does.
    ///
    /// The item is queued before this returns; the returned future only waits.
    /// `work` may be invoked more than once if it fails with a retryable error.
    pub fn execute<F, Fut>(&self, mut work: F) -> impl Future<Output = Result<T>> + Send + 'static
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (responder, settled) = oneshot::channel();
        let item = QueueItem {
            id: Uuid::new_v4(),
            work: Box::new(move || work().boxed()),
            enqueued_at: Instant::now(),
            attempt: 0,
            backoff: create_backoff(self.shared.config.base_retry_delay()),
            responder,
        };
        self.shared.enqueue(item, false);

        async move {
            settled.await.unwrap_or_else(|_| {
                Err(GovernorError::unclassified(
                    "rate limiter stopped before the request settled",
                ))
            })
        }
    }

    /// Reject every item that has not been dispatched yet. In-flight calls are untouched.
    pub fn clear_queue(&self) -> usize {
        self.shared.drain()
    }

    pub fn stats(&self) -> LimiterStats {
        let now = Instant::now();
        let (requests_last_minute, requests_last_hour) = self.shared.window.lock().counts(now);
        LimiterStats {
            queue_length: self.shared.queue.lock().len(),
            concurrent_requests: self.shared.in_flight.load(Ordering::SeqCst),
            requests_last_minute,
            requests_last_hour,
            limits: self.shared.config.limits(),
        }
    }

    /// Stop the worker and reject everything still queued.
    ///
    /// Items waiting out a retry delay are rejected when they would re-enter
    /// the queue. Calls already dispatched run to completion.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }
        let rejected = self.shared.drain();
        debug!(limiter = %self.shared.name, rejected, "Rate limiter stopped");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

impl<T> Drop for RateLimiter<T> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }
        let drained: Vec<QueueItem<T>> = self.shared.queue.lock().drain(..).collect();
        for item in drained {
            item.settle(Err(GovernorError::QueueCleared));
        }
    }
}

async fn run_worker<T: Send + 'static>(shared: Arc<Shared<T>>) {
    let per_minute = shared.config.requests_per_minute;
    let per_hour = shared.config.requests_per_hour;
    let max_concurrent = shared.config.max_concurrent;

    loop {
        let is_empty = shared.queue.lock().is_empty();
        if is_empty {
            shared.wake.notified().await;
            continue;
        }

        let now = Instant::now();
        let blocked = {
            let mut window = shared.window.lock();
            window.prune(now);
            window.wait_time(now, per_minute, per_hour)
        };
        if let Some((window, wait)) = blocked {
            shared.emit(LimiterEvent::RateLimited { window, wait });
            tokio::time::sleep(wait).await;
            continue;
        }

        if shared.in_flight.load(Ordering::SeqCst) >= max_concurrent {
            tokio::time::sleep(CONCURRENCY_POLL_INTERVAL).await;
            continue;
        }

        let next = shared.queue.lock().pop_front();
        let Some(item) = next else {
            continue;
        };

        shared.window.lock().record(now);
        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        let queue_length = shared.queue.lock().len();
        shared.publish_gauges(queue_length);
        shared.emit(LimiterEvent::Processing {
            id: item.id,
            attempt: item.attempt,
            waited: now.saturating_duration_since(item.enqueued_at),
        });

        tokio::spawn(dispatch(Arc::clone(&shared), item));
    }
}

async fn dispatch<T: Send + 'static>(shared: Arc<Shared<T>>, mut item: QueueItem<T>) {
    let guard = InFlightGuard {
        shared: Arc::clone(&shared),
    };
    let result = (item.work)().await;
    drop(guard);

    match result {
        Ok(value) => {
            shared.emit(LimiterEvent::Completed { id: item.id });
            item.settle(Ok(value));
        }
        Err(err) if err.is_retryable() && item.attempt < shared.config.max_retries => {
            item.attempt += 1;
            let delay = item.backoff.next_backoff().unwrap_or(MAX_RETRY_DELAY);
            shared.emit(LimiterEvent::Retry {
                id: item.id,
                attempt: item.attempt,
                delay,
            });
            tokio::time::sleep(delay).await;
            shared.enqueue(item, true);
        }
        Err(err) => {
            shared.emit(LimiterEvent::Failed {
                id: item.id,
                error: err.kind(),
            });
            item.settle(Err(err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<&'static str>>,
    }

    impl LimiterObserver for Recorder {
        fn on_event(&self, _limiter: &str, event: &LimiterEvent) {
            self.events.lock().push(event.name());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_resolves_value() {
        let limiter: RateLimiter<u32> = RateLimiter::new("unit", LimiterConfig::default());
        let result = limiter.execute(|| async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_sequence_for_retry() {
        let recorder = Arc::new(Recorder::default());
        let limiter: RateLimiter<u32> = RateLimiter::with_observer(
            "unit",
            LimiterConfig::default().with_retries(3, Duration::from_millis(10)),
            recorder.clone(),
        );

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = limiter
            .execute(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(GovernorError::from_status(503, "busy"))
                    } else {
                        Ok(1)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(
            *recorder.events.lock(),
            vec!["queued", "processing", "retry", "processing", "completed"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_track_windows() {
        let limiter: RateLimiter<()> = RateLimiter::new("unit", LimiterConfig::new(10, 100, 2));
        for _ in 0..3 {
            limiter.execute(|| async { Ok(()) }).await.unwrap();
        }

        let stats = limiter.stats();
        assert_eq!(stats.queue_length, 0);
        assert_eq!(stats.requests_last_minute, 3);
        assert_eq!(stats.requests_last_hour, 3);
        assert_eq!(stats.limits.requests_per_minute, 10);

        tokio::time::advance(Duration::from_secs(61)).await;
        let stats = limiter.stats();
        assert_eq!(stats.requests_last_minute, 0);
        assert_eq!(stats.requests_last_hour, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_rejects_new_work() {
        let limiter: RateLimiter<()> = RateLimiter::new("unit", LimiterConfig::default());
        limiter.shutdown();
        assert!(limiter.is_shut_down());

        let err = limiter.execute(|| async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, GovernorError::QueueCleared));
    }
}
