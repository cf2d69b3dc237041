// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared blocking-work executor.
//!
//! An [`Executor`] is an explicitly constructed, explicitly drained
//! resource: it is created at startup, passed into every component that
//! schedules work, and shut down with the service. It is never a hidden
//! singleton, which keeps the storage layer testable against a short-lived
//! executor per test.
//!
//! Blocking jobs run on the runtime's blocking pool but at most
//! `max_blocking_workers` at a time; the bounding permit is held for the
//! whole blocking closure. Submissions beyond the bound queue for a permit
//! rather than fail. After [`Executor::shutdown`], new submissions are
//! rejected with [`EntagError::Scheduling`] while in-flight work drains.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, Semaphore};
use tokio_util::task::TaskTracker;

use entag_core::{EntagError, ExecutorConfig};

use crate::task::deliver;

/// Bounded dispatcher for blocking work and task continuations.
///
/// Cloning is cheap and every clone refers to the same pool and lifecycle.
#[derive(Clone, Debug)]
pub struct Executor {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    handle: Handle,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl Executor {
    /// Create an executor bound to the current tokio runtime.
    ///
    /// Fails with a configuration error outside a runtime context.
    pub fn new(config: &ExecutorConfig) -> Result<Self, EntagError> {
        let handle = Handle::try_current().map_err(|_| {
            EntagError::Config("executor requires a running tokio runtime".into())
        })?;
        Ok(Self::with_handle(handle, config.max_blocking_workers))
    }

    /// Create an executor on an explicit runtime handle.
    pub fn with_handle(handle: Handle, max_blocking_workers: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                handle,
                permits: Arc::new(Semaphore::new(max_blocking_workers.max(1))),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Schedule a continuation. Non-blocking; returns immediately.
    pub fn spawn<F>(&self, future: F) -> Result<(), EntagError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.inner.tracker.is_closed() {
            return Err(EntagError::Scheduling("executor is shut down".into()));
        }
        self.inner.tracker.spawn_on(future, &self.inner.handle);
        Ok(())
    }

    /// Dispatch a blocking job and return its settlement channel.
    ///
    /// The job never runs on the caller's thread. If the executor is shut
    /// down, the channel settles immediately with a scheduling error.
    pub fn spawn_blocking<T, F>(&self, f: F) -> oneshot::Receiver<Result<T, EntagError>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, EntagError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        if self.inner.tracker.is_closed() {
            let _ = tx.send(Err(EntagError::Scheduling("executor is shut down".into())));
            return rx;
        }
        let inner = Arc::clone(&self.inner);
        self.inner.tracker.spawn_on(
            async move {
                let outcome = match Arc::clone(&inner.permits).acquire_owned().await {
                    Ok(permit) => {
                        let join = inner.handle.spawn_blocking(move || {
                            // Hold the bounding permit for the whole
                            // blocking closure.
                            let _permit = permit;
                            f()
                        });
                        match join.await {
                            Ok(result) => result,
                            Err(e) => {
                                Err(EntagError::Scheduling(format!("blocking worker failed: {e}")))
                            }
                        }
                    }
                    Err(_) => Err(EntagError::Scheduling("executor is shut down".into())),
                };
                deliver(tx, outcome);
            },
            &self.inner.handle,
        );
        rx
    }

    /// Stop accepting work and wait for everything in flight to finish.
    ///
    /// Idempotent; concurrent callers all return once the pool is drained.
    pub async fn shutdown(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }

    /// True once [`shutdown`](Self::shutdown) has begun.
    pub fn is_shutdown(&self) -> bool {
        self.inner.tracker.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn executor() -> Executor {
        Executor::new(&ExecutorConfig::default()).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_drains_in_flight_work() {
        let exec = executor();
        let done = Arc::new(AtomicBool::new(false));
        let done_clone = Arc::clone(&done);

        let rx = exec.spawn_blocking(move || {
            std::thread::sleep(Duration::from_millis(50));
            done_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        exec.shutdown().await;
        assert!(done.load(Ordering::SeqCst), "in-flight job must complete");
        rx.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn submissions_after_shutdown_are_rejected() {
        let exec = executor();
        exec.shutdown().await;
        assert!(exec.is_shutdown());

        let err = exec.spawn(async {}).unwrap_err();
        assert!(matches!(err, EntagError::Scheduling(_)), "got {err:?}");

        let rx = exec.spawn_blocking(|| Ok(1u32));
        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, EntagError::Scheduling(_)), "got {err:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blocking_work_respects_the_worker_bound() {
        let exec = Executor::with_handle(Handle::current(), 1);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut receivers = Vec::new();
        for _ in 0..4 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            receivers.push(exec.spawn_blocking(move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(20));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        for rx in receivers {
            rx.await.unwrap().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1, "bound of one worker");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_is_idempotent() {
        let exec = executor();
        exec.shutdown().await;
        exec.shutdown().await;
        assert!(exec.is_shutdown());
    }
}
