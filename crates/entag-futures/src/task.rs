// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The composable task abstraction.
//!
//! A [`Task`] is a handle to exactly one of {pending, value, failure}. Once
//! settled it is immutable. Continuations are registered without blocking
//! and each runs at most once, on the executor named at registration. A
//! failed source never runs a continuation body; the failure crosses the
//! chain unchanged, so the error variant chosen at the failure site is the
//! one the final observer sees.
//!
//! Failures are never silently dropped: a failure that finds no observer is
//! logged at `warn!`, whether the observer disappeared before settlement or
//! a ready failure was dropped unawaited.

use std::future::{Future, IntoFuture};
use std::panic::Location;
use std::pin::Pin;

use tokio::sync::oneshot;

use entag_core::EntagError;

use crate::executor::Executor;

enum Inner<T> {
    Ready(Option<Result<T, EntagError>>),
    Pending(oneshot::Receiver<Result<T, EntagError>>),
}

/// Handle to a value or failure that becomes available later.
pub struct Task<T> {
    inner: Inner<T>,
}

impl<T> Task<T> {
    /// An already-settled successful task.
    pub fn completed(value: T) -> Self {
        Self::from_result(Ok(value))
    }

    /// An already-settled failed task.
    pub fn failed(error: EntagError) -> Self {
        Self::from_result(Err(error))
    }

    /// An already-settled task from a result.
    pub fn from_result(result: Result<T, EntagError>) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    pub(crate) fn pending(rx: oneshot::Receiver<Result<T, EntagError>>) -> Self {
        Self {
            inner: Inner::Pending(rx),
        }
    }
}

impl<T: Send + 'static> Task<T> {
    /// Schedule `f` on the executor's blocking pool and settle with its
    /// result. The caller's thread is never blocked.
    pub fn run_async<F>(executor: &Executor, f: F) -> Self
    where
        F: FnOnce() -> Result<T, EntagError> + Send + 'static,
    {
        Self::pending(executor.spawn_blocking(f))
    }

    /// Like [`run_async`](Self::run_async), wrapped in a tracing span
    /// naming the operation and the originating call site. The span records
    /// success or failure when the closure returns.
    pub fn traced<F>(
        executor: &Executor,
        operation: &'static str,
        caller: &'static Location<'static>,
        f: F,
    ) -> Self
    where
        F: FnOnce() -> Result<T, EntagError> + Send + 'static,
    {
        let span = tracing::info_span!("entag.task", operation, caller = %caller);
        Self::pending(executor.spawn_blocking(move || {
            let _entered = span.enter();
            let result = f();
            match &result {
                Ok(_) => tracing::debug!("operation completed"),
                Err(error) => tracing::warn!(%error, "operation failed"),
            }
            result
        }))
    }

    /// Consume the task and wait for it to settle.
    async fn settle(mut self) -> Result<T, EntagError> {
        match std::mem::replace(&mut self.inner, Inner::Ready(None)) {
            Inner::Ready(Some(result)) => result,
            Inner::Ready(None) => Err(EntagError::Internal("task settled twice".into())),
            Inner::Pending(rx) => rx.await.unwrap_or(Err(EntagError::Canceled)),
        }
    }

    /// When this task settles to a value, run `f(value)` on `executor`.
    /// A failure bypasses `f` and propagates unchanged.
    pub fn map<U, F>(self, executor: &Executor, f: F) -> Task<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.and_then(executor, move |value| Ok(f(value)))
    }

    /// Like [`map`](Self::map) for fallible continuations.
    pub fn and_then<U, F>(self, executor: &Executor, f: F) -> Task<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, EntagError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let spawned = executor.spawn(async move {
            let outcome = match self.settle().await {
                Ok(value) => f(value),
                Err(error) => Err(error),
            };
            deliver(tx, outcome);
        });
        match spawned {
            Ok(()) => Task::pending(rx),
            Err(error) => Task::failed(error),
        }
    }

    /// Like [`map`](Self::map) but `f` returns another task; the result
    /// settles when the inner task settles, flattened one level.
    pub fn flat_map<U, F>(self, executor: &Executor, f: F) -> Task<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Task<U> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let spawned = executor.spawn(async move {
            let outcome = match self.settle().await {
                Ok(value) => f(value).settle().await,
                Err(error) => Err(error),
            };
            deliver(tx, outcome);
        });
        match spawned {
            Ok(()) => Task::pending(rx),
            Err(error) => Task::failed(error),
        }
    }

    /// Combine tasks that are already running: settles to every value once
    /// all settle, or to the first failure encountered. Remaining results
    /// after a failure are discarded (their own failures are still logged).
    pub fn all(executor: &Executor, tasks: Vec<Task<T>>) -> Task<Vec<T>> {
        let (tx, rx) = oneshot::channel();
        let spawned = executor.spawn(async move {
            let mut values = Vec::with_capacity(tasks.len());
            let mut tasks = tasks.into_iter();
            let outcome = loop {
                match tasks.next() {
                    Some(task) => match task.settle().await {
                        Ok(value) => values.push(value),
                        Err(error) => break Err(error),
                    },
                    None => break Ok(values),
                }
            };
            deliver(tx, outcome);
        });
        match spawned {
            Ok(()) => Task::pending(rx),
            Err(error) => Task::failed(error),
        }
    }
}

impl<T: Send + 'static> IntoFuture for Task<T> {
    type Output = Result<T, EntagError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Result<T, EntagError>> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.settle())
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        if let Inner::Ready(Some(Err(error))) = &self.inner {
            tracing::warn!(%error, "task dropped with unobserved failure");
        }
    }
}

/// Settle a channel, logging a failure nobody is left to observe.
pub(crate) fn deliver<T>(
    tx: oneshot::Sender<Result<T, EntagError>>,
    result: Result<T, EntagError>,
) {
    if let Err(unobserved) = tx.send(result) {
        if let Err(error) = unobserved {
            tracing::warn!(%error, "task failure dropped without an observer");
        }
    }
}
