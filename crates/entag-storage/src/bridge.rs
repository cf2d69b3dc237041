// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridge from blocking database work to [`Task`]s.
//!
//! Every entry point hands the blocking callback to the bounded executor
//! and returns immediately; the connection is locked inside the worker
//! closure and released before the task settles. Each dispatch runs inside
//! a tracing span naming the operation and the immediate caller's
//! `file:line`, so async database latency stays attributable.
//!
//! Callback errors fail the returned task with that exact error. SQL
//! errors are wrapped once, at this boundary, as
//! [`EntagError::Storage`] with the source preserved; no other
//! translation happens anywhere in a chain.

use std::panic::Location;

use rusqlite::{Connection, Transaction};

use entag_core::EntagError;
use entag_futures::{Executor, Task};

use crate::database::{poisoned, sql_err, Database};

/// Adapter turning blocking database callbacks into task-returning
/// operations.
#[derive(Clone, Debug)]
pub struct DbBridge {
    db: Database,
    exec: Executor,
}

impl DbBridge {
    pub fn new(db: Database, exec: Executor) -> Self {
        Self { db, exec }
    }

    /// The executor this bridge dispatches on.
    pub fn executor(&self) -> &Executor {
        &self.exec
    }

    /// Run `f` with a borrowed connection on a worker thread.
    #[track_caller]
    pub fn with_handle<R, F>(&self, f: F) -> Task<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<R, EntagError> + Send + 'static,
    {
        let caller = Location::caller();
        let conn = self.db.connection();
        Task::traced(&self.exec, "db.with_handle", caller, move || {
            let mut guard = conn.lock().map_err(|_| poisoned())?;
            f(&mut *guard)
        })
    }

    /// Run `f` inside a transaction: commit when it returns `Ok`, roll
    /// back when it returns `Err`. The decision is made before the task
    /// settles.
    #[track_caller]
    pub fn with_transaction<R, F>(&self, f: F) -> Task<R>
    where
        R: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<R, EntagError> + Send + 'static,
    {
        let caller = Location::caller();
        let conn = self.db.connection();
        Task::traced(&self.exec, "db.with_transaction", caller, move || {
            let mut guard = conn.lock().map_err(|_| poisoned())?;
            let tx = guard.transaction().map_err(sql_err)?;
            let value = f(&tx)?;
            tx.commit().map_err(sql_err)?;
            Ok(value)
        })
    }

    /// [`with_handle`](Self::with_handle) for callbacks with no result.
    #[track_caller]
    pub fn use_handle<F>(&self, f: F) -> Task<()>
    where
        F: FnOnce(&mut Connection) -> Result<(), EntagError> + Send + 'static,
    {
        let caller = Location::caller();
        let conn = self.db.connection();
        Task::traced(&self.exec, "db.use_handle", caller, move || {
            let mut guard = conn.lock().map_err(|_| poisoned())?;
            f(&mut *guard)
        })
    }

    /// [`with_transaction`](Self::with_transaction) for callbacks with no
    /// result.
    #[track_caller]
    pub fn use_transaction<F>(&self, f: F) -> Task<()>
    where
        F: FnOnce(&Transaction<'_>) -> Result<(), EntagError> + Send + 'static,
    {
        let caller = Location::caller();
        let conn = self.db.connection();
        Task::traced(&self.exec, "db.use_transaction", caller, move || {
            let mut guard = conn.lock().map_err(|_| poisoned())?;
            let tx = guard.transaction().map_err(sql_err)?;
            f(&tx)?;
            tx.commit().map_err(sql_err)?;
            Ok(())
        })
    }

    /// Like [`with_handle`](Self::with_handle) for callbacks that
    /// themselves return a task; the result is flattened so the caller
    /// never sees a task-of-a-task.
    #[track_caller]
    pub fn with_handle_compose<R, F>(&self, f: F) -> Task<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<Task<R>, EntagError> + Send + 'static,
    {
        let exec = self.exec.clone();
        self.with_handle(f).flat_map(&exec, |inner| inner)
    }

    /// Truncate-checkpoint the write-ahead log; used at shutdown.
    pub fn checkpoint(&self) -> Task<()> {
        self.use_handle(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(sql_err)
        })
    }
}
