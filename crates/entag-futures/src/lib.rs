// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous execution primitives for the Entag workspace.
//!
//! [`Task`] turns a value-or-failure that becomes available later into a
//! composable handle; [`Executor`] is the explicit, bounded, drainable pool
//! that every task and continuation runs on. Together they let blocking
//! database work hop off the caller's thread without losing error kinds or
//! diagnostic context along the way.

pub mod executor;
pub mod task;

pub use executor::Executor;
pub use task::Task;
