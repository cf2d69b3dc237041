// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Entag tagging engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, the
//! [`DbBridge`] that turns blocking database callbacks into composable
//! tasks on a bounded executor, and the generic [`TagStore`] engine over
//! the shared `tag_mapping` table.

pub mod bridge;
pub mod database;
pub mod migrations;
pub mod tags;

pub use bridge::DbBridge;
pub use database::Database;
pub use tags::{EntityId, TagStore};
