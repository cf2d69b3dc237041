// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Entag tagging engine.
//!
//! This crate provides the error taxonomy, the entity-kind model, shared
//! tag validation, and layered configuration used throughout the Entag
//! workspace.

pub mod config;
pub mod error;
pub mod tags;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use config::{EntagConfig, ExecutorConfig, StorageConfig, TagConfig};
pub use error::EntagError;
pub use tags::{check_entity_tags, DEFAULT_MAX_TAG_LENGTH};
pub use types::EntityKind;
