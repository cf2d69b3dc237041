// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration using Figment.
//!
//! Merge order (later overrides earlier): compiled defaults, an optional
//! `entag.toml` in the working directory (or an explicit path), then
//! `ENTAG_*` environment variables. All structs reject unknown keys so a
//! typo in a config file fails at startup with a usable message.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::EntagError;
use crate::tags::DEFAULT_MAX_TAG_LENGTH;

/// Top-level Entag configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntagConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Blocking-work executor settings.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Tag validation settings.
    #[serde(default)]
    pub tags: TagConfig,
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Database file path. `:memory:` opens an in-memory database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// How long a blocked writer waits before giving up, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Enable write-ahead-log journaling. Ignored for in-memory databases.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal_mode: default_wal_mode(),
        }
    }
}

/// Executor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Maximum number of blocking jobs running concurrently. Submissions
    /// beyond the bound queue rather than fail.
    #[serde(default = "default_max_blocking_workers")]
    pub max_blocking_workers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_blocking_workers: default_max_blocking_workers(),
        }
    }
}

/// Tag validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    /// Maximum tag length, in characters.
    #[serde(default = "default_max_tag_length")]
    pub max_tag_length: usize,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            max_tag_length: default_max_tag_length(),
        }
    }
}

fn default_database_path() -> String {
    "entag.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_wal_mode() -> bool {
    true
}

fn default_max_blocking_workers() -> usize {
    8
}

fn default_max_tag_length() -> usize {
    DEFAULT_MAX_TAG_LENGTH
}

/// Load configuration from `./entag.toml` with env var overrides.
pub fn load_config() -> Result<EntagConfig, EntagError> {
    Figment::new()
        .merge(Serialized::defaults(EntagConfig::default()))
        .merge(Toml::file("entag.toml"))
        .merge(env_provider())
        .extract()
        .map_err(|e| EntagError::Config(e.to_string()))
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EntagConfig, EntagError> {
    Figment::new()
        .merge(Serialized::defaults(EntagConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| EntagError::Config(e.to_string()))
}

/// Load configuration from a TOML string only (no file or env lookup).
///
/// Used for testing and explicit in-process configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<EntagConfig, EntagError> {
    Figment::new()
        .merge(Serialized::defaults(EntagConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
        .map_err(|e| EntagError::Config(e.to_string()))
}

/// Map `ENTAG_STORAGE_DATABASE_PATH`-style variables onto dotted keys.
///
/// Uses `Env::map()` rather than `Env::split("_")` so key names that
/// themselves contain underscores stay intact.
fn env_provider() -> Env {
    Env::prefixed("ENTAG_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("storage_", "storage.", 1)
            .replacen("executor_", "executor.", 1)
            .replacen("tags_", "tags.", 1);
        mapped.into()
    })
}
