// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity kinds known to the shared tag table.
//!
//! Each kind owns one id column in `tag_mapping`. The mapping is resolved
//! once, when a store is constructed, rather than re-branching on a kind
//! string at every call site.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::EntagError;

/// The logical type of thing being tagged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Project,
    Dataset,
    ExperimentRun,
}

impl EntityKind {
    /// The `tag_mapping` column holding this kind's entity id.
    pub fn id_column(&self) -> &'static str {
        match self {
            EntityKind::Project => "project_id",
            EntityKind::Dataset => "dataset_id",
            EntityKind::ExperimentRun => "experiment_run_id",
        }
    }

    /// Resolve a kind from its configured name.
    ///
    /// An unrecognized name is a configuration error: stores bound to it
    /// must fail at construction, not per call.
    pub fn from_name(name: &str) -> Result<Self, EntagError> {
        name.parse()
            .map_err(|_| EntagError::Config(format!("unknown entity kind: {name}")))
    }
}
