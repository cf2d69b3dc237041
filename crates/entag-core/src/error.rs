// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Entag framework.
//!
//! The variant is the contract: outer layers map `InvalidArgument` and
//! `Config` to caller mistakes (4xx-equivalent) and everything else to
//! execution failures (5xx-equivalent). Errors cross task chains without
//! being rewrapped, so the variant chosen at the failure site survives to
//! whoever awaits the chain.

use thiserror::Error;

/// The primary error type used across the Entag workspace.
#[derive(Debug, Error)]
pub enum EntagError {
    /// Caller-supplied input was rejected before any side effect.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration (unknown entity kind, missing runtime, bad
    /// config file). Fatal at construction, never retried per-call.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, query failure, constraint
    /// violation). The source error is preserved unchanged.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Work could not be handed to the executor (saturation or shutdown).
    #[error("scheduling error: {0}")]
    Scheduling(String),

    /// The task's producer was dropped before settling it.
    #[error("task was canceled before settling")]
    Canceled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EntagError {
    /// Wrap an arbitrary backend error as a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// True for failures the caller can fix by changing the request.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_helper_preserves_source() {
        let err = EntagError::storage(std::io::Error::other("disk gone"));
        match &err {
            EntagError::Storage { source } => {
                assert!(source.to_string().contains("disk gone"));
            }
            other => panic!("expected Storage, got {other:?}"),
        }
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn invalid_argument_is_distinguishable() {
        let err = EntagError::InvalidArgument("empty tag".into());
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "invalid argument: empty tag");
    }
}
