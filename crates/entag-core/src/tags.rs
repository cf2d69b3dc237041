// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared tag validation.
//!
//! Callers assembling tags from an external request must route them through
//! [`check_entity_tags`] before any mutation; `TagStore::add_tags` applies
//! the same check itself. Checks run per tag so the first offending tag is
//! the one reported.

use crate::error::EntagError;

/// Default maximum tag length, in characters.
pub const DEFAULT_MAX_TAG_LENGTH: usize = 40;

/// Reject empty and over-length tags.
pub fn check_entity_tags(tags: &[String], max_length: usize) -> Result<(), EntagError> {
    for tag in tags {
        if tag.is_empty() {
            return Err(EntagError::InvalidArgument(
                "tag should not be empty".into(),
            ));
        }
        if tag.chars().count() > max_length {
            return Err(EntagError::InvalidArgument(format!(
                "tag name can not be more than {max_length} characters, limit exceeded tag is: {tag}"
            )));
        }
    }
    Ok(())
}
