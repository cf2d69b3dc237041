// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic tag engine over the shared `tag_mapping` table.
//!
//! A [`TagStore`] is bound to one [`EntityKind`] at construction; the
//! kind's id column is resolved once there, never re-branched per call.
//! Every operation returns a [`Task`], so callers chain post-processing on
//! the executor of their choice and translate failures themselves.
//!
//! Per-entity tags form a set. `add_tags` reads the existing set, diffs,
//! and batch-inserts only what is missing; the read and the write are two
//! round trips, and concurrent adders for the same entity are reconciled
//! by the storage layer's per-kind unique index together with
//! `INSERT OR IGNORE`.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use rusqlite::types::FromSql;
use rusqlite::{params, ToSql};

use entag_core::{check_entity_tags, EntagError, EntityKind, TagConfig};
use entag_futures::{Executor, Task};

use crate::bridge::DbBridge;
use crate::database::sql_err;

/// Opaque, comparable entity identifier usable as a `tag_mapping` key.
pub trait EntityId:
    ToSql + FromSql + Ord + Hash + Clone + Send + Sync + std::fmt::Debug + 'static
{
}

impl<T> EntityId for T where
    T: ToSql + FromSql + Ord + Hash + Clone + Send + Sync + std::fmt::Debug + 'static
{
}

/// Tag operations for one entity kind.
#[derive(Clone, Debug)]
pub struct TagStore<I> {
    bridge: DbBridge,
    exec: Executor,
    kind: EntityKind,
    max_tag_length: usize,
    _id: PhantomData<fn() -> I>,
}

impl<I: EntityId> TagStore<I> {
    pub fn new(bridge: DbBridge, exec: Executor, kind: EntityKind, config: &TagConfig) -> Self {
        Self {
            bridge,
            exec,
            kind,
            max_tag_length: config.max_tag_length,
            _id: PhantomData,
        }
    }

    /// Construct from a configured kind name.
    ///
    /// An unrecognized name is fatal here, not at call time.
    pub fn for_kind_name(
        bridge: DbBridge,
        exec: Executor,
        kind_name: &str,
        config: &TagConfig,
    ) -> Result<Self, EntagError> {
        let kind = EntityKind::from_name(kind_name)?;
        Ok(Self::new(bridge, exec, kind, config))
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// All tags for one entity, ascending lexicographically.
    pub fn get_tags(&self, entity_id: I) -> Task<Vec<String>> {
        let entity_name = self.kind.to_string();
        let column = self.kind.id_column();
        self.bridge.with_handle(move |conn| {
            let sql = format!(
                "SELECT tags FROM tag_mapping \
                 WHERE entity_name = ?1 AND {column} = ?2 ORDER BY tags ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
            let rows = stmt
                .query_map(params![entity_name, entity_id], |row| row.get(0))
                .map_err(sql_err)?;
            let mut tags = Vec::new();
            for row in rows {
                tags.push(row.map_err(sql_err)?);
            }
            Ok(tags)
        })
    }

    /// Tags for many entities in one round trip, grouped per entity with
    /// each entity's tags ascending. An empty input yields an empty map
    /// without touching the database.
    pub fn get_tags_batch(&self, entity_ids: BTreeSet<I>) -> Task<BTreeMap<I, Vec<String>>> {
        if entity_ids.is_empty() {
            return Task::completed(BTreeMap::new());
        }
        let entity_name = self.kind.to_string();
        let column = self.kind.id_column();
        self.bridge.with_handle(move |conn| {
            let ids: Vec<I> = entity_ids.into_iter().collect();
            let placeholders = (0..ids.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT {column}, tags FROM tag_mapping \
                 WHERE entity_name = ?1 AND {column} IN ({placeholders}) ORDER BY tags ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
            let mut bound: Vec<&dyn ToSql> = Vec::with_capacity(ids.len() + 1);
            bound.push(&entity_name);
            for id in &ids {
                bound.push(id);
            }
            let rows = stmt
                .query_map(bound.as_slice(), |row| {
                    Ok((row.get::<_, I>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(sql_err)?;
            let mut grouped: BTreeMap<I, Vec<String>> = BTreeMap::new();
            for row in rows {
                let (id, tag) = row.map_err(sql_err)?;
                grouped.entry(id).or_default().push(tag);
            }
            Ok(grouped)
        })
    }

    /// Attach tags to an entity.
    ///
    /// Validates first (an empty list, an empty tag, or an over-length tag
    /// is an invalid argument, first offender reported), then inserts only
    /// the tags the entity does not already carry. Re-adding existing tags
    /// is an idempotent no-op.
    pub fn add_tags(&self, entity_id: I, tags: Vec<String>) -> Task<()> {
        let max_tag_length = self.max_tag_length;
        let requested = tags.clone();
        let validated = Task::run_async(&self.exec, move || {
            if tags.is_empty() {
                return Err(EntagError::InvalidArgument("tags not found".into()));
            }
            check_entity_tags(&tags, max_tag_length)
        });

        let read_store = self.clone();
        let read_id = entity_id.clone();
        let write_store = self.clone();
        let exec = self.exec.clone();
        validated
            .flat_map(&self.exec, move |()| read_store.get_tags(read_id))
            .flat_map(&exec, move |existing| {
                let existing: HashSet<String> = existing.into_iter().collect();
                let missing: BTreeSet<String> = requested
                    .into_iter()
                    .filter(|tag| !existing.contains(tag))
                    .collect();
                if missing.is_empty() {
                    return Task::completed(());
                }
                write_store.insert_missing(entity_id, missing)
            })
    }

    fn insert_missing(&self, entity_id: I, missing: BTreeSet<String>) -> Task<()> {
        let entity_name = self.kind.to_string();
        let column = self.kind.id_column();
        self.bridge.use_transaction(move |tx| {
            let sql = format!(
                "INSERT OR IGNORE INTO tag_mapping (entity_name, tags, {column}) \
                 VALUES (?1, ?2, ?3)"
            );
            let mut stmt = tx.prepare(&sql).map_err(sql_err)?;
            for tag in &missing {
                stmt.execute(params![entity_name, tag, entity_id])
                    .map_err(sql_err)?;
            }
            Ok(())
        })
    }

    /// Remove the given tags, or every tag when `tags` is `None`. Rows
    /// that do not exist are skipped without error.
    pub fn delete_tags(&self, entity_id: I, tags: Option<Vec<String>>) -> Task<()> {
        if let Some(tags) = &tags {
            if tags.is_empty() {
                // SQLite has no empty IN () form; deleting nothing succeeds.
                return Task::completed(());
            }
        }
        let entity_name = self.kind.to_string();
        let column = self.kind.id_column();
        self.bridge.use_handle(move |conn| {
            match tags {
                None => {
                    let sql = format!(
                        "DELETE FROM tag_mapping WHERE entity_name = ?1 AND {column} = ?2"
                    );
                    conn.execute(&sql, params![entity_name, entity_id])
                        .map_err(sql_err)?;
                }
                Some(tags) => {
                    let placeholders = (0..tags.len())
                        .map(|i| format!("?{}", i + 3))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let sql = format!(
                        "DELETE FROM tag_mapping \
                         WHERE entity_name = ?1 AND {column} = ?2 AND tags IN ({placeholders})"
                    );
                    let mut bound: Vec<&dyn ToSql> = Vec::with_capacity(tags.len() + 2);
                    bound.push(&entity_name);
                    bound.push(&entity_id);
                    for tag in &tags {
                        bound.push(tag);
                    }
                    conn.execute(&sql, bound.as_slice()).map_err(sql_err)?;
                }
            }
            Ok(())
        })
    }
}
