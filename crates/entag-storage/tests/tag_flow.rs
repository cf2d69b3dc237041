// SPDX-FileCopyrightText: 2026 Entag Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end flow: config, database, executor, bridge, and tag stores
//! working together the way a service layer would drive them.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use entag_core::{config, EntagError, EntityKind};
use entag_futures::{Executor, Task};
use entag_storage::{Database, DbBridge, TagStore};

fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn setup(dir: &tempfile::TempDir) -> (TagStore<String>, DbBridge, Executor) {
    let toml = format!(
        r#"
        [storage]
        database_path = "{}"

        [executor]
        max_blocking_workers = 4
        "#,
        dir.path().join("flow.db").display()
    );
    let cfg = config::load_config_from_str(&toml).unwrap();
    let db = Database::open(&cfg.storage).unwrap();
    let exec = Executor::new(&cfg.executor).unwrap();
    let bridge = DbBridge::new(db, exec.clone());
    let store = TagStore::new(bridge.clone(), exec.clone(), EntityKind::Dataset, &cfg.tags);
    (store, bridge, exec)
}

#[tokio::test(flavor = "multi_thread")]
async fn service_layer_chains_post_processing_onto_tag_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _bridge, exec) = setup(&dir);

    // The CRUD layer chains an audit-style continuation onto the mutation
    // and only observes the combined task.
    let audits = Arc::new(AtomicUsize::new(0));
    let audits_clone = Arc::clone(&audits);
    store
        .add_tags("ds-main".to_string(), tags(&["prod", "ml"]))
        .map(&exec, move |()| {
            audits_clone.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(audits.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.get_tags("ds-main".to_string()).await.unwrap(),
        tags(&["ml", "prod"])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_mutation_skips_the_continuation_and_keeps_its_kind() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _bridge, exec) = setup(&dir);

    let audits = Arc::new(AtomicUsize::new(0));
    let audits_clone = Arc::clone(&audits);
    let err = store
        .add_tags("ds-main".to_string(), vec![])
        .map(&exec, move |()| {
            audits_clone.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument(), "got {err:?}");
    assert_eq!(audits.load(Ordering::SeqCst), 0, "no audit for a failure");
}

#[tokio::test(flavor = "multi_thread")]
async fn parallel_mutations_across_entities_then_one_batch_read() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _bridge, exec) = setup(&dir);

    let adds: Vec<Task<()>> = (0..5)
        .map(|i| store.add_tags(format!("ds-{i}"), tags(&["shared", "common"])))
        .collect();
    Task::all(&exec, adds).await.unwrap();

    let ids: BTreeSet<String> = (0..5).map(|i| format!("ds-{i}")).collect();
    let grouped = store.get_tags_batch(ids).await.unwrap();
    assert_eq!(grouped.len(), 5);
    for (_, entity_tags) in grouped {
        assert_eq!(entity_tags, tags(&["common", "shared"]));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_adds_for_the_same_entity_converge_to_a_set() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _bridge, exec) = setup(&dir);

    // Both adders may read the same existing set and try to insert
    // overlapping tags; the unique index + INSERT OR IGNORE reconcile.
    let adds = vec![
        store.add_tags("ds-race".to_string(), tags(&["a", "b"])),
        store.add_tags("ds-race".to_string(), tags(&["b", "c"])),
    ];
    Task::all(&exec, adds).await.unwrap();

    assert_eq!(
        store.get_tags("ds-race".to_string()).await.unwrap(),
        tags(&["a", "b", "c"])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn full_lifecycle_ends_with_checkpoint_and_drain() {
    let dir = tempfile::tempdir().unwrap();
    let (store, bridge, exec) = setup(&dir);

    store
        .add_tags("ds-life".to_string(), tags(&["v1"]))
        .await
        .unwrap();
    store
        .delete_tags("ds-life".to_string(), None)
        .await
        .unwrap();
    assert!(store.get_tags("ds-life".to_string()).await.unwrap().is_empty());

    bridge.checkpoint().await.unwrap();
    exec.shutdown().await;

    let err = store
        .get_tags("ds-life".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, EntagError::Scheduling(_)), "got {err:?}");
}
