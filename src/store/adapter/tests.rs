// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::{fixture, rstest};

use super::{FolderStore, MemoryStore, PersistentStore, StoreError};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub(crate) struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    pub(crate) fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("valora-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct FolderStoreTestCtx {
    _tmp: TempDir,
    store: FolderStore,
}

#[fixture]
fn folder() -> FolderStoreTestCtx {
    let tmp = TempDir::new("folder-store");
    let store = FolderStore::new(tmp.path().join("store"));
    FolderStoreTestCtx { _tmp: tmp, store }
}

#[rstest]
fn folder_store_round_trips_values(folder: FolderStoreTestCtx) {
    let store = &folder.store;
    assert_eq!(store.get("report_propertyDetails_u_1"), None);

    store.set("report_propertyDetails_u_1", r#"{"a":1}"#).unwrap();
    assert_eq!(
        store.get("report_propertyDetails_u_1").as_deref(),
        Some(r#"{"a":1}"#)
    );

    store.set("report_propertyDetails_u_1", r#"{"a":2}"#).unwrap();
    assert_eq!(
        store.get("report_propertyDetails_u_1").as_deref(),
        Some(r#"{"a":2}"#)
    );
}

#[rstest]
fn folder_store_lists_keys_by_prefix(folder: FolderStoreTestCtx) {
    let store = &folder.store;
    store.set("report_a_u_1", "1").unwrap();
    store.set("report_b_u_1", "2").unwrap();
    store.set("reportData", "3").unwrap();
    store.set("save_c", "4").unwrap();

    assert_eq!(
        store.list_keys(Some("report_")),
        vec!["report_a_u_1".to_owned(), "report_b_u_1".to_owned()]
    );
    assert_eq!(store.list_keys(None).len(), 4);
}

#[rstest]
fn folder_store_encodes_hostile_key_names(folder: FolderStoreTestCtx) {
    let store = &folder.store;
    for key in ["CON", "trailing.", "with:colon", "~tilde"] {
        store.set(key, "v").unwrap();
        assert_eq!(store.get(key).as_deref(), Some("v"), "key {key:?}");
    }

    let mut keys = store.list_keys(None);
    keys.sort();
    let mut expected = vec![
        "CON".to_owned(),
        "trailing.".to_owned(),
        "with:colon".to_owned(),
        "~tilde".to_owned(),
    ];
    expected.sort();
    assert_eq!(keys, expected);
}

#[rstest]
fn folder_store_remove_is_noop_on_missing_key(folder: FolderStoreTestCtx) {
    folder.store.remove("never_written");
    folder.store.set("k", "v").unwrap();
    folder.store.remove("k");
    folder.store.remove("k");
    assert_eq!(folder.store.get("k"), None);
}

#[test]
fn folder_store_capacity_limit_fails_oversized_writes() {
    let tmp = TempDir::new("folder-store-capacity");
    let store = FolderStore::new(tmp.path().join("store")).with_capacity_limit(8);

    store.set("a", "1234").unwrap();
    match store.set("b", "123456") {
        Err(StoreError::CapacityExceeded { key, .. }) => assert_eq!(key, "b"),
        other => panic!("expected CapacityExceeded, got: {other:?}"),
    }

    // Overwriting the existing key does not double-count its old value.
    store.set("a", "12345678").unwrap();
}

#[test]
fn memory_store_round_trips_and_lists() {
    let store = MemoryStore::new();
    store.set("save_x", "1").unwrap();
    store.set("report_y_u", "2").unwrap();

    assert_eq!(store.get("save_x").as_deref(), Some("1"));
    assert_eq!(store.list_keys(Some("save_")), vec!["save_x".to_owned()]);

    store.remove("save_x");
    assert_eq!(store.get("save_x"), None);
}

#[test]
fn memory_store_capacity_limit_counts_value_bytes() {
    let store = MemoryStore::new().with_capacity_limit(4);
    store.set("a", "12").unwrap();
    store.set("b", "34").unwrap();

    match store.set("c", "5") {
        Err(StoreError::CapacityExceeded { .. }) => {}
        other => panic!("expected CapacityExceeded, got: {other:?}"),
    }

    store.set("a", "1").unwrap();
    store.set("c", "5").unwrap();
}

#[rstest]
fn read_json_treats_corrupt_values_as_absent(folder: FolderStoreTestCtx) {
    let store = &folder.store;
    store.set("reportData", "{not json").unwrap();

    let decoded: Option<serde_json::Value> = crate::store::read_json(store, "reportData");
    assert_eq!(decoded, None);

    store.set("reportData", r#"{"ok": true}"#).unwrap();
    let decoded: Option<serde_json::Value> = crate::store::read_json(store, "reportData");
    assert_eq!(decoded, Some(serde_json::json!({"ok": true})));
}
