// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use chrono::Utc;
use rstest::{fixture, rstest};

use super::{ReportStore, SectionError};
use crate::model::record::UnifiedPropertyDataJson;
use crate::model::{
    DemoIdentity, Identity, IdentityError, IdentityProvider, RegistryStatus, SectionData,
    SectionName, StaticIdentity, DEMO_USER_ID,
};
use crate::store::keys::{record_key, unified_backup_key, REGISTRY_KEY};
use crate::store::{MemoryStore, PersistentStore, StoreError};

struct FailingProvider;

impl IdentityProvider for FailingProvider {
    fn resolve(&self) -> Result<Identity, IdentityError> {
        Err(IdentityError::Unavailable {
            reason: "session expired".to_owned(),
        })
    }
}

/// Store wrapper that rejects writes whose key contains a marker substring.
struct RejectKeys<S> {
    inner: S,
    reject: &'static str,
}

impl<S: PersistentStore> PersistentStore for RejectKeys<S> {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key.contains(self.reject) {
            return Err(StoreError::CapacityExceeded {
                key: key.to_owned(),
                size: value.len(),
                capacity: 0,
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) {
        self.inner.remove(key)
    }

    fn list_keys(&self, prefix: Option<&str>) -> Vec<String> {
        self.inner.list_keys(prefix)
    }
}

fn section(name: &str) -> SectionName {
    SectionName::new(name).unwrap()
}

fn payload(pairs: &[(&str, &str)]) -> SectionData {
    let mut data = SectionData::new();
    for (key, value) in pairs {
        data.insert((*key).to_owned(), (*value).into());
    }
    data
}

#[fixture]
fn authed() -> ReportStore<MemoryStore> {
    ReportStore::new(
        MemoryStore::new(),
        Arc::new(StaticIdentity::authenticated("u_1042").unwrap()),
    )
}

#[rstest]
fn write_then_read_round_trips(authed: ReportStore<MemoryStore>) {
    let before = Utc::now();
    let data = payload(&[("state", "NSW"), ("postcode", "2000")]);

    let written = authed
        .write_section(&section("propertyDetails"), data.clone())
        .unwrap();
    assert!(written.saved_at >= before);
    assert!(!written.is_demo);
    assert_eq!(written.user_id.as_str(), "u_1042");

    let read = authed.read_section(&section("propertyDetails")).unwrap();
    assert_eq!(read.data, data);
    assert_eq!(read.saved_at, written.saved_at);
}

#[rstest]
fn registry_upserts_by_name_without_duplicates(authed: ReportStore<MemoryStore>) {
    authed
        .write_section(&section("propertyDetails"), payload(&[("a", "1")]))
        .unwrap();
    let second = authed
        .write_section(&section("propertyDetails"), payload(&[("a", "2"), ("b", "3")]))
        .unwrap();
    authed
        .write_section(&section("esgAssessment"), payload(&[("c", "4")]))
        .unwrap();

    let registry = authed.registry();
    assert_eq!(registry.len(), 2);

    let entry = registry
        .iter()
        .find(|entry| entry.name == "propertyDetails")
        .unwrap();
    assert_eq!(entry.last_modified, second.saved_at);
    assert_eq!(entry.entry_type, "Report Section");
    assert_eq!(entry.status, RegistryStatus::Saved);
    assert_eq!(
        entry.size,
        serde_json::to_string(&second.data).unwrap().len() as u64
    );
}

#[test]
fn identity_failure_falls_back_to_demo_identity() {
    let store = ReportStore::new(MemoryStore::new(), Arc::new(FailingProvider));

    let record = store
        .write_section(&section("propertyDetails"), payload(&[("a", "1")]))
        .unwrap();
    assert!(record.is_demo);
    assert_eq!(record.user_id.as_str(), DEMO_USER_ID);

    let registry = store.registry();
    assert_eq!(registry[0].status, RegistryStatus::DemoSave);
}

#[test]
fn write_failure_retries_against_demo_key() {
    let raw = Arc::new(MemoryStore::new());
    let rejecting = RejectKeys {
        inner: raw.clone(),
        reject: "u_1042",
    };
    let store = ReportStore::new(
        rejecting,
        Arc::new(StaticIdentity::authenticated("u_1042").unwrap()),
    );

    let record = store
        .write_section(&section("propertyDetails"), payload(&[("a", "1")]))
        .unwrap();
    assert!(record.is_demo);

    let demo_key = record_key(&section("propertyDetails"), &Identity::demo().user_id);
    assert!(raw.get(&demo_key).is_some());
}

#[test]
fn write_failure_on_both_keys_surfaces_error() {
    let store = ReportStore::new(
        MemoryStore::new().with_capacity_limit(0),
        Arc::new(StaticIdentity::authenticated("u_1042").unwrap()),
    );

    match store.write_section(&section("propertyDetails"), payload(&[("a", "1")])) {
        Err(SectionError::Store { key, .. }) => {
            assert_eq!(key, "report_propertyDetails_u_1042");
        }
        other => panic!("expected store error, got: {other:?}"),
    }
}

#[test]
fn read_falls_back_to_demo_key() {
    let raw = Arc::new(MemoryStore::new());
    let demo_store = ReportStore::new(raw.clone(), Arc::new(DemoIdentity));
    demo_store
        .write_section(&section("propertyDetails"), payload(&[("a", "1")]))
        .unwrap();

    let authed_store = ReportStore::new(
        raw,
        Arc::new(StaticIdentity::authenticated("u_1042").unwrap()),
    );
    let record = authed_store.read_section(&section("propertyDetails")).unwrap();
    assert!(record.is_demo);
}

#[rstest]
fn corrupt_record_reads_as_absent(authed: ReportStore<MemoryStore>) {
    authed
        .store()
        .set("report_propertyDetails_u_1042", "{not json")
        .unwrap();
    assert!(authed.read_section(&section("propertyDetails")).is_none());
}

#[rstest]
fn clear_section_removes_record_and_registry_entry(authed: ReportStore<MemoryStore>) {
    authed
        .write_section(&section("propertyDetails"), payload(&[("a", "1")]))
        .unwrap();
    authed
        .write_section(&section("esgAssessment"), payload(&[("b", "2")]))
        .unwrap();

    authed.clear_section(&section("propertyDetails"));
    assert!(authed.read_section(&section("propertyDetails")).is_none());
    let registry = authed.registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0].name, "esgAssessment");

    // Clearing again (or a never-written section) must not raise.
    authed.clear_section(&section("propertyDetails"));
    authed.clear_section(&section("neverWritten"));
}

#[rstest]
fn clear_section_leaves_registry_untouched_for_unknown_name(authed: ReportStore<MemoryStore>) {
    authed
        .write_section(&section("esgAssessment"), payload(&[("b", "2")]))
        .unwrap();
    let raw_before = authed.store().get(REGISTRY_KEY);

    authed.clear_section(&section("neverWritten"));
    assert_eq!(authed.store().get(REGISTRY_KEY), raw_before);
}

#[rstest]
fn load_unified_falls_back_to_backup_copy(authed: ReportStore<MemoryStore>) {
    let unified = UnifiedPropertyDataJson {
        report_data: Default::default(),
        address_data: Default::default(),
        assessment_progress: Default::default(),
        component_data: Default::default(),
        last_updated: Utc::now(),
        user_id: "u_1042".to_owned(),
        is_demo: false,
    };

    let backup_key = unified_backup_key(&authed.current_identity().user_id);
    authed
        .store()
        .set(&backup_key, &serde_json::to_string(&unified).unwrap())
        .unwrap();

    let loaded = authed.load_unified().unwrap();
    assert_eq!(loaded.user_id.as_str(), "u_1042");
    assert_eq!(loaded.address_data.country, "Australia");
}
