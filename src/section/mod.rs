// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Section record writer/reader.
//!
//! Serializes one [`SaveRecord`] per (section, identity) pair, keeps the
//! registry index the work-hub listing reads, and falls back to the demo
//! identity key when a write against the resolved identity fails, so user
//! input is not silently lost even when identity resolution is flaky.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::model::record::{RegistryEntryJson, SaveRecordJson, UnifiedPropertyDataJson};
use crate::model::{
    resolve_or_demo, Identity, IdentityProvider, RegistryEntry, RegistryStatus, SaveRecord,
    SectionData, SectionName, UnifiedPropertyData, REGISTRY_ENTRY_TYPE,
};
use crate::notify::{Notifier, SilentNotifier};
use crate::store::keys::{record_key, unified_backup_key, unified_key, REGISTRY_KEY};
use crate::store::{read_json, write_json, PersistentStore, StoreError};

#[derive(Debug)]
pub enum SectionError {
    Store { key: String, source: StoreError },
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { key, source } => {
                write!(f, "cannot persist section record at {key:?}: {source}")
            }
        }
    }
}

impl std::error::Error for SectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store { source, .. } => Some(source),
        }
    }
}

/// The single write path for report sections.
#[derive(Clone)]
pub struct ReportStore<S> {
    store: S,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
}

impl<S: PersistentStore> ReportStore<S> {
    pub fn new(store: S, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            notifier: Arc::new(SilentNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn current_identity(&self) -> Identity {
        resolve_or_demo(self.identity.as_ref())
    }

    /// Writes a section record wholesale and upserts its registry entry.
    ///
    /// On a store failure the write is retried once against the demo-identity
    /// key, re-tagging the record as demo; only a second failure surfaces an
    /// error. Never panics.
    pub fn write_section(
        &self,
        section: &SectionName,
        data: SectionData,
    ) -> Result<SaveRecord, SectionError> {
        let identity = self.current_identity();
        let record = SaveRecord {
            section: section.clone(),
            data,
            saved_at: Utc::now(),
            user_id: identity.user_id,
            is_demo: identity.is_demo,
        };

        let key = record_key(section, &record.user_id);
        let primary_err = match write_json(&self.store, &key, &SaveRecordJson::from(&record)) {
            Ok(()) => {
                self.upsert_registry_entry(&record);
                return Ok(record);
            }
            Err(source) => source,
        };

        if record.is_demo {
            return Err(SectionError::Store {
                key,
                source: primary_err,
            });
        }

        tracing::warn!(
            "section write failed at {key:?}, retrying against demo identity: {primary_err}"
        );

        let demo = Identity::demo();
        let record = SaveRecord {
            user_id: demo.user_id,
            is_demo: true,
            ..record
        };
        let demo_key = record_key(section, &record.user_id);
        match write_json(&self.store, &demo_key, &SaveRecordJson::from(&record)) {
            Ok(()) => {
                self.upsert_registry_entry(&record);
                Ok(record)
            }
            Err(_) => Err(SectionError::Store {
                key,
                source: primary_err,
            }),
        }
    }

    /// Reads the record for the current identity, falling back to the
    /// demo-identity key. Undecodable records read as absent.
    pub fn read_section(&self, section: &SectionName) -> Option<SaveRecord> {
        let identity = self.current_identity();
        let primary = self.read_record_at(&record_key(section, &identity.user_id));
        if primary.is_some() || identity.is_demo {
            return primary;
        }

        self.read_record_at(&record_key(section, &Identity::demo().user_id))
    }

    /// Removes the record for the current identity and its registry entry.
    /// Must not raise if the key does not exist.
    pub fn clear_section(&self, section: &SectionName) {
        let identity = self.current_identity();
        self.store.remove(&record_key(section, &identity.user_id));
        self.remove_registry_entry(section.as_str());
    }

    /// Current registry index, in stored order.
    pub fn registry(&self) -> Vec<RegistryEntry> {
        self.read_registry()
            .into_iter()
            .map(RegistryEntry::from)
            .collect()
    }

    /// Reads the unified record for the current identity, falling back to
    /// the backup copy when the primary is missing or undecodable.
    pub fn load_unified(&self) -> Option<UnifiedPropertyData> {
        let identity = self.current_identity();
        self.read_unified_at(&unified_key(&identity.user_id))
            .or_else(|| self.read_unified_at(&unified_backup_key(&identity.user_id)))
    }

    fn read_record_at(&self, key: &str) -> Option<SaveRecord> {
        let json: SaveRecordJson = read_json(&self.store, key)?;
        match SaveRecord::try_from(json) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!("discarding invalid section record at {key:?}: {err}");
                None
            }
        }
    }

    fn read_unified_at(&self, key: &str) -> Option<UnifiedPropertyData> {
        let json: UnifiedPropertyDataJson = read_json(&self.store, key)?;
        match UnifiedPropertyData::try_from(json) {
            Ok(unified) => Some(unified),
            Err(err) => {
                tracing::debug!("discarding invalid unified record at {key:?}: {err}");
                None
            }
        }
    }

    fn read_registry(&self) -> Vec<RegistryEntryJson> {
        read_json(&self.store, REGISTRY_KEY).unwrap_or_default()
    }

    fn upsert_registry_entry(&self, record: &SaveRecord) {
        let entry = RegistryEntry {
            name: record.section.to_string(),
            entry_type: REGISTRY_ENTRY_TYPE.to_owned(),
            last_modified: record.saved_at,
            size: serde_json::to_string(&record.data)
                .map(|serialized| serialized.len() as u64)
                .unwrap_or(0),
            status: if record.is_demo {
                RegistryStatus::DemoSave
            } else {
                RegistryStatus::Saved
            },
        };

        let mut entries = self.read_registry();
        let entry = RegistryEntryJson::from(&entry);
        match entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }

        // The registry is derived state; losing an update is not worth
        // failing the record write that succeeded.
        if let Err(err) = write_json(&self.store, REGISTRY_KEY, &entries) {
            tracing::warn!("cannot update registry index: {err}");
        }
    }

    fn remove_registry_entry(&self, name: &str) {
        let mut entries = self.read_registry();
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        if entries.len() == before {
            return;
        }

        if let Err(err) = write_json(&self.store, REGISTRY_KEY, &entries) {
            tracing::warn!("cannot update registry index: {err}");
        }
    }
}

#[cfg(test)]
mod tests;
