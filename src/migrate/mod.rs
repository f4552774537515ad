// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One-shot reconciliation of historical save mechanisms.
//!
//! Scans every key in the store, recognizes each historical key shape, and
//! merges the payloads into one [`UnifiedPropertyData`] record for the
//! current identity (plus a backup copy). Legacy keys are retained for
//! rollback; unknown keys are never touched. Idempotent: the presence of the
//! unified record short-circuits the whole pass, which also makes a failed
//! run safely retryable on the next load.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::model::record::{AddressDataJson, AssessmentProgressJson, UnifiedPropertyDataJson};
use crate::model::{
    resolve_or_demo, AddressData, AssessmentProgress, IdentityProvider, SectionData,
    UnifiedPropertyData,
};
use crate::store::keys::{classify_legacy, unified_backup_key, unified_key, ComponentSource, LegacyKey};
use crate::store::{read_json, write_json, PersistentStore, StoreError};

#[derive(Debug)]
pub enum MigrateError {
    Store { key: String, source: StoreError },
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { key, source } => {
                write!(f, "cannot write unified record at {key:?}: {source}")
            }
        }
    }
}

impl std::error::Error for MigrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The unified record already exists; nothing was read or written.
    AlreadyMigrated,
    Migrated(MigrationSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub components: usize,
    pub report_sections: usize,
    pub migrated_address: bool,
    pub migrated_progress: bool,
}

pub struct LegacyMigration<S> {
    store: S,
    identity: Arc<dyn IdentityProvider>,
}

impl<S: PersistentStore> LegacyMigration<S> {
    pub fn new(store: S, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Runs the migration, swallowing failures. A failed run must never
    /// crash application startup; it is retried on the next load because the
    /// idempotence guard is re-checked first.
    pub fn run(&self) -> bool {
        match self.try_run() {
            Ok(MigrationOutcome::AlreadyMigrated) => true,
            Ok(MigrationOutcome::Migrated(summary)) => {
                tracing::debug!(
                    "migrated legacy report data: {} components, {} report sections",
                    summary.components,
                    summary.report_sections
                );
                true
            }
            Err(err) => {
                tracing::warn!("legacy migration failed: {err}");
                false
            }
        }
    }

    pub fn try_run(&self) -> Result<MigrationOutcome, MigrateError> {
        let identity = resolve_or_demo(self.identity.as_ref());
        let target_key = unified_key(&identity.user_id);
        if self.store.get(&target_key).is_some() {
            return Ok(MigrationOutcome::AlreadyMigrated);
        }

        let mut report_components = BTreeMap::<String, Value>::new();
        let mut save_components = BTreeMap::<String, Value>::new();
        let mut report_data = BTreeMap::<String, SectionData>::new();
        let mut address_data = AddressData::default();
        let mut assessment_progress = AssessmentProgress::default();
        let mut migrated_address = false;
        let mut migrated_progress = false;

        for key in self.store.list_keys(None) {
            let Some(legacy) = classify_legacy(&key, &identity.user_id) else {
                continue;
            };

            match legacy {
                LegacyKey::Component { name, source } => {
                    let Some(payload) = read_json::<Value>(&self.store, &key) else {
                        continue;
                    };
                    match source {
                        ComponentSource::ReportRecord => {
                            report_components.insert(name, payload);
                        }
                        ComponentSource::DirectSave => {
                            save_components.insert(name, payload);
                        }
                    }
                }
                LegacyKey::ReportData => {
                    if let Some(sections) =
                        read_json::<BTreeMap<String, SectionData>>(&self.store, &key)
                    {
                        report_data = sections;
                    }
                }
                LegacyKey::AddressData => {
                    if let Some(address) = read_json::<AddressDataJson>(&self.store, &key) {
                        address_data = address.into();
                        migrated_address = true;
                    }
                }
                LegacyKey::AssessmentProgress => {
                    if let Some(progress) =
                        read_json::<AssessmentProgressJson>(&self.store, &key)
                    {
                        assessment_progress = progress.into();
                        migrated_progress = true;
                    }
                }
            }
        }

        // Direct `save_<component>` entries supersede `report_<component>_*`
        // records for the same component: last classification wins, no merge.
        let mut component_data = report_components;
        component_data.extend(save_components);

        let summary = MigrationSummary {
            components: component_data.len(),
            report_sections: report_data.len(),
            migrated_address,
            migrated_progress,
        };

        let unified = UnifiedPropertyData {
            report_data,
            address_data,
            assessment_progress,
            component_data,
            last_updated: Utc::now(),
            user_id: identity.user_id,
            is_demo: identity.is_demo,
        };
        let wire = UnifiedPropertyDataJson::from(&unified);

        write_json(&self.store, &target_key, &wire).map_err(|source| MigrateError::Store {
            key: target_key.clone(),
            source,
        })?;

        let backup_key = unified_backup_key(&unified.user_id);
        write_json(&self.store, &backup_key, &wire).map_err(|source| MigrateError::Store {
            key: backup_key,
            source,
        })?;

        Ok(MigrationOutcome::Migrated(summary))
    }
}
