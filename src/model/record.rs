// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{IdError, SectionName, UserId};

/// Opaque per-section payload. The store never looks inside it; only the
/// readiness evaluator has typed awareness of specific fields.
pub type SectionData = serde_json::Map<String, Value>;

pub const REGISTRY_ENTRY_TYPE: &str = "Report Section";

/// One persisted record per (section, identity) pair.
///
/// Overwritten wholesale on every write to the same pair; there is no
/// field-level merge.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRecord {
    pub section: SectionName,
    pub data: SectionData,
    pub saved_at: DateTime<Utc>,
    pub user_id: UserId,
    pub is_demo: bool,
}

/// Structured address fields. All optional; `country` defaults to
/// `"Australia"` both on construction and on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressData {
    pub property_address: Option<String>,
    pub lot_number: Option<String>,
    pub plan_number: Option<String>,
    pub unit_number: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub street_type: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: String,
}

impl Default for AddressData {
    fn default() -> Self {
        Self {
            property_address: None,
            lot_number: None,
            plan_number: None,
            unit_number: None,
            street_number: None,
            street_name: None,
            street_type: None,
            state: None,
            postcode: None,
            country: default_country(),
        }
    }
}

fn default_country() -> String {
    "Australia".to_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssessmentProgress {
    pub current_step: u32,
    pub completed_steps: BTreeSet<u32>,
}

/// The single canonical per-identity aggregate produced by migration and
/// read by the status/readiness views afterwards. At most one exists per
/// identity; its presence is the migration's idempotence guard.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedPropertyData {
    pub report_data: BTreeMap<String, SectionData>,
    pub address_data: AddressData,
    pub assessment_progress: AssessmentProgress,
    pub component_data: BTreeMap<String, Value>,
    pub last_updated: DateTime<Utc>,
    pub user_id: UserId,
    pub is_demo: bool,
}

/// Index entry exposed to the work-hub listing UI. One per distinct section
/// name, upserted by name on every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub entry_type: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
    pub status: RegistryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryStatus {
    Saved,
    DemoSave,
}

/// Derived classification of a single field at evaluation time. Never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Supplied,
    InvestigationRequired,
    NotSupplied,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    InvalidSection { value: String, source: IdError },
    InvalidUserId { value: String, source: IdError },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSection { value, source } => {
                write!(f, "invalid section name {value:?}: {source}")
            }
            Self::InvalidUserId { value, source } => {
                write!(f, "invalid user id {value:?}: {source}")
            }
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSection { source, .. } | Self::InvalidUserId { source, .. } => {
                Some(source)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SaveRecordJson {
    pub section: String,
    #[serde(default)]
    pub data: SectionData,
    pub saved_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub is_demo: bool,
}

impl From<&SaveRecord> for SaveRecordJson {
    fn from(record: &SaveRecord) -> Self {
        Self {
            section: record.section.to_string(),
            data: record.data.clone(),
            saved_at: record.saved_at,
            user_id: record.user_id.to_string(),
            is_demo: record.is_demo,
        }
    }
}

impl TryFrom<SaveRecordJson> for SaveRecord {
    type Error = RecordError;

    fn try_from(json: SaveRecordJson) -> Result<Self, Self::Error> {
        let section =
            SectionName::new(json.section.clone()).map_err(|source| RecordError::InvalidSection {
                value: json.section,
                source,
            })?;
        let user_id =
            UserId::new(json.user_id.clone()).map_err(|source| RecordError::InvalidUserId {
                value: json.user_id,
                source,
            })?;

        Ok(Self {
            section,
            data: json.data,
            saved_at: json.saved_at,
            user_id,
            is_demo: json.is_demo,
        })
    }
}

/// Legacy payloads come from the pre-migration mechanisms and used camelCase
/// field names; the aliases keep those decodable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct AddressDataJson {
    #[serde(default, alias = "propertyAddress")]
    pub property_address: Option<String>,
    #[serde(default, alias = "lotNumber")]
    pub lot_number: Option<String>,
    #[serde(default, alias = "planNumber")]
    pub plan_number: Option<String>,
    #[serde(default, alias = "unitNumber")]
    pub unit_number: Option<String>,
    #[serde(default, alias = "streetNumber")]
    pub street_number: Option<String>,
    #[serde(default, alias = "streetName")]
    pub street_name: Option<String>,
    #[serde(default, alias = "streetType")]
    pub street_type: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl From<&AddressData> for AddressDataJson {
    fn from(address: &AddressData) -> Self {
        Self {
            property_address: address.property_address.clone(),
            lot_number: address.lot_number.clone(),
            plan_number: address.plan_number.clone(),
            unit_number: address.unit_number.clone(),
            street_number: address.street_number.clone(),
            street_name: address.street_name.clone(),
            street_type: address.street_type.clone(),
            state: address.state.clone(),
            postcode: address.postcode.clone(),
            country: Some(address.country.clone()),
        }
    }
}

impl From<AddressDataJson> for AddressData {
    fn from(json: AddressDataJson) -> Self {
        Self {
            property_address: json.property_address,
            lot_number: json.lot_number,
            plan_number: json.plan_number,
            unit_number: json.unit_number,
            street_number: json.street_number,
            street_name: json.street_name,
            street_type: json.street_type,
            state: json.state,
            postcode: json.postcode,
            country: json
                .country
                .filter(|country| !country.is_empty())
                .unwrap_or_else(default_country),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct AssessmentProgressJson {
    #[serde(default, alias = "currentStep")]
    pub current_step: u32,
    #[serde(default, alias = "completedSteps")]
    pub completed_steps: BTreeSet<u32>,
}

impl From<&AssessmentProgress> for AssessmentProgressJson {
    fn from(progress: &AssessmentProgress) -> Self {
        Self {
            current_step: progress.current_step,
            completed_steps: progress.completed_steps.clone(),
        }
    }
}

impl From<AssessmentProgressJson> for AssessmentProgress {
    fn from(json: AssessmentProgressJson) -> Self {
        Self {
            current_step: json.current_step,
            completed_steps: json.completed_steps,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UnifiedPropertyDataJson {
    #[serde(default)]
    pub report_data: BTreeMap<String, SectionData>,
    #[serde(default)]
    pub address_data: AddressDataJson,
    #[serde(default)]
    pub assessment_progress: AssessmentProgressJson,
    #[serde(default)]
    pub component_data: BTreeMap<String, Value>,
    pub last_updated: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub is_demo: bool,
}

impl From<&UnifiedPropertyData> for UnifiedPropertyDataJson {
    fn from(unified: &UnifiedPropertyData) -> Self {
        Self {
            report_data: unified.report_data.clone(),
            address_data: (&unified.address_data).into(),
            assessment_progress: (&unified.assessment_progress).into(),
            component_data: unified.component_data.clone(),
            last_updated: unified.last_updated,
            user_id: unified.user_id.to_string(),
            is_demo: unified.is_demo,
        }
    }
}

impl TryFrom<UnifiedPropertyDataJson> for UnifiedPropertyData {
    type Error = RecordError;

    fn try_from(json: UnifiedPropertyDataJson) -> Result<Self, Self::Error> {
        let user_id =
            UserId::new(json.user_id.clone()).map_err(|source| RecordError::InvalidUserId {
                value: json.user_id,
                source,
            })?;

        Ok(Self {
            report_data: json.report_data,
            address_data: json.address_data.into(),
            assessment_progress: json.assessment_progress.into(),
            component_data: json.component_data,
            last_updated: json.last_updated,
            user_id,
            is_demo: json.is_demo,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegistryEntryJson {
    pub name: String,
    #[serde(rename = "type", default = "registry_entry_type")]
    pub entry_type: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
    pub status: RegistryStatusJson,
}

fn registry_entry_type() -> String {
    REGISTRY_ENTRY_TYPE.to_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum RegistryStatusJson {
    #[serde(rename = "Saved")]
    Saved,
    #[serde(rename = "Demo Save")]
    DemoSave,
}

impl From<RegistryStatus> for RegistryStatusJson {
    fn from(status: RegistryStatus) -> Self {
        match status {
            RegistryStatus::Saved => Self::Saved,
            RegistryStatus::DemoSave => Self::DemoSave,
        }
    }
}

impl From<RegistryStatusJson> for RegistryStatus {
    fn from(status: RegistryStatusJson) -> Self {
        match status {
            RegistryStatusJson::Saved => Self::Saved,
            RegistryStatusJson::DemoSave => Self::DemoSave,
        }
    }
}

impl From<&RegistryEntry> for RegistryEntryJson {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            name: entry.name.clone(),
            entry_type: entry.entry_type.clone(),
            last_modified: entry.last_modified,
            size: entry.size,
            status: entry.status.into(),
        }
    }
}

impl From<RegistryEntryJson> for RegistryEntry {
    fn from(json: RegistryEntryJson) -> Self {
        Self {
            name: json.name,
            entry_type: json.entry_type,
            last_modified: json.last_modified,
            size: json.size,
            status: json.status.into(),
        }
    }
}
