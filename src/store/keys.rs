// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Key-naming and namespacing scheme.
//!
//! Pure, deterministic functions from (purpose, section, user) to storage
//! keys, plus the classifier for every historical key shape the migration
//! engine must recognize. Keys not matching a known pattern are ignored,
//! never deleted.

use crate::model::{SectionName, UserId, DEMO_USER_ID};

/// Index record consumed by the work-hub listing UI.
pub const REGISTRY_KEY: &str = "report_file_index";

const UNIFIED_KEY_PREFIX: &str = "unified_property_data_";
const UNIFIED_BACKUP_KEY_PREFIX: &str = "unified_property_data_backup_";

const LEGACY_REPORT_PREFIX: &str = "report_";
const LEGACY_SAVE_PREFIX: &str = "save_";
const LEGACY_REPORT_DATA_KEY: &str = "reportData";
const LEGACY_ADDRESS_KEY: &str = "propertyAddressData";
const LEGACY_PROGRESS_KEY: &str = "assessmentProgress";

pub fn record_key(section: &SectionName, user: &UserId) -> String {
    format!("report_{section}_{user}")
}

pub fn unified_key(user: &UserId) -> String {
    format!("{UNIFIED_KEY_PREFIX}{user}")
}

/// Parallel copy written on every successful migration for disaster
/// recovery.
pub fn unified_backup_key(user: &UserId) -> String {
    format!("{UNIFIED_BACKUP_KEY_PREFIX}{user}")
}

/// Where a legacy component payload came from. `save_<component>` entries
/// overwrite `report_<component>_*` entries for the same component during
/// migration (last classification wins, not a merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComponentSource {
    ReportRecord,
    DirectSave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyKey {
    Component {
        name: String,
        source: ComponentSource,
    },
    ReportData,
    AddressData,
    AssessmentProgress,
}

/// Classifies a stored key against the historical key shapes.
///
/// The engine's own keys (unified record, backup, registry index) are never
/// classified as legacy.
pub fn classify_legacy(key: &str, user: &UserId) -> Option<LegacyKey> {
    match key {
        LEGACY_REPORT_DATA_KEY => return Some(LegacyKey::ReportData),
        LEGACY_ADDRESS_KEY => return Some(LegacyKey::AddressData),
        LEGACY_PROGRESS_KEY => return Some(LegacyKey::AssessmentProgress),
        REGISTRY_KEY => return None,
        _ => {}
    }

    if key.starts_with(UNIFIED_KEY_PREFIX) {
        return None;
    }

    if let Some(rest) = key.strip_prefix(LEGACY_REPORT_PREFIX) {
        let name = strip_identity_suffix(rest, user);
        if name.is_empty() {
            return None;
        }
        return Some(LegacyKey::Component {
            name: name.to_owned(),
            source: ComponentSource::ReportRecord,
        });
    }

    if let Some(rest) = key.strip_prefix(LEGACY_SAVE_PREFIX) {
        if rest.is_empty() {
            return None;
        }
        return Some(LegacyKey::Component {
            name: rest.to_owned(),
            source: ComponentSource::DirectSave,
        });
    }

    None
}

/// Drops a trailing `_<user>` or `_demo_user` identity segment from a
/// `report_*` key remainder. Remainders without a recognizable suffix are
/// kept whole, since historical writers did not always append one.
fn strip_identity_suffix<'a>(rest: &'a str, user: &UserId) -> &'a str {
    let demo_suffix = format!("_{DEMO_USER_ID}");
    if let Some(component) = rest.strip_suffix(&demo_suffix) {
        return component;
    }

    let user_suffix = format!("_{}", user.as_str());
    if let Some(component) = rest.strip_suffix(&user_suffix) {
        return component;
    }

    rest
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        classify_legacy, record_key, unified_backup_key, unified_key, ComponentSource, LegacyKey,
        REGISTRY_KEY,
    };
    use crate::model::{SectionName, UserId};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn keys_are_deterministic() {
        let section = SectionName::new("propertyDetails").unwrap();
        let u = user("u_1042");
        assert_eq!(record_key(&section, &u), "report_propertyDetails_u_1042");
        assert_eq!(unified_key(&u), "unified_property_data_u_1042");
        assert_eq!(
            unified_backup_key(&u),
            "unified_property_data_backup_u_1042"
        );
    }

    #[rstest]
    #[case("reportData", LegacyKey::ReportData)]
    #[case("propertyAddressData", LegacyKey::AddressData)]
    #[case("assessmentProgress", LegacyKey::AssessmentProgress)]
    fn literal_keys_classify(#[case] key: &str, #[case] expected: LegacyKey) {
        assert_eq!(classify_legacy(key, &user("u_1")), Some(expected));
    }

    #[rstest]
    #[case("report_esgAssessment_u_1", "esgAssessment")]
    #[case("report_esgAssessment_demo_user", "esgAssessment")]
    #[case("report_esgAssessment", "esgAssessment")]
    fn report_keys_strip_identity_suffix(#[case] key: &str, #[case] component: &str) {
        assert_eq!(
            classify_legacy(key, &user("u_1")),
            Some(LegacyKey::Component {
                name: component.to_owned(),
                source: ComponentSource::ReportRecord,
            })
        );
    }

    #[test]
    fn save_keys_classify_as_direct_save() {
        assert_eq!(
            classify_legacy("save_sustainability", &user("u_1")),
            Some(LegacyKey::Component {
                name: "sustainability".to_owned(),
                source: ComponentSource::DirectSave,
            })
        );
    }

    #[rstest]
    #[case("unified_property_data_u_1")]
    #[case("unified_property_data_backup_u_1")]
    #[case(REGISTRY_KEY)]
    #[case("report_")]
    #[case("save_")]
    #[case("unrelated_key")]
    fn own_and_unknown_keys_are_ignored(#[case] key: &str) {
        assert_eq!(classify_legacy(key, &user("u_1")), None);
    }
}
