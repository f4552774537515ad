// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Completeness evaluation over in-memory section data.
//!
//! Pure functions, no storage dependency. Sections declare their schema as a
//! [`SectionCheck`]; the evaluator resolves each field to a [`FieldStatus`]
//! and folds section scores into one 0..=100 readiness number.
//!
//! Per-section scoring is deliberately uneven: regular sections pass or fail
//! as a whole (100 or 0), while custom sections always score 100 once
//! included. Both behaviors are long-observed by downstream dashboards.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::model::{FieldStatus, SectionData};

const STATUS_MARKER_FIELD: &str = "status";
const STATUS_NOT_SUPPLIED: &str = "not_supplied";
const STATUS_INVESTIGATION_REQUIRED: &str = "investigation_required";

/// Declarative schema for one section's completeness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCheck {
    pub name: String,
    /// Administratively excluded sections (`included == false`) are omitted
    /// from the aggregate entirely, not scored as 0 or 100.
    pub included: bool,
    /// Custom sections score 100 once included, regardless of field state.
    pub custom: bool,
    pub required_fields: Vec<String>,
    pub excluded_fields: BTreeSet<String>,
}

impl SectionCheck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            included: true,
            custom: false,
            required_fields: Vec::new(),
            excluded_fields: BTreeSet::new(),
        }
    }

    pub fn required_fields<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn excluded_fields<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.excluded_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn custom(mut self) -> Self {
        self.custom = true;
        self
    }

    pub fn not_included(mut self) -> Self {
        self.included = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReadiness {
    pub name: String,
    pub completeness: u8,
    /// Whether the section counts toward the overall score.
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Truncated arithmetic mean over included sections; 0 when none are
    /// included.
    pub overall: u8,
    pub sections: Vec<SectionReadiness>,
}

/// Resolves one field of a section to its four-state status.
pub fn field_status(check: &SectionCheck, field: &str, value: Option<&Value>) -> FieldStatus {
    if check.excluded_fields.contains(field) {
        return FieldStatus::NotApplicable;
    }

    let Some(value) = value else {
        return FieldStatus::NotSupplied;
    };

    match status_marker(value) {
        Some(STATUS_NOT_SUPPLIED) => return FieldStatus::NotSupplied,
        Some(STATUS_INVESTIGATION_REQUIRED) => return FieldStatus::InvestigationRequired,
        _ => {}
    }

    if is_empty_value(value) {
        FieldStatus::NotSupplied
    } else {
        FieldStatus::Supplied
    }
}

/// Upstream writers mark a field unavailable or flagged for valuer
/// follow-up with a `{"status": "..."}` marker object in place of a value.
fn status_marker(value: &Value) -> Option<&str> {
    value
        .as_object()
        .and_then(|object| object.get(STATUS_MARKER_FIELD))
        .and_then(Value::as_str)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// 100 or 0. Custom sections pass unconditionally; regular sections pass
/// iff every required field resolves to `Supplied` or `NotApplicable`.
pub fn section_completeness(check: &SectionCheck, data: &SectionData) -> u8 {
    if check.custom {
        return 100;
    }

    let passes = check.required_fields.iter().all(|field| {
        matches!(
            field_status(check, field, data.get(field)),
            FieldStatus::Supplied | FieldStatus::NotApplicable
        )
    });

    if passes {
        100
    } else {
        0
    }
}

/// Evaluates all declared sections against the current per-section data.
///
/// Every declared section appears in the report; only included ones feed
/// the overall mean. Sections with no stored data are scored against an
/// empty payload.
pub fn evaluate(checks: &[SectionCheck], data: &BTreeMap<String, SectionData>) -> ReadinessReport {
    let empty = SectionData::new();
    let mut sections = Vec::with_capacity(checks.len());
    let mut total: u32 = 0;
    let mut counted: u32 = 0;

    for check in checks {
        let section_data = data.get(&check.name).unwrap_or(&empty);
        let completeness = if check.included {
            section_completeness(check, section_data)
        } else {
            0
        };

        if check.included {
            total += u32::from(completeness);
            counted += 1;
        }

        sections.push(SectionReadiness {
            name: check.name.clone(),
            completeness,
            required: check.included,
        });
    }

    let overall = if counted == 0 {
        0
    } else {
        (total / counted) as u8
    };

    ReadinessReport { overall, sections }
}
