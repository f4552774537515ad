// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: typed ids, actor identity, persisted record shapes.

pub mod identity;
pub mod ids;
pub mod record;

pub use identity::{
    resolve_or_demo, DemoIdentity, Identity, IdentityError, IdentityProvider, StaticIdentity,
    DEMO_USER_ID,
};
pub use ids::{Id, IdError, SectionName, UserId};
pub use record::{
    AddressData, AssessmentProgress, FieldStatus, RecordError, RegistryEntry, RegistryStatus,
    SaveRecord, SectionData, UnifiedPropertyData, REGISTRY_ENTRY_TYPE,
};
