// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use super::ids::UserId;

/// Sentinel user id used whenever no authenticated session exists.
pub const DEMO_USER_ID: &str = "demo_user";

/// The actor identity captured at the time of a persistence operation.
///
/// Identity is snapshotted per write: records written before an auth change
/// keep the identity that was active when they were written. Nothing re-tags
/// them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub is_demo: bool,
}

impl Identity {
    pub fn demo() -> Self {
        Self {
            user_id: UserId::new(DEMO_USER_ID).expect("hard-coded demo user id is valid"),
            is_demo: true,
        }
    }

    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id,
            is_demo: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    Unavailable { reason: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "identity provider unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for IdentityError {}

/// Boundary to the authentication provider.
///
/// Implementations may fail; callers go through [`resolve_or_demo`], which
/// never does.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self) -> Result<Identity, IdentityError>;
}

/// Resolves the current identity, falling back to the demo identity on any
/// provider failure. Called at the start of every persistence operation and
/// never cached across calls, so an auth change mid-session is reflected on
/// the next write.
pub fn resolve_or_demo(provider: &dyn IdentityProvider) -> Identity {
    match provider.resolve() {
        Ok(identity) => identity,
        Err(err) => {
            tracing::debug!("identity resolution failed, using demo identity: {err}");
            Identity::demo()
        }
    }
}

/// Fixed-identity provider for wiring and tests.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    identity: Identity,
}

impl StaticIdentity {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn authenticated(user_id: &str) -> Result<Self, super::ids::IdError> {
        Ok(Self::new(Identity::authenticated(UserId::new(user_id)?)))
    }
}

impl IdentityProvider for StaticIdentity {
    fn resolve(&self) -> Result<Identity, IdentityError> {
        Ok(self.identity.clone())
    }
}

/// Provider for the unauthenticated/demo mode.
#[derive(Debug, Clone, Default)]
pub struct DemoIdentity;

impl IdentityProvider for DemoIdentity {
    fn resolve(&self) -> Result<Identity, IdentityError> {
        Ok(Identity::demo())
    }
}
