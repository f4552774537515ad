// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistent key-value medium: the store adapter, the key scheme, and the
//! JSON layer above raw string values.

pub mod adapter;
pub mod keys;

pub use adapter::{FolderStore, MemoryStore, PersistentStore, StoreError, WriteDurability};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Reads and decodes a JSON value. A decode failure is treated as "no data",
/// not as an error, so downstream readers stay resilient to
/// partially-corrupt records.
pub fn read_json<T: DeserializeOwned>(store: &dyn PersistentStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!("discarding undecodable record at {key:?}: {err}");
            None
        }
    }
}

pub fn write_json<T: Serialize>(
    store: &dyn PersistentStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let serialized = serde_json::to_string(value).map_err(|source| StoreError::Json {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, &serialized)
}
