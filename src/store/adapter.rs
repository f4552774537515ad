// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Synchronous string-keyed, string-valued persistent medium.
///
/// `get`/`remove` degrade to "no data"/no-op on unexpected failures; only
/// `set` can fail (finite capacity, unavailable medium), and every caller is
/// expected to catch that and surface a non-fatal result.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str);
    fn list_keys(&self, prefix: Option<&str>) -> Vec<String>;
}

impl<S: PersistentStore + ?Sized> PersistentStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }

    fn list_keys(&self, prefix: Option<&str>) -> Vec<String> {
        (**self).list_keys(prefix)
    }
}

impl<S: PersistentStore + ?Sized> PersistentStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }

    fn list_keys(&self, prefix: Option<&str>) -> Vec<String> {
        (**self).list_keys(prefix)
    }
}

#[derive(Debug)]
pub enum StoreError {
    CapacityExceeded {
        key: String,
        size: usize,
        capacity: usize,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        key: String,
        source: serde_json::Error,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                key,
                size,
                capacity,
            } => write!(
                f,
                "store capacity exceeded writing {key:?}: {size} bytes against {capacity} available"
            ),
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { key, source } => write!(f, "json error at {key:?}: {source}"),
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::CapacityExceeded { .. } | Self::SymlinkRefused { .. } => None,
        }
    }
}

/// In-memory store with an optional byte budget, mirroring the finite quota
/// of the browser medium this layer fronts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total stored value bytes. Writes that would exceed the cap
    /// fail with [`StoreError::CapacityExceeded`].
    pub fn with_capacity_limit(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("memory store lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("memory store lock poisoned");

        if let Some(capacity) = self.capacity {
            let used: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if used + value.len() > capacity {
                return Err(StoreError::CapacityExceeded {
                    key: key.to_owned(),
                    size: value.len(),
                    capacity: capacity.saturating_sub(used),
                });
            }
        }

        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .expect("memory store lock poisoned")
            .remove(key);
    }

    fn list_keys(&self, prefix: Option<&str>) -> Vec<String> {
        self.entries
            .lock()
            .expect("memory store lock poisoned")
            .keys()
            .filter(|key| prefix.map_or(true, |p| key.starts_with(p)))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to
    /// stable storage where possible. Exact guarantees are
    /// platform/filesystem-dependent.
    Durable,
}

const VALUE_FILE_EXT: &str = "kv";

/// File-per-key store rooted at a single directory.
///
/// Values are written via temp-file + atomic rename. Key-to-filename encoding
/// is reversible and windows-safe; unreadable files are skipped on read.
#[derive(Debug, Clone)]
pub struct FolderStore {
    root: PathBuf,
    durability: WriteDurability,
    capacity: Option<usize>,
}

impl FolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
            capacity: None,
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn with_capacity_limit(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{VALUE_FILE_EXT}", encode_key_segment(key)))
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return 0;
        };

        let excluded = self.value_path(key);
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path != &excluded)
            .filter(|path| decode_value_file_name(path).is_some())
            .filter_map(|path| fs::metadata(path).ok())
            .map(|md| md.len() as usize)
            .sum()
    }
}

impl PersistentStore for FolderStore {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.value_path(key)) {
            Ok(value) => Some(value),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::debug!("unreadable store value for {key:?}: {err}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(capacity) = self.capacity {
            let used = self.used_bytes_excluding(key);
            if used + value.len() > capacity {
                return Err(StoreError::CapacityExceeded {
                    key: key.to_owned(),
                    size: value.len(),
                    capacity: capacity.saturating_sub(used),
                });
            }
        }

        write_atomic(&self.root, &self.value_path(key), value.as_bytes(), self.durability)
    }

    fn remove(&self, key: &str) {
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!("cannot remove store value for {key:?}: {err}");
            }
        }
    }

    fn list_keys(&self, prefix: Option<&str>) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut keys = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| decode_value_file_name(&entry.path()))
            .filter(|key| prefix.map_or(true, |p| key.starts_with(p)))
            .collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

fn decode_value_file_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(&format!(".{VALUE_FILE_EXT}"))?;
    decode_key_segment(stem)
}

fn encode_key_segment(key: &str) -> String {
    if !needs_windows_safe_filename_segment_encoding(key) {
        return key.to_owned();
    }

    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(1 + key.len().saturating_mul(2));
    out.push('~');
    for &b in key.as_bytes() {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

fn decode_key_segment(segment: &str) -> Option<String> {
    let Some(hex) = segment.strip_prefix('~') else {
        return Some(segment.to_owned());
    };

    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    let mut chars = hex.bytes();
    while let (Some(hi), Some(lo)) = (chars.next(), chars.next()) {
        let hi = (hi as char).to_digit(16)?;
        let lo = (lo as char).to_digit(16)?;
        bytes.push(((hi << 4) | lo) as u8);
    }

    String::from_utf8(bytes).ok()
}

fn needs_windows_safe_filename_segment_encoding(segment: &str) -> bool {
    if segment.is_empty() || segment.starts_with('~') {
        return true;
    }
    if segment == "." || segment == ".." {
        return true;
    }
    if segment.ends_with(' ') || segment.ends_with('.') {
        return true;
    }

    let trimmed = segment.trim_end_matches([' ', '.']);
    let base = trimmed.split('.').next().unwrap_or(trimmed);
    if is_windows_device_name(base) {
        return true;
    }

    for ch in segment.chars() {
        if matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
            return true;
        }
        if ch <= '\u{1f}' || ch == '\u{7f}' {
            return true;
        }
    }

    false
}

fn is_windows_device_name(base: &str) -> bool {
    let base = base.to_ascii_uppercase();
    match base.as_str() {
        "CON" | "PRN" | "AUX" | "NUL" => true,
        _ => {
            if let Some(num) = base.strip_prefix("COM") {
                matches!(num, "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9")
            } else if let Some(num) = base.strip_prefix("LPT") {
                matches!(num, "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9")
            } else {
                false
            }
        }
    }
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

fn write_atomic(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(|source| StoreError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = root.join(format!(
        ".valora.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    file.write_all(contents).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }
    drop(file);

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(root).map_err(|source| StoreError::Io {
                path: root.to_path_buf(),
                source,
            })?;
            dir.sync_all().map_err(|source| StoreError::Io {
                path: root.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
