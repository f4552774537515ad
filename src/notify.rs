// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Boundary to the host application's toast/notification UI.
//!
//! Fire-and-forget: implementations must not block and must not panic.
//! Manual saves and threshold autosaves notify; debounced autosaves are
//! silent so bursts of edits do not spam the user.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, title: &str, message: &str);
}

/// Default notifier: drops every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _kind: NoticeKind, _title: &str, _message: &str) {}
}
