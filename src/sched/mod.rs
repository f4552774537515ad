// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Write scheduling over the section store.
//!
//! Three disciplines: immediate manual save (guarded against concurrent
//! re-entry), debounced autosave (coalesces bursts, last payload wins), and
//! threshold autosave (fires every Nth completed step). Debounced writes are
//! silent; manual and threshold saves surface a confirmation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::model::record::AssessmentProgressJson;
use crate::model::{AssessmentProgress, SaveRecord, SectionData, SectionName};
use crate::notify::NoticeKind;
use crate::section::{ReportStore, SectionError};
use crate::store::PersistentStore;

/// Section name the threshold autosave writes its progress snapshots under.
pub const PROGRESS_SECTION: &str = "assessmentProgress";

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(2_000);
pub const DEFAULT_SAVE_THRESHOLD: u32 = 5;

#[derive(Debug)]
pub enum SaveError {
    /// A manual save was requested while another one is still pending.
    InProgress,
    Section(SectionError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => f.write_str("save already in progress"),
            Self::Section(source) => source.fmt(f),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InProgress => None,
            Self::Section(source) => Some(source),
        }
    }
}

/// Immediate save with an in-flight guard.
///
/// The guard is scoped to this instance (effectively per section form), not
/// global: two `ManualSaver`s never exclude each other.
pub struct ManualSaver<S> {
    store: Arc<ReportStore<S>>,
    in_flight: AtomicBool,
}

impl<S: PersistentStore> ManualSaver<S> {
    pub fn new(store: Arc<ReportStore<S>>) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn save(&self, section: &SectionName, data: SectionData) -> Result<SaveRecord, SaveError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(SaveError::InProgress);
        }

        let result = self.store.write_section(section, data);
        self.in_flight.store(false, Ordering::Release);

        match result {
            Ok(record) => {
                self.store.notifier().notify(
                    NoticeKind::Success,
                    "Report saved",
                    &format!("Saved section {section}"),
                );
                Ok(record)
            }
            Err(err) => {
                self.store
                    .notifier()
                    .notify(NoticeKind::Error, "Save failed", &err.to_string());
                Err(SaveError::Section(err))
            }
        }
    }
}

#[derive(Debug)]
struct PendingSave {
    section: SectionName,
    data: SectionData,
    serialized: String,
    deadline: Instant,
}

#[derive(Debug, Default)]
struct AutosaveState {
    pending: BTreeMap<String, PendingSave>,
    last_written: BTreeMap<String, String>,
    in_flight: bool,
    shutdown: bool,
}

#[derive(Debug)]
struct AutosaveShared {
    state: Mutex<AutosaveState>,
    cv: Condvar,
}

/// Delay-based autosave: every call (re)arms a per-section deadline, and only
/// the last payload within a quiet window is written.
///
/// Payloads byte-identical to the last successfully written one for the same
/// section do not even arm a timer, so no-op re-renders cost nothing. All
/// pending deadlines are canceled on drop; no write happens after teardown.
pub struct Autosaver<S: PersistentStore + 'static> {
    shared: Arc<AutosaveShared>,
    store: Arc<ReportStore<S>>,
    delay: Duration,
    worker: Option<JoinHandle<()>>,
}

impl<S: PersistentStore + 'static> Autosaver<S> {
    pub fn new(store: Arc<ReportStore<S>>, delay: Duration) -> Self {
        let shared = Arc::new(AutosaveShared {
            state: Mutex::new(AutosaveState::default()),
            cv: Condvar::new(),
        });

        let worker = std::thread::Builder::new()
            .name("valora-autosave".to_owned())
            .spawn({
                let shared = shared.clone();
                let store = store.clone();
                move || Self::run_worker(shared, store)
            })
            .expect("spawn autosave worker thread");

        Self {
            shared,
            store,
            delay,
            worker: Some(worker),
        }
    }

    pub fn store(&self) -> &Arc<ReportStore<S>> {
        &self.store
    }

    /// Arms (or re-arms) the debounce window for a section. Returns false
    /// when nothing was scheduled: the payload matches the last written one,
    /// or an identical payload is already waiting on its deadline.
    pub fn schedule(&self, section: &SectionName, data: SectionData) -> bool {
        let serialized = match serde_json::to_string(&data) {
            Ok(serialized) => serialized,
            Err(err) => {
                tracing::warn!("cannot serialize autosave payload for {section}: {err}");
                return false;
            }
        };

        let mut state = self.shared.state.lock().expect("autosave lock poisoned");
        if state.shutdown {
            return false;
        }
        if state.last_written.get(section.as_str()) == Some(&serialized) {
            return false;
        }
        // An identical payload already waiting keeps its deadline; re-arming
        // here would let a stream of no-op re-renders postpone the save
        // indefinitely.
        if let Some(pending) = state.pending.get(section.as_str()) {
            if pending.serialized == serialized {
                return false;
            }
        }

        state.pending.insert(
            section.to_string(),
            PendingSave {
                section: section.clone(),
                data,
                serialized,
                deadline: Instant::now() + self.delay,
            },
        );
        self.shared.cv.notify_all();
        true
    }

    /// Cancels any pending write for a section.
    pub fn cancel(&self, section: &SectionName) {
        let mut state = self.shared.state.lock().expect("autosave lock poisoned");
        state.pending.remove(section.as_str());
        self.shared.cv.notify_all();
    }

    pub fn cancel_all(&self) {
        let mut state = self.shared.state.lock().expect("autosave lock poisoned");
        state.pending.clear();
        self.shared.cv.notify_all();
    }

    /// Blocks until no pending or in-flight write remains, or the timeout
    /// elapses. Returns true when idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock().expect("autosave lock poisoned");
        while !state.pending.is_empty() || state.in_flight {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .shared
                .cv
                .wait_timeout(state, deadline - now)
                .expect("autosave cv poisoned");
            state = next;
        }
        true
    }

    fn run_worker(shared: Arc<AutosaveShared>, store: Arc<ReportStore<S>>) {
        let mut state = shared.state.lock().expect("autosave lock poisoned");
        loop {
            if state.shutdown {
                return;
            }

            let now = Instant::now();
            let due_key = state
                .pending
                .iter()
                .filter(|(_, pending)| pending.deadline <= now)
                .min_by_key(|(_, pending)| pending.deadline)
                .map(|(key, _)| key.clone());

            if let Some(key) = due_key {
                let Some(pending) = state.pending.remove(&key) else {
                    continue;
                };
                state.in_flight = true;
                drop(state);

                // Silent by design: debounced saves never notify.
                let written = match store.write_section(&pending.section, pending.data) {
                    Ok(_) => true,
                    Err(err) => {
                        tracing::warn!("autosave failed for {}: {err}", pending.section);
                        false
                    }
                };

                state = shared.state.lock().expect("autosave lock poisoned");
                state.in_flight = false;
                if written {
                    state.last_written.insert(key, pending.serialized);
                }
                shared.cv.notify_all();
                continue;
            }

            let next_deadline = state.pending.values().map(|pending| pending.deadline).min();
            state = match next_deadline {
                Some(deadline) => {
                    let timeout = deadline.saturating_duration_since(now);
                    shared
                        .cv
                        .wait_timeout(state, timeout)
                        .expect("autosave cv poisoned")
                        .0
                }
                None => shared.cv.wait(state).expect("autosave cv poisoned"),
            };
        }
    }
}

impl<S: PersistentStore + 'static> Drop for Autosaver<S> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().expect("autosave lock poisoned");
            state.pending.clear();
            state.shutdown = true;
            self.shared.cv.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// True when a completed step should trigger a threshold autosave. Total
/// over the full step range; the step count wraps rather than overflowing.
pub fn is_due(step: u32, every: u32) -> bool {
    every != 0 && step.wrapping_add(1) % every == 0
}

/// Step-count autosave: a pure function of the step counter, no timers and
/// no cancellation. Packages a progress snapshot rather than raw form data.
pub struct ThresholdAutosave<S> {
    store: Arc<ReportStore<S>>,
    every: u32,
}

impl<S: PersistentStore> ThresholdAutosave<S> {
    pub fn new(store: Arc<ReportStore<S>>) -> Self {
        Self {
            store,
            every: DEFAULT_SAVE_THRESHOLD,
        }
    }

    pub fn with_every(mut self, every: u32) -> Self {
        self.every = every;
        self
    }

    /// Records a completed step; writes a progress snapshot iff the counter
    /// crossed the threshold.
    pub fn record_step(
        &self,
        progress: &AssessmentProgress,
    ) -> Result<Option<SaveRecord>, SectionError> {
        if !is_due(progress.current_step, self.every) {
            return Ok(None);
        }

        let snapshot = serde_json::to_value(AssessmentProgressJson::from(progress))
            .ok()
            .and_then(|value| match value {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();

        let section = SectionName::new(PROGRESS_SECTION)
            .expect("hard-coded progress section name is valid");
        let record = self.store.write_section(&section, snapshot)?;

        self.store.notifier().notify(
            NoticeKind::Success,
            "Progress saved",
            &format!("Saved progress at step {}", progress.current_step + 1),
        );
        Ok(Some(record))
    }
}
