// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Valora-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Valora and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use valora::model::{SectionData, SectionName, StaticIdentity};
use valora::section::ReportStore;
use valora::store::{FolderStore, MemoryStore};

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "valora_bench_{prefix}_{}_{unique}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).expect("create bench temp dir");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn payload(fields: usize) -> SectionData {
    let mut data = SectionData::new();
    for i in 0..fields {
        data.insert(
            format!("field_{i}"),
            format!("value for field {i}, long enough to be realistic").into(),
        );
    }
    data
}

fn report_store<S: valora::store::PersistentStore>(store: S) -> ReportStore<S> {
    ReportStore::new(
        store,
        Arc::new(StaticIdentity::authenticated("bench_user").expect("bench identity")),
    )
}

// Benchmark identity (keep stable):
// - Group name in this file: `persistence.section`
// - Case IDs (the string after the `/`) must remain stable across refactors so
//   results stay comparable over time (e.g. `write_memory_small`, `write_folder_large`).
// - If implementations move/deduplicate, update the wiring but do not rename
//   group or case IDs.
fn benches_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence.section");
    let section = SectionName::new("propertyDetails").expect("section name");

    for (label, fields) in [("small", 8), ("large", 256)] {
        let data = payload(fields);

        let write_data = data.clone();
        let write_section = section.clone();
        group.bench_function(format!("write_memory_{label}"), move |b| {
            b.iter_batched_ref(
                || report_store(MemoryStore::new()),
                |store| {
                    black_box(
                        store
                            .write_section(black_box(&write_section), write_data.clone())
                            .expect("write_section"),
                    )
                    .saved_at
                },
                BatchSize::SmallInput,
            )
        });

        let folder_data = data.clone();
        let folder_section = section.clone();
        let folder_label = label;
        group.bench_function(format!("write_folder_{label}"), move |b| {
            b.iter_batched_ref(
                || {
                    let tmp = TempDir::new(&format!("write_folder_{folder_label}"));
                    let store = report_store(FolderStore::new(tmp.path()));
                    (tmp, store)
                },
                |(_tmp, store)| {
                    black_box(
                        store
                            .write_section(black_box(&folder_section), folder_data.clone())
                            .expect("write_section"),
                    )
                    .saved_at
                },
                BatchSize::SmallInput,
            )
        });

        let read_data = data.clone();
        let read_section = section.clone();
        group.bench_function(format!("read_memory_{label}"), move |b| {
            let store = report_store(MemoryStore::new());
            store
                .write_section(&read_section, read_data.clone())
                .expect("write_section");
            b.iter(|| black_box(store.read_section(black_box(&read_section))).is_some())
        });
    }

    group.finish();
}

criterion_group!(benches, benches_persistence);
criterion_main!(benches);
