//! Performance benchmarks for folder hierarchy algorithms
//!
//! Run with: `cargo bench -p foldspace-core`
//!
//! These benchmarks measure the in-memory work done on every request:
//! - Tree assembly from the flat folder list (`get_tree`)
//! - Descendant collection (move validation, cascading delete)
//! - Full cascading delete through the libsql store

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use foldspace_core::db::{DatabaseService, TursoStore};
use foldspace_core::models::{Folder, NoteKind};
use foldspace_core::services::{build_folder_tree, compute_descendant_ids, FolderService};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Generate `count` folders where every folder has up to `fan_out` children
fn generate_folders(count: i64, fan_out: i64) -> Vec<Folder> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    (1..=count)
        .map(|id| Folder {
            id,
            owner_id: 1,
            name: format!("Folder {}", id),
            parent_id: if id == 1 { None } else { Some((id - 2) / fan_out + 1) },
            is_deleted: false,
            created_at: base + Duration::seconds(id),
        })
        .collect()
}

fn bench_tree_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_folder_tree");

    for count in [100, 1_000, 10_000] {
        let folders = generate_folders(count, 8);
        group.bench_function(format!("{}_folders", count), |b| {
            b.iter(|| build_folder_tree(black_box(&folders)))
        });
    }

    // Single deep chain
    let chain = generate_folders(1_000, 1);
    group.bench_function("1000_deep_chain", |b| {
        b.iter(|| build_folder_tree(black_box(&chain)))
    });

    group.finish();
}

fn bench_descendants(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_descendant_ids");

    let folders = generate_folders(10_000, 8);
    group.bench_function("root_of_10000", |b| {
        b.iter(|| compute_descendant_ids(black_box(1), black_box(&folders)))
    });
    group.bench_function("leaf_of_10000", |b| {
        b.iter(|| compute_descendant_ids(black_box(10_000), black_box(&folders)))
    });

    group.finish();
}

/// Cascading delete of a 100-folder subtree, including setup per iteration
fn bench_cascading_delete(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cascading_delete");
    group.sample_size(10); // Fewer samples for expensive operations

    group.bench_function("subtree_100_folders", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let mut total = std::time::Duration::ZERO;

                for _ in 0..iters {
                    let temp_dir = TempDir::new().unwrap();
                    let db = Arc::new(
                        DatabaseService::new(temp_dir.path().join("bench.db"))
                            .await
                            .unwrap(),
                    );
                    let service =
                        FolderService::new(Arc::new(TursoStore::<NoteKind>::new(db)));

                    let root = service.create(1, "Root", None).await.unwrap();
                    let mut parents = vec![root.id];
                    for i in 0..99 {
                        let parent = parents[i / 4];
                        let child = service
                            .create(1, &format!("Child {}", i), Some(parent))
                            .await
                            .unwrap();
                        parents.push(child.id);
                    }

                    let start = std::time::Instant::now();
                    black_box(service.delete(root.id, 1).await.unwrap());
                    total += start.elapsed();
                }

                total
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_tree_building,
    bench_descendants,
    bench_cascading_delete
);
criterion_main!(benches);
