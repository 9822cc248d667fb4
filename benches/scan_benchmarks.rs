use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fdups::duplicates::{DuplicateFinder, Finder, FinderConfig, FinderKind};
use fdups::scanner::{AcceptAll, ContentHasher, Hasher, Walker};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

// Helper to create a test directory with a specific structure
fn setup_test_dir(depth: usize, files_per_dir: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    create_dir_recursive(temp_dir.path().to_path_buf(), depth, files_per_dir);
    temp_dir
}

fn create_dir_recursive(path: PathBuf, depth: usize, files_per_dir: usize) {
    if depth == 0 {
        return;
    }

    if !path.exists() {
        fs::create_dir_all(&path).expect("Failed to create dir");
    }

    for i in 0..files_per_dir {
        let file_path = path.join(format!("file_{}.txt", i));
        // Every third file shares content with its siblings.
        let content = if i % 3 == 0 {
            "shared content".to_string()
        } else {
            format!("{} {}", path.display(), i)
        };
        fs::write(file_path, content).expect("Failed to write file");
    }

    if depth > 1 {
        for i in 0..2 {
            let sub_dir = path.join(format!("dir_{}", i));
            create_dir_recursive(sub_dir, depth - 1, files_per_dir);
        }
    }
}

fn bench_walker(c: &mut Criterion) {
    let temp_dir = setup_test_dir(4, 10); // roughly 150 files

    c.bench_function("walker_150_files", |b| {
        b.iter(|| {
            let walker = Walker::new(temp_dir.path(), Arc::new(AcceptAll));
            let files: Vec<_> = walker.walk().collect();
            black_box(files);
        })
    });
}

fn bench_hasher(c: &mut Criterion) {
    let mut group = c.benchmark_group("hasher");

    for size_kb in [1, 1024, 10240] {
        let data = vec![b'a'; size_kb * 1024];
        group.bench_with_input(format!("sha256_{}KB", size_kb), &data, |b, data| {
            b.iter(|| {
                let digest = ContentHasher.hash(&mut data.as_slice()).unwrap();
                black_box(digest);
            });
        });
    }
    group.finish();
}

fn bench_scan_workers(c: &mut Criterion) {
    let temp_dir = setup_test_dir(4, 10);
    let mut group = c.benchmark_group("scan");

    for workers in [1, 4, 8] {
        let finder = DuplicateFinder::for_kind(
            FinderKind::Default,
            temp_dir.path(),
            FinderConfig::default().with_workers(workers),
        );
        group.bench_with_input(BenchmarkId::new("workers", workers), &finder, |b, finder| {
            b.iter(|| black_box(finder.find().unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_walker, bench_hasher, bench_scan_workers);
criterion_main!(benches);
