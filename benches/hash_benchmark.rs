//! Performance benchmarks for HashCalc
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hashcalc::config::{CalculatorConfig, HashAlgorithm, RecalcMode};
use hashcalc::core::{Calculator, ThreadedCalculator};
use hashcalc::fs::LocalFile;
use hashcalc::hash::{calc, calc_bytes, multiple_file_hash};
use std::fs::File;
use std::io::{Cursor, Write};
use tempfile::TempDir;

/// Create a test file of the specified size
fn create_test_file(dir: &std::path::Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();

    let chunk_size = 64 * 1024;
    let chunk: Vec<u8> = (0..chunk_size).map(|i| (i % 256) as u8).collect();
    let mut remaining = size;

    while remaining > 0 {
        let to_write = remaining.min(chunk_size);
        file.write_all(&chunk[..to_write]).unwrap();
        remaining -= to_write;
    }

    path
}

fn bench_hash_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_algorithms");
    let data: Vec<u8> = (0..1024 * 1024).map(|i| (i % 256) as u8).collect();

    group.throughput(Throughput::Bytes(data.len() as u64));
    for algorithm in HashAlgorithm::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(algorithm), &data, |b, data| {
            b.iter(|| black_box(calc_bytes(data, &[algorithm], None)));
        });
    }

    group.finish();
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_size");
    let data: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 256) as u8).collect();

    group.throughput(Throughput::Bytes(data.len() as u64));
    for chunk_size in [4 * 1024, 16 * 1024, 64 * 1024, 1024 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(humansize::format_size(chunk_size as u64, humansize::BINARY)),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    black_box(calc(Cursor::new(&data), &[HashAlgorithm::Sha256], chunk_size, None))
                });
            },
        );
    }

    group.finish();
}

fn bench_single_pass_vs_separate(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let file = LocalFile::new(create_test_file(dir.path(), "data.bin", 8 * 1024 * 1024));
    let algorithms = [HashAlgorithm::Sha256, HashAlgorithm::Md5, HashAlgorithm::Sha1];

    let mut group = c.benchmark_group("multi_algorithm");
    group.throughput(Throughput::Bytes(8 * 1024 * 1024));

    group.bench_function("single_pass", |b| {
        b.iter(|| black_box(multiple_file_hash(&file, &algorithms, 64 * 1024, 64 * 1024, None)));
    });

    group.bench_function("separate_passes", |b| {
        b.iter(|| {
            for algorithm in algorithms {
                let _ = black_box(multiple_file_hash(&file, &[algorithm], 64 * 1024, 64 * 1024, None));
            }
        });
    });

    group.finish();
}

fn bench_calculators(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let files: Vec<LocalFile> = (0..64)
        .map(|i| LocalFile::new(create_test_file(dir.path(), &format!("file_{}.bin", i), 256 * 1024)))
        .collect();
    let config = CalculatorConfig {
        recalc_mode: RecalcMode::Always,
        threads: 4,
        ..Default::default()
    };

    let mut group = c.benchmark_group("calculator_64_files");
    group.throughput(Throughput::Bytes(64 * 256 * 1024));

    group.bench_function("sequential", |b| {
        let calculator = Calculator::new(config.clone());
        b.iter(|| {
            for file in &files {
                let _ = black_box(calculator.get(file, None));
            }
        });
    });

    group.bench_function("rayon_batch", |b| {
        let calculator = Calculator::new(config.clone());
        b.iter(|| black_box(calculator.get_many(&files, &[HashAlgorithm::Sha256])));
    });

    group.bench_function("threaded", |b| {
        let calculator = ThreadedCalculator::new(config.clone()).unwrap();
        b.iter(|| {
            let futures = calculator
                .threaded_get_many(files.clone(), &[HashAlgorithm::Sha256])
                .unwrap();
            black_box(ThreadedCalculator::wait_all(futures))
        });
    });

    group.bench_function("cached", |b| {
        let calculator = Calculator::new(CalculatorConfig {
            recalc_mode: RecalcMode::TimeTag,
            ..config.clone()
        });
        b.iter(|| {
            for file in &files {
                let _ = black_box(calculator.get(file, None));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_hash_algorithms,
    bench_chunk_sizes,
    bench_single_pass_vs_separate,
    bench_calculators
);

criterion_main!(benches);
