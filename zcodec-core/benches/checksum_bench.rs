//! Throughput benchmarks for the stream checksums.
//!
//! Covers CRC-32 (slicing-by-8 above 16 bytes, table walk below) and
//! Adler-32 across sizes and data patterns, plus chunked vs one-shot
//! updates as the engines call them.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use zcodec_core::adler32::adler32;
use zcodec_core::crc::crc32;

type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0xAA; size]
    }

    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"The quick brown fox jumps over the lazy dog. ";
        text.iter().copied().cycle().take(size).collect()
    }
}

const SIZES: [(&str, usize); 5] = [
    ("16B", 16),
    ("256B", 256),
    ("4KB", 4 * 1024),
    ("64KB", 64 * 1024),
    ("1MB", 1024 * 1024),
];

fn bench_crc32_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_sizes");

    for (size_name, size) in SIZES {
        let data = test_data::text_like(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_name), &data, |b, data| {
            b.iter(|| black_box(crc32(0, black_box(data))));
        });
    }

    group.finish();
}

fn bench_adler32_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("adler32_sizes");

    for (size_name, size) in SIZES {
        let data = test_data::text_like(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_name), &data, |b, data| {
            b.iter(|| black_box(adler32(1, black_box(data))));
        });
    }

    group.finish();
}

fn bench_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_patterns");
    let size = 64 * 1024;

    let patterns: [(&str, PatternGenerator); 3] = [
        ("uniform", test_data::uniform),
        ("random", test_data::random),
        ("text", test_data::text_like),
    ];

    for (name, generator) in patterns {
        let data = generator(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("crc32", name), &data, |b, data| {
            b.iter(|| black_box(crc32(0, black_box(data))));
        });
        group.bench_with_input(BenchmarkId::new("adler32", name), &data, |b, data| {
            b.iter(|| black_box(adler32(1, black_box(data))));
        });
    }

    group.finish();
}

/// Engines update checksums once per output chunk; compare chunk sizes.
fn bench_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_chunked");
    let size = 1024 * 1024;
    let data = test_data::random(size);

    for chunk in [64usize, 1024, 16 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("crc32", chunk), &data, |b, data| {
            b.iter(|| {
                let crc = data.chunks(chunk).fold(0, |crc, c| crc32(crc, c));
                black_box(crc)
            });
        });
        group.bench_with_input(BenchmarkId::new("adler32", chunk), &data, |b, data| {
            b.iter(|| {
                let adler = data.chunks(chunk).fold(1, |a, c| adler32(a, c));
                black_box(adler)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_crc32_sizes,
    bench_adler32_sizes,
    bench_patterns,
    bench_chunked
);
criterion_main!(benches);
