//! Benchmarks for inverse Burrows-Wheeler Transform performance.
//!
//! These measure the permutation-building and walking cost in isolation,
//! independent of header parsing: `tt`/`ll16`+`ll4` construction only
//! cares about the byte values and their per-symbol counts, not whether
//! the bytes are a genuine BWT output, so synthetic data exercises the
//! same code paths a real block would.

use bz2_decoder::bwt::Bwt;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn text_like(size: usize) -> Vec<u8> {
    let words: &[&[u8]] = &[b"the", b"quick", b"brown", b"fox", b"jumps", b"lazy", b"dog"];
    let mut data = Vec::with_capacity(size);
    let mut seed = 42u32;
    while data.len() < size {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        data.extend_from_slice(words[(seed as usize) % words.len()]);
        data.push(b' ');
    }
    data.truncate(size);
    data
}

fn repetitive(size: usize) -> Vec<u8> {
    let pattern = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        data.extend_from_slice(pattern);
    }
    data.truncate(size);
    data
}

fn unzftab_of(bytes: &[u8]) -> [u32; 256] {
    let mut unzftab = [0u32; 256];
    for &b in bytes {
        unzftab[b as usize] += 1;
    }
    unzftab
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bwt_build");

    for (pattern_name, gen) in [("text", text_like as fn(usize) -> Vec<u8>), ("repetitive", repetitive)] {
        for (size_name, size) in [("10KB", 10 * 1024), ("64KB", 64 * 1024), ("256KB", 256 * 1024)] {
            let data = gen(size);
            let unzftab = unzftab_of(&data);
            let orig_ptr = (size / 2) as u32;

            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("fast/{pattern_name}"), size_name),
                &data,
                |b, data| {
                    b.iter(|| black_box(Bwt::build_fast(black_box(data), &unzftab, orig_ptr).unwrap()));
                },
            );
            group.bench_with_input(
                BenchmarkId::new(format!("small/{pattern_name}"), size_name),
                &data,
                |b, data| {
                    b.iter(|| black_box(Bwt::build_small(black_box(data), &unzftab, orig_ptr).unwrap()));
                },
            );
        }
    }

    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("bwt_walk");
    let size = 64 * 1024;
    let data = text_like(size);
    let unzftab = unzftab_of(&data);
    let orig_ptr = (size / 2) as u32;

    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("fast", |b| {
        b.iter(|| {
            let mut bwt = Bwt::build_fast(&data, &unzftab, orig_ptr).unwrap();
            for _ in 0..size {
                black_box(bwt.next_byte());
            }
        });
    });
    group.bench_function("small", |b| {
        b.iter(|| {
            let mut bwt = Bwt::build_small(&data, &unzftab, orig_ptr).unwrap();
            for _ in 0..size {
                black_box(bwt.next_byte());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_walk);
criterion_main!(benches);
