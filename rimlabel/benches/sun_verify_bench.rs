// SPDX-License-Identifier: MIT
// cargo bench -p rimlabel
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rimlabel::prelude::*;
use rimlabel::sun::{
    analyze_extents,
    layout::{SUN_NUM_PARTITIONS, checksum_is_valid, compute_checksum, ByteOrder},
};

criterion_group!(benches, bench_checksum, bench_analyze, bench_create_verify);
criterion_main!(benches);

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("sun_checksum");
    let mut sector = [0u8; 512];
    for (i, b) in sector.iter_mut().enumerate() {
        *b = (i * 7) as u8;
    }
    for order in [ByteOrder::Big, ByteOrder::Little] {
        group.bench_with_input(BenchmarkId::new("compute", format!("{order:?}")), &order, |b, &o| {
            b.iter(|| compute_checksum(black_box(&sector), o))
        });
        group.bench_with_input(BenchmarkId::new("validate", format!("{order:?}")), &order, |b, &o| {
            b.iter(|| checksum_is_valid(black_box(&sector), o))
        });
    }
    group.finish();
}

/// Extents packed back to back in reverse slot order, the worst case for merging.
fn reversed_extents(cs: u64) -> ([u64; SUN_NUM_PARTITIONS], [u64; SUN_NUM_PARTITIONS]) {
    let mut starts = [0u64; SUN_NUM_PARTITIONS];
    let mut lens = [0u64; SUN_NUM_PARTITIONS];
    for i in 0..SUN_NUM_PARTITIONS {
        starts[i] = (SUN_NUM_PARTITIONS - 1 - i) as u64 * 100 * cs;
        lens[i] = 100 * cs;
    }
    (starts, lens)
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("sun_analyze");
    for &cs in &[36u64, 1008, 16065] {
        let (starts, lens) = reversed_extents(cs);
        let total = SUN_NUM_PARTITIONS as u64 * 100 * cs;
        group.bench_with_input(BenchmarkId::new("reversed", cs), &cs, |b, &cs| {
            b.iter(|| analyze_extents(black_box(&starts), black_box(&lens), cs, total))
        });
    }
    group.finish();
}

fn bench_create_verify(c: &mut Criterion) {
    let topo = Topology::new()
        .with_geometry(Geometry::new(255, 63, 0))
        .with_total_sectors(255 * 63 * 4000);
    c.bench_function("sun_create_verify", |b| {
        b.iter(|| {
            let disk = Disk::from_sector("bench.img", 512, &[]).unwrap().with_topology(topo);
            let mut cxt = Context::new(disk);
            cxt.create_label(Box::new(SunLabel::new())).unwrap();
            black_box(cxt.verify().unwrap())
        })
    });
}
