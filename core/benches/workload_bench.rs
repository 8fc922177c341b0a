use criterion::{Criterion, criterion_group, criterion_main};
use procbench_core::workload::{cpu_bound, io_bound};
use std::hint::black_box;
use std::path::Path;

fn bench_cpu_unit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_unit");
    for cycles in [1_000u64, 100_000] {
        group.bench_function(format!("cycles_{}", cycles), |b| {
            b.iter(|| cpu_bound(black_box(cycles)));
        });
    }
    group.finish();
}

fn bench_io_unit(c: &mut Criterion) {
    let source = Path::new("/dev/urandom");
    if !source.exists() {
        return;
    }
    let mut group = c.benchmark_group("io_unit");
    group.sample_size(20);
    group.bench_function("urandom_8x262140", |b| {
        b.iter(|| io_bound(source, black_box(8), 4 * 65_535).expect("read /dev/urandom for benchmarking"));
    });
    group.finish();
}

criterion_group!(workloads, bench_cpu_unit, bench_io_unit);
criterion_main!(workloads);
