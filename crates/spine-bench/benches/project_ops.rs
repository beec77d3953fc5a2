//! Criterion micro-benchmarks for projection, restore and unit conversion.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use spine_bench::{reference_event, truth_event};
use spine_data::{ProjectionConfig, TruthObject, VoxelMeta};

fn bench_project_reco(c: &mut Criterion) {
    let event = reference_event();
    let config = ProjectionConfig::default();

    c.bench_function("project_reco_64x512", |b| {
        b.iter(|| {
            for obj in &event {
                black_box(obj.project(&config).unwrap());
            }
        });
    });
}

fn bench_restore_truth(c: &mut Criterion) {
    let config = ProjectionConfig::default();
    let records: Vec<_> = truth_event()
        .iter()
        .map(|o| o.project(&config).unwrap())
        .collect();

    c.bench_function("restore_truth_16", |b| {
        b.iter(|| {
            for record in &records {
                black_box(TruthObject::restore(record).unwrap());
            }
        });
    });
}

fn bench_to_px(c: &mut Criterion) {
    let event = truth_event();
    let meta = VoxelMeta::new([-200.0, -200.0, -200.0], [0.3, 0.3, 0.3]).unwrap();

    c.bench_function("to_px_truth_16", |b| {
        b.iter(|| {
            for obj in &event {
                let mut obj = obj.clone();
                obj.to_px(&meta).unwrap();
                black_box(obj);
            }
        });
    });
}

criterion_group!(benches, bench_project_reco, bench_restore_truth, bench_to_px);
criterion_main!(benches);
