//! Criterion micro-benchmarks for the record codec and schema hashing.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use spine_bench::reference_event;
use spine_data::{ProjectionConfig, RecoExt, RecoObject, Variant};
use spine_store::codec::{decode_record, encode_record};
use spine_store::{schema_hash, RecordReader, RecordWriter};

/// Benchmark: encode one projected 512-voxel record.
fn bench_encode_record(c: &mut Criterion) {
    let record = reference_event()[0]
        .project(&ProjectionConfig::default())
        .unwrap();

    c.bench_function("codec_encode_record", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(8192);
            encode_record(&mut buf, &record).unwrap();
            black_box(&buf);
        });
    });
}

/// Benchmark: decode the same record.
fn bench_decode_record(c: &mut Criterion) {
    let record = reference_event()[0]
        .project(&ProjectionConfig::default())
        .unwrap();
    let mut encoded = Vec::with_capacity(8192);
    encode_record(&mut encoded, &record).unwrap();

    c.bench_function("codec_decode_record", |b| {
        b.iter(|| {
            let mut cursor = encoded.as_slice();
            let decoded = decode_record(&mut cursor).unwrap().unwrap();
            black_box(&decoded);
        });
    });
}

/// Benchmark: write and read back the whole reference event.
fn bench_stream_roundtrip(c: &mut Criterion) {
    let event = reference_event();

    c.bench_function("stream_roundtrip_64", |b| {
        b.iter(|| {
            let mut writer = RecordWriter::<_, RecoExt>::new(Vec::new()).unwrap();
            writer.write_all(&event).unwrap();
            let buf = writer.into_inner();
            let reader = RecordReader::<_, RecoExt>::open(buf.as_slice()).unwrap();
            let back: Vec<RecoObject> = reader.objects().map(Result::unwrap).collect();
            black_box(back);
        });
    });
}

fn bench_schema_hash(c: &mut Criterion) {
    c.bench_function("schema_hash_reco", |b| {
        b.iter(|| black_box(schema_hash(RecoExt::registry())));
    });
}

criterion_group!(
    benches,
    bench_encode_record,
    bench_decode_record,
    bench_stream_roundtrip,
    bench_schema_hash
);
criterion_main!(benches);
