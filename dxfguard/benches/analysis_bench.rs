use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dxfguard::analyzer::analyze_advanced;
use dxfguard::parser::{DxfParser, FileInfo};
use dxfguard::prelude::*;
use dxfguard::sample::{sample_drawing, write_sample};

fn bench_analyze_file(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("sample.dxf");
    write_sample(&path).expect("sample written");

    c.bench_function("analyze_file", |b| {
        b.iter(|| DxfGuardCore::analyze_file(black_box(&path)));
    });

    c.bench_function("parse_drawing", |b| {
        b.iter(|| dxfguard::parse_drawing(black_box(&path)));
    });
}

fn bench_analyze_in_memory(c: &mut Criterion) {
    let drawing = sample_drawing();
    let data = DxfParser::from_drawing(&drawing, FileInfo::default());

    c.bench_function("aggregate_drawing", |b| {
        b.iter(|| DxfParser::from_drawing(black_box(&drawing), FileInfo::default()));
    });

    c.bench_function("analyze_advanced", |b| {
        b.iter(|| analyze_advanced(black_box(&data)));
    });
}

criterion_group!(benches, bench_analyze_file, bench_analyze_in_memory);
criterion_main!(benches);
