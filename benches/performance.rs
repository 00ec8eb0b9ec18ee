// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tomomesh::geometry::Volume;
use tomomesh::io::write_obj;
use tomomesh::{analyze, marching_cubes, SilentProgress, DEFAULT_HEADER};

fn sphere(n: usize) -> Volume<u8> {
    let c = (n as f32 - 1.0) / 2.0;
    let radius = n as f32 * 0.35;
    Volume::from_fn([n, n, n], |x, y, z| {
        let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2) + (z as f32 - c).powi(2)).sqrt();
        (127.0 + (radius - d) * 40.0).clamp(0.0, 255.0) as u8
    })
    .unwrap()
}

fn bench_marching_cubes(c: &mut Criterion) {
    let mut group = c.benchmark_group("marching_cubes");

    for n in [32, 64, 128] {
        let volume = sphere(n);
        group.bench_with_input(BenchmarkId::new("sphere", n), &volume, |b, volume| {
            b.iter(|| marching_cubes(black_box(volume), 127.0).unwrap());
        });
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    let mesh = marching_cubes(&sphere(96), 127.0).unwrap();

    group.bench_function("obj_sphere_96", |b| {
        b.iter(|| {
            write_obj(black_box(&mesh), std::io::sink(), DEFAULT_HEADER, &SilentProgress).unwrap()
        });
    });

    group.finish();
}

fn bench_analytics(c: &mut Criterion) {
    let mesh = marching_cubes(&sphere(64), 127.0).unwrap();
    c.bench_function("analyze_sphere_64", |b| b.iter(|| analyze(black_box(&mesh))));
}

criterion_group!(benches, bench_marching_cubes, bench_export, bench_analytics);
criterion_main!(benches);
