//! Benchmarks for the performance-critical mesh operations
//!
//! 1. **Grid generation**: `create_3d_grid`, which exercises point, cell and
//!    boundary creation plus adjacency derivation
//! 2. **Adjacency**: forced `create_neighbour_infos` on an existing mesh
//! 3. **Point location**: `find_cell` over a batch of seeded random positions
//! 4. **Refinement**: `create_h2` on hexahedral grids

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use meshtopo::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::hint::black_box;
use std::sync::OnceLock;

/// Get the deterministic seed for random position generation.
/// Reads `MESHTOPO_BENCH_SEED` (decimal or 0x-hex). Defaults to 0x3E5A.
fn get_benchmark_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        std::env::var("MESHTOPO_BENCH_SEED")
            .ok()
            .and_then(|s| {
                let s = s.trim();
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .map_or_else(|| s.parse().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            })
            .unwrap_or(0x3E5A)
    })
}

fn unit_axis(cells: usize) -> Vec<f64> {
    (0..=cells)
        .map(|i| i as f64 / cells as f64)
        .collect()
}

fn benchmark_grid_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_3d_grid");
    for &cells in &[4_usize, 8, 16] {
        let axis = unit_axis(cells);
        group.throughput(Throughput::Elements((cells * cells * cells) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(cells), &axis, |b, axis| {
            b.iter(|| black_box(create_3d_grid(axis, axis, axis, 123).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_adjacency(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_neighbour_infos");
    for &cells in &[8_usize, 16] {
        let axis = unit_axis(cells);
        let mesh = create_3d_grid(&axis, &axis, &axis, 0).unwrap();
        group.throughput(Throughput::Elements(mesh.cell_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(cells), &mesh, |b, mesh| {
            b.iter_batched(
                || mesh.clone(),
                |mut mesh| {
                    mesh.create_neighbour_infos(true).unwrap();
                    black_box(mesh)
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn benchmark_find_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_cell");
    let mut rng = StdRng::seed_from_u64(get_benchmark_seed());
    let probes: Vec<Position> = (0..256)
        .map(|_| {
            Position::new(
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
            )
        })
        .collect();
    group.throughput(Throughput::Elements(probes.len() as u64));

    for &cells in &[8_usize, 16] {
        let axis = unit_axis(cells);
        let mut mesh = create_3d_grid(&axis, &axis, &axis, 0).unwrap();
        mesh.fill_spatial_index().unwrap();
        group.bench_function(BenchmarkId::from_parameter(cells), |b| {
            b.iter(|| {
                for probe in &probes {
                    black_box(mesh.find_cell(probe, false).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn benchmark_refinement(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_h2");
    for &cells in &[4_usize, 8] {
        let axis = unit_axis(cells);
        let mesh = create_3d_grid(&axis, &axis, &axis, 123).unwrap();
        group.throughput(Throughput::Elements(mesh.cell_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(cells), &mesh, |b, mesh| {
            b.iter(|| black_box(mesh.create_h2().unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_grid_generation,
    benchmark_adjacency,
    benchmark_find_cell,
    benchmark_refinement
);
criterion_main!(benches);
