use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ndarray::Array2;

use animerec::{EmbeddingMatrix, RankDirection};

/// Deterministic pseudo-random unit rows; no RNG dependency needed for a
/// benchmark fixture.
fn synthetic_matrix(rows: usize, dim: usize) -> EmbeddingMatrix {
    let mut state = 0x2545F4914F6CDD1D_u64;
    let mut data = Vec::with_capacity(rows * dim);
    for _ in 0..rows {
        let mut row = Vec::with_capacity(dim);
        for _ in 0..dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let value = ((state >> 33) as f32 / (u32::MAX >> 1) as f32) - 1.0;
            row.push(value);
        }
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt().max(f32::MIN_POSITIVE);
        data.extend(row.into_iter().map(|v| v / norm));
    }
    let array = Array2::from_shape_vec((rows, dim), data).expect("shape matches data");
    EmbeddingMatrix::from_array(array).expect("non-empty matrix")
}

fn bench_rank_neighbors(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_neighbors");

    for rows in [1_000, 10_000, 50_000].iter() {
        let matrix = synthetic_matrix(*rows, 128);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_function(format!("rows_{rows}"), |b| {
            b.iter(|| {
                matrix.rank_neighbors(black_box(7), black_box(10), RankDirection::Nearest)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rank_neighbors);
criterion_main!(benches);
