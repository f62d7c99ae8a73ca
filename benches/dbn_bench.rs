//! Criterion benchmarks for the training hot paths.
//!
//! Run with: `cargo bench --bench dbn_bench`
//!
//! ## Benchmarks
//!
//! 1. **Forward prediction** — full-stack predict on a data matrix
//! 2. **Reconstruction** — encoder/decoder round trip on an unrolled net
//! 3. **Contrastive divergence** — a short pretraining burst
//! 4. **Gradient** — one backpropagation gradient on an unrolled net

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deepbelief::{
    ContinuePolicy, DeepBeliefNet, Layer, NoOpPretrainProgress, PretrainParameters, Rbm, UnitKind,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic_data(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(0.0..1.0))
}

fn randomized_net(sizes: &[usize], seed: u64) -> DeepBeliefNet {
    let layers = sizes
        .iter()
        .map(|&s| Layer::new(s, UnitKind::Binary))
        .collect();
    let dbn = DeepBeliefNet::new(layers).expect("network");
    let mut rng = StdRng::seed_from_u64(seed);
    let values: Vec<f64> = (0..dbn.data().len())
        .map(|_| rng.gen_range(-0.1..0.1))
        .collect();
    dbn.data().copy_from_slice(&values);
    dbn
}

fn bench_predict(c: &mut Criterion) {
    let dbn = randomized_net(&[64, 32, 8], 1);
    let data = synthetic_data(64, 100, 2);
    c.bench_function("predict 64-32-8 x100", |b| {
        b.iter(|| black_box(dbn.predict(black_box(&data))))
    });
}

fn bench_reconstruct_unrolled(c: &mut Criterion) {
    let net = randomized_net(&[64, 32, 8], 3).unroll().expect("unroll");
    let data = synthetic_data(64, 100, 4);
    c.bench_function("reconstruct unrolled 64-32-8 x100", |b| {
        b.iter(|| black_box(net.reconstruct(black_box(&data))))
    });
}

fn bench_contrastive_divergence(c: &mut Criterion) {
    let data = synthetic_data(64, 200, 5);
    let params = PretrainParameters {
        max_iters: 10,
        min_iters: 10,
        batch_size: 50,
        seed: Some(6),
        ..PretrainParameters::default().with_epsilon(0.05)
    };
    c.bench_function("cd pretrain 64x32, 10 iterations", |b| {
        b.iter(|| {
            let mut rbm = Rbm::new(
                Layer::new(64, UnitKind::Binary),
                Layer::new(32, UnitKind::Binary),
            );
            rbm.pretrain(
                &data,
                &params,
                &mut NoOpPretrainProgress,
                &ContinuePolicy::default(),
            )
            .expect("pretraining");
            black_box(rbm)
        })
    });
}

fn bench_gradient(c: &mut Criterion) {
    let net = randomized_net(&[64, 32, 8], 7).unroll().expect("unroll");
    let data = synthetic_data(64, 50, 8);
    c.bench_function("gradient unrolled 64-32-8 x50", |b| {
        b.iter(|| black_box(net.gradient(black_box(&data)).expect("gradient")))
    });
}

criterion_group!(
    benches,
    bench_predict,
    bench_reconstruct_unrolled,
    bench_contrastive_divergence,
    bench_gradient
);
criterion_main!(benches);
