use std::sync::OnceLock;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use seqtools::Sequence;

const NUM_OPS: usize = 20;
const NUM_INTS: usize = 100_000;

fn vals() -> &'static [usize] {
    static VALS: OnceLock<Vec<usize>> = OnceLock::new();
    VALS.get_or_init(|| {
        let mut rng = <rand::rngs::SmallRng as rand::SeedableRng>::seed_from_u64(5938450);
        let mut vals = Vec::with_capacity(NUM_INTS);
        for _ in 0..NUM_INTS {
            vals.push(rand::Rng::gen_range(&mut rng, 0..(1 << (NUM_OPS + 3))));
        }
        vals
    })
}

/// `NUM_OPS` filters, each dropping values with one particular bit set.
fn filter_chain(mut seq: Sequence<usize>) -> Sequence<usize> {
    for i in 0..NUM_OPS {
        seq = seq.filter(move |x| (x >> i) & 0b1 == 0 || i % 3 != 0);
    }
    seq
}

fn benchmark_fused(c: &mut Criterion) {
    c.bench_function("filter_chain/fused", |b| {
        let seq = filter_chain(Sequence::from_slice(vals()));
        b.iter(|| {
            black_box(seq.to_vec());
        });
    });
}

fn benchmark_wrapped(c: &mut Criterion) {
    c.bench_function("filter_chain/wrapped", |b| {
        let seq = filter_chain(Sequence::from_fn(|| vals().iter().copied()));
        b.iter(|| {
            black_box(seq.to_vec());
        });
    });
}

fn benchmark_raw(c: &mut Criterion) {
    c.bench_function("filter_chain/raw", |b| {
        b.iter(|| {
            let out = vals()
                .iter()
                .copied()
                .filter(|x| (0..NUM_OPS).all(|i| (x >> i) & 0b1 == 0 || i % 3 != 0))
                .collect::<Vec<_>>();
            black_box(out);
        });
    });
}

fn benchmark_take_skip(c: &mut Criterion) {
    c.bench_function("filter_chain/take_skip_view", |b| {
        let seq = Sequence::from_slice(vals());
        b.iter(|| {
            black_box(seq.clone().skip(NUM_INTS / 2).take(1000).count());
        });
    });
}

criterion_group!(
    filter_chain_benches,
    benchmark_fused,
    benchmark_wrapped,
    benchmark_raw,
    benchmark_take_skip,
);
criterion_main!(filter_chain_benches);
