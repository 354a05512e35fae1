use criterion::{Criterion, black_box, criterion_group, criterion_main};
use futures::StreamExt;
use seqtools::Sequence;

const NUM_INTS: u64 = 10_000;
const WORKERS: usize = 8;

fn busy(x: u64) -> u64 {
    (0..64).fold(x, |acc, i| acc.wrapping_mul(31).wrapping_add(i))
}

fn benchmark_for_each(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    c.bench_function("parallel/for_each/fast", |b| {
        let seq = Sequence::from_vec((0..NUM_INTS).collect());
        b.to_async(&rt).iter(|| {
            let seq = seq.clone();
            async move {
                black_box(seq.for_each_parallel(WORKERS, |x| {
                    black_box(busy(x));
                }))
                .await
            }
        });
    });

    c.bench_function("parallel/for_each/dispatched", |b| {
        let seq = Sequence::from_fn(|| 0..NUM_INTS);
        b.to_async(&rt).iter(|| {
            let seq = seq.clone();
            async move {
                black_box(seq.for_each_parallel(WORKERS, |x| {
                    black_box(busy(x));
                }))
                .await
            }
        });
    });
}

fn benchmark_select_async(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    c.bench_function("parallel/select_async/fast", |b| {
        let seq = Sequence::from_vec((0..NUM_INTS).collect());
        b.to_async(&rt).iter(|| {
            let seq = seq.clone();
            async move { black_box(seq.select_async(WORKERS, busy).count().await) }
        });
    });
}

criterion_group!(parallel_benches, benchmark_for_each, benchmark_select_async);
criterion_main!(parallel_benches);
