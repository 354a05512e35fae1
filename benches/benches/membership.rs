use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use seqtools::membership;

const LIST_LEN: usize = 5_000;

fn benchmark_every(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(1234);
    let list = (0..LIST_LEN as u32).collect::<Vec<_>>();

    let mut group = c.benchmark_group("membership/every");
    for probe_len in [10, 50, 100, 500] {
        let probe = (0..probe_len)
            .map(|_| rng.gen_range(0..LIST_LEN as u32))
            .collect::<Vec<_>>();
        group.bench_with_input(BenchmarkId::new("nested", probe_len), &probe, |b, probe| {
            b.iter(|| black_box(membership::every_nested(&list, probe)));
        });
        group.bench_with_input(BenchmarkId::new("hashed", probe_len), &probe, |b, probe| {
            b.iter(|| black_box(membership::every_hashed(&list, probe)));
        });
        group.bench_with_input(BenchmarkId::new("adaptive", probe_len), &probe, |b, probe| {
            b.iter(|| black_box(membership::every(&list, probe)));
        });
    }
    group.finish();
}

criterion_group!(membership_benches, benchmark_every);
criterion_main!(membership_benches);
