use cbcrand::{Generator, GeneratorConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SAMPLE: usize = 4 << 20;

fn bench_fill(c: &mut Criterion) {
    let max_workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let mut group = c.benchmark_group("fill");
    group.throughput(Throughput::Bytes(SAMPLE as u64));

    let mut counts = vec![1, 2, max_workers];
    counts.sort_unstable();
    counts.dedup();
    for workers in counts {
        let generator = Generator::with_config(GeneratorConfig::with_workers(workers))
            .expect("generator");
        let mut buf = vec![0u8; SAMPLE];

        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, _| {
            b.iter(|| generator.fill(&mut buf).expect("fill"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fill);
criterion_main!(benches);
