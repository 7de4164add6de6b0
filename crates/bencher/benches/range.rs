use std::hint::black_box;

use bencher::RANGE_CASES;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use strand_web::range::RangeSpec;

fn benchmark_range_resolve(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("range_resolve");

    for case in RANGE_CASES {
        group.bench_with_input(BenchmarkId::from_parameter(case.name), &case, |b, case| {
            b.iter(|| {
                let range = black_box(case.header).parse::<RangeSpec>().ok().and_then(|spec| spec.resolve(case.size).ok());
                black_box(range)
            });
        });
    }

    group.finish();
}

criterion_group!(range, benchmark_range_resolve);
criterion_main!(range);
