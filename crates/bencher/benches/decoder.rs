use std::hint::black_box;

use bencher::{TestCase, TestFile};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use strand_http::codec::ResponseDecoder;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

static SMALL_RESPONSE: TestFile = TestFile::new("ok_small.txt", include_bytes!("../resources/response/ok_small.txt"));
static LARGE_RESPONSE: TestFile = TestFile::new("ok_large.txt", include_bytes!("../resources/response/ok_large.txt"));
static CHUNKED_RESPONSE: TestFile = TestFile::new("chunked.txt", include_bytes!("../resources/response/chunked.txt"));

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::new("small_response", SMALL_RESPONSE),
        TestCase::new("large_response", LARGE_RESPONSE),
        TestCase::new("chunked_response", CHUNKED_RESPONSE),
    ]
}

fn benchmark_response_decoder(criterion: &mut Criterion) {
    let test_cases = create_test_cases();
    let mut group = criterion.benchmark_group("response_decoder");

    for case in test_cases {
        group.throughput(Throughput::Bytes(case.file().len()));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            let mut response_decoder = ResponseDecoder::new();
            b.iter_batched_ref(
                || BytesMut::from(case.file().content()),
                |bytes_mut| {
                    let response = response_decoder.decode(bytes_mut).expect("input should be a valid http response").unwrap();
                    black_box(response);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(decoder, benchmark_response_decoder);
criterion_main!(decoder);
