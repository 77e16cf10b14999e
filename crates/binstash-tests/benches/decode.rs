use binstash_decoder::{Builder, Parser, StreamParser, WordSpec};
use binstash_tests::{encode_records, record_layout};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn sample_records(n: u16) -> Vec<u8> {
    let names = ["alpha", "beta", "gamma", "a rather longer record name"];
    let records: Vec<_> = (0..n)
        .map(|i| (i, names[usize::from(i) % names.len()], u8::try_from(i % 256).unwrap()))
        .collect();
    encode_records(&records, "end of list")
}

fn bench_words(c: &mut Criterion) {
    let input = [5, 80, 0, 11, 184];
    c.bench_function("oneshot_header", |b| {
        b.iter(|| {
            let mut parser = Parser::new(&input);
            parser
                .word("count", WordSpec::U8)
                .word("ports.src", WordSpec::U16_LE)
                .word("ports.dst", WordSpec::U16_BE);
            parser.finish().unwrap()
        });
    });
}

fn bench_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("records");
    for n in [10u16, 100, 255] {
        let input = sample_records(n);
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("oneshot", n), &input, |b, input| {
            b.iter(|| {
                let mut parser = Parser::new(input);
                record_layout(&mut parser);
                parser.finish().unwrap()
            });
        });

        for chunk in [1usize, 64, 4096] {
            let id = BenchmarkId::new(format!("stream_chunk_{chunk}"), n);
            group.bench_with_input(id, &input, |b, input| {
                b.iter(|| {
                    let mut stream = StreamParser::new();
                    record_layout(&mut stream);
                    for piece in input.chunks(chunk) {
                        stream.write(piece).unwrap();
                    }
                    stream.finish().unwrap()
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_words, bench_records);
criterion_main!(benches);
