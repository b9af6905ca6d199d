// ABOUTME: Benchmark suite for the SMS PDU codec
// ABOUTME: Measures text encoding, TPDU marshalling, +CMT parsing and reassembly across message sizes

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gsm_modem::driver::unmarshal_tpdu;
use gsm_modem::pdu::{Collector, EncoderOption, PduMode, Tpdu, decode, encode};
use std::time::Duration;

fn sample_deliver() -> Tpdu {
    let mut tpdus = encode("Hello World", &[EncoderOption::From("+61409894000".into())])
        .expect("encodable sample");
    tpdus.remove(0)
}

fn cmt_lines(tpdu: &Tpdu) -> [String; 2] {
    let bytes = tpdu.marshal_binary().expect("marshallable sample");
    let hex = PduMode::new(None, bytes.clone())
        .marshal_hex_string()
        .expect("marshallable sample");
    [format!("+CMT: ,{}", bytes.len()), hex]
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.measurement_time(Duration::from_secs(10));

    for (name, text) in [
        ("gsm7", "Hello World".to_string()),
        ("ucs2", "Привет, мир".to_string()),
        ("gsm7_long", "x".repeat(1000)),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| encode(black_box(text), &[EncoderOption::To("+1555123".into())]))
        });
    }
    group.finish();
}

fn bench_marshal(c: &mut Criterion) {
    let tpdu = sample_deliver();
    let bytes = tpdu.marshal_binary().expect("marshallable sample");

    let mut group = c.benchmark_group("tpdu");
    group.bench_function("marshal", |b| b.iter(|| black_box(&tpdu).marshal_binary()));
    group.bench_function("unmarshal", |b| {
        b.iter(|| Tpdu::unmarshal_binary(black_box(&bytes)))
    });
    group.finish();
}

fn bench_cmt(c: &mut Criterion) {
    let lines = cmt_lines(&sample_deliver());
    c.bench_function("unmarshal_cmt", |b| b.iter(|| unmarshal_tpdu(black_box(&lines))));
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassembly");
    for parts in [2usize, 8, 32] {
        let text = "y".repeat(153 * parts);
        let tpdus = encode(&text, &[EncoderOption::From("+1555123".into())])
            .expect("encodable sample");
        group.bench_with_input(BenchmarkId::from_parameter(parts), &tpdus, |b, tpdus| {
            b.iter(|| {
                let mut collector = Collector::new();
                let mut complete = None;
                for tpdu in tpdus.iter().rev() {
                    complete = collector.collect(tpdu.clone()).ok().flatten();
                }
                complete.map(|parts| decode(&parts))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_marshal, bench_cmt, bench_reassembly);
criterion_main!(benches);
