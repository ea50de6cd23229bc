//! Recoding throughput across content types and sizes.
//!
//! - **ASCII**: the single-unit fast case
//! - **Mixed**: ASCII with two, three and four byte sequences
//! - **CJK**: three byte sequences throughout
//! - **Damaged**: mixed content with an ill-formed byte every 64 bytes

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use utf_recode::policy::Replace;
use utf_recode::{StreamRecoder, first_ill_formed, recode};

const SIZES: [usize; 3] = [1024, 64 * 1024, 1024 * 1024];

fn repeat_to(pattern: &str, size: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(size + pattern.len());
    while result.len() < size {
        result.extend_from_slice(pattern.as_bytes());
    }
    result
}

const MIXED: &str = "Café résumé naïve, 日本語 and 🦀 in plain text. ";

fn corpus(size: usize) -> Vec<(&'static str, Vec<u8>)> {
    let mut damaged = repeat_to(MIXED, size);
    for byte in damaged.iter_mut().step_by(64) {
        *byte = 0xFF;
    }
    vec![
        ("ascii", repeat_to("The quick brown fox jumps over the lazy dog. ", size)),
        ("mixed", repeat_to(MIXED, size)),
        ("cjk", repeat_to("日本語中文한국어漢字", size)),
        ("damaged", damaged),
    ]
}

fn bench_utf8_to_utf16(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8_to_utf16");
    for size in SIZES {
        for (name, data) in corpus(size) {
            group.throughput(Throughput::Bytes(data.len() as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
                let mut out: Vec<u16> = Vec::with_capacity(data.len());
                b.iter(|| {
                    out.clear();
                    recode(black_box(data.as_slice()), &mut out, &Replace).unwrap();
                    black_box(out.len())
                })
            });
        }
    }
    group.finish();
}

fn bench_utf8_cleanup(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8_to_utf8");
    for size in SIZES {
        for (name, data) in corpus(size) {
            group.throughput(Throughput::Bytes(data.len() as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
                let mut out: Vec<u8> = Vec::with_capacity(data.len());
                b.iter(|| {
                    out.clear();
                    recode(black_box(data.as_slice()), &mut out, &Replace).unwrap();
                    black_box(out.len())
                })
            });
        }
    }
    group.finish();
}

fn bench_utf16_to_utf8(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf16_to_utf8");
    for size in SIZES {
        for (name, data) in corpus(size).into_iter().take(3) {
            let text = String::from_utf8(data).unwrap();
            let units: Vec<u16> = text.encode_utf16().collect();
            group.throughput(Throughput::Bytes((units.len() * 2) as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &units, |b, units| {
                let mut out: Vec<u8> = Vec::with_capacity(units.len() * 3);
                b.iter(|| {
                    out.clear();
                    recode(black_box(units.as_slice()), &mut out, &Replace).unwrap();
                    black_box(out.len())
                })
            });
        }
    }
    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_ill_formed");
    for (name, data) in corpus(1024 * 1024).into_iter().take(3) {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| first_ill_formed(black_box(data.as_slice())))
        });
    }
    group.finish();
}

fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_utf8_to_utf16");
    let data = repeat_to(MIXED, 1024 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));
    for chunk in [61, 4096, 65536] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            let mut out: Vec<u16> = Vec::with_capacity(data.len());
            b.iter(|| {
                out.clear();
                let mut recoder = StreamRecoder::<u8, u16>::new();
                for piece in data.chunks(chunk) {
                    recoder.push(piece, &mut out, &Replace).unwrap();
                }
                recoder.finish(&mut out, &Replace).unwrap();
                black_box(out.len())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_utf8_to_utf16,
    bench_utf8_cleanup,
    bench_utf16_to_utf8,
    bench_scan,
    bench_streaming
);
criterion_main!(benches);
