use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use eclipsera::PlaneSelection;
use eclipsera::stego::{embed_payload, extract_payload, read_bit_stream};
use image::{Rgba, RgbaImage};
use std::hint::black_box;

/// Cover with enough texture that the LSBs are not all zero.
fn create_cover(side: u32) -> RgbaImage {
    RgbaImage::from_fn(side, side, |x, y| {
        Rgba([(x * 31 + y) as u8, (y * 17 + x) as u8, (x ^ y) as u8, 255])
    })
}

fn create_payload(len: usize) -> Vec<u8> {
    b"Eclipsera golden vector v1: hello, moon. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Benchmark: embedding payloads of growing size into a 512x512 cover
fn bench_embed(c: &mut Criterion) {
    let mut group = c.benchmark_group("lsb_embed");
    let cover = create_cover(512);
    let plane = PlaneSelection::all_rgb();

    for len in [64usize, 4_096, 65_536] {
        let payload = create_payload(len);
        group.throughput(Throughput::Bytes(len as u64));
        for compress in [false, true] {
            let id = BenchmarkId::new(if compress { "zlib" } else { "plain" }, len);
            group.bench_with_input(id, &payload, |b, payload| {
                b.iter(|| {
                    let mut image = cover.clone();
                    embed_payload(&mut image, black_box(payload), &plane, compress).unwrap()
                });
            });
        }
    }

    group.finish();
}

/// Benchmark: extracting the same payloads back
fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("lsb_extract");
    let plane = PlaneSelection::all_rgb();

    for len in [64usize, 4_096, 65_536] {
        for compress in [false, true] {
            let mut image = create_cover(512);
            embed_payload(&mut image, &create_payload(len), &plane, compress).unwrap();

            group.throughput(Throughput::Bytes(len as u64));
            let id = BenchmarkId::new(if compress { "zlib" } else { "plain" }, len);
            group.bench_with_input(id, &image, |b, image| {
                b.iter(|| extract_payload(black_box(image), &plane, compress));
            });
        }
    }

    group.finish();
}

/// Benchmark: raw bit stream of the full RGB plane, as used by the sweep
fn bench_bit_stream(c: &mut Criterion) {
    let image = create_cover(1024);
    let channels = PlaneSelection::all_rgb();

    c.bench_function("read_bit_stream_rgb_1024", |b| {
        b.iter(|| read_bit_stream(black_box(&image), channels.channels(), 0));
    });
}

criterion_group!(benches, bench_embed, bench_extract, bench_bit_stream);
criterion_main!(benches);
