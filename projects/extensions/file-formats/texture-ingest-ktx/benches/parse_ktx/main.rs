use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use endian_writer::{EndianWriter, LittleEndianWriter};
use std::hint::black_box;
use texture_ingest_common::CompressedFormat;
use texture_ingest_ktx::{parse_ktx, parse_ktx_with_options, KtxParseOptions};

/// 2048x2048 DXT5 with a full mip chain and a small metadata block.
fn build_ktx() -> Vec<u8> {
    let format = CompressedFormat::RgbaS3tcDxt5;
    let (width, height, levels) = (2048u32, 2048u32, 12u32);

    let mut key_value = Vec::new();
    let entry = b"KTXorientation\0S=r,T=d\0";
    key_value.extend_from_slice(&(entry.len() as u32).to_le_bytes());
    key_value.extend_from_slice(entry);
    while key_value.len() % 4 != 0 {
        key_value.push(0);
    }

    let mut data = vec![0u8; 64];
    data[..12].copy_from_slice(&[
        0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
    ]);
    let fields = [
        0x0403_0201,
        0,
        1,
        0,
        format.gl_internal_format(),
        0x1908,
        width,
        height,
        0,
        0,
        1,
        levels,
        key_value.len() as u32,
    ];
    // SAFETY: `data` holds the 64-byte header; the 13 fields fill bytes 12..64.
    let mut writer = unsafe { LittleEndianWriter::new(data.as_mut_ptr().add(12)) };
    for field in fields {
        unsafe { writer.write_u32(field) };
    }
    data.extend_from_slice(&key_value);

    for level in 0..levels {
        let size = format
            .level_byte_len((width >> level).max(1), (height >> level).max(1))
            .unwrap();
        data.extend_from_slice(&(size as u32).to_le_bytes());
        data.extend((0..size).map(|i| i as u8));
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }
    data
}

fn criterion_benchmark(c: &mut Criterion) {
    let data = build_ktx();
    let mut group = c.benchmark_group("KTX Parse (2048x2048 DXT5, 12 levels)");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("parse_ktx", |b| {
        b.iter(|| parse_ktx(black_box(&data)))
    });

    let with_metadata = KtxParseOptions::default().with_key_value_data(true);
    group.bench_function("parse_ktx_with_key_value_data", |b| {
        b.iter(|| parse_ktx_with_options(black_box(&data), with_metadata))
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
