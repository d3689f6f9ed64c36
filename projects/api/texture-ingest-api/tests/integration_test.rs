//! End-to-end loads through [`TextureIngest`] with a mock transcoder.

use futures::executor::block_on;
use futures::future::join_all;
use rstest::rstest;
use std::collections::BTreeSet;
use std::sync::Arc;
use texture_ingest_api::{
    CompressionExtension, ExtensionSet, IngestConfig, IngestError, SchedulerError, StaticSource,
    TextureIngest,
};
use texture_ingest_basis::mock::{MockBehavior, MockBlob, MockTranscoder};
use texture_ingest_basis::BasisFormat;
use texture_ingest_common::{CompressedFormat, FormatError, TextureFormat, UncompressedFormat};

const KTX_MAGIC: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];
const GL_COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;

/// A little-endian DXT5 KTX with a full-length level per mip.
fn dxt5_ktx(size: u32, levels: u32) -> Vec<u8> {
    let mut data = KTX_MAGIC.to_vec();
    let header = [
        0x0403_0201,
        0,
        1,
        0,
        GL_COMPRESSED_RGBA_S3TC_DXT5_EXT,
        0,
        size,
        size,
        0,
        0,
        1,
        levels,
        0,
    ];
    for field in header {
        data.extend_from_slice(&u32::to_le_bytes(field));
    }
    for level in 0..levels {
        let dim = (size >> level).max(1);
        let blocks = dim.div_ceil(4) as usize;
        let len = blocks * blocks * 16;
        data.extend_from_slice(&(len as u32).to_le_bytes());
        data.extend_from_slice(&vec![level as u8; len]);
    }
    data
}

/// A legacy-header DXT1 DDS with one level.
fn dxt1_dds(size: u32) -> Vec<u8> {
    const DDSD_REQUIRED: u32 = 0x1 | 0x2 | 0x4 | 0x1000 | 0x80000;
    const DDPF_FOURCC: u32 = 0x4;

    let blocks = size.div_ceil(4) as usize;
    let mut data = vec![0u8; 0x80 + blocks * blocks * 8];
    let mut put = |offset: usize, value: u32| {
        data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    };
    put(0x00, u32::from_le_bytes(*b"DDS "));
    put(0x04, 124);
    put(0x08, DDSD_REQUIRED);
    put(0x0C, size);
    put(0x10, size);
    put(0x50, DDPF_FOURCC);
    put(0x54, u32::from_le_bytes(*b"DXT1"));
    data
}

fn ingest(behavior: MockBehavior, worker_count: usize) -> (TextureIngest, MockTranscoder) {
    let transcoder = MockTranscoder::new(behavior);
    let ingest = TextureIngest::new(
        IngestConfig::default().with_worker_count(worker_count),
        Arc::new(transcoder.clone()),
        Arc::new(StaticSource::new(&b"transcoder"[..])),
    );
    (ingest, transcoder)
}

fn s3tc() -> ExtensionSet {
    ExtensionSet::empty().with(CompressionExtension::S3tc)
}

fn key_set(keys: Vec<String>) -> BTreeSet<String> {
    keys.into_iter().collect()
}

fn expected_keys(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|key| key.to_string()).collect()
}

#[test]
fn ktx_with_mips_registers_one_texture() {
    let (ingest, transcoder) = ingest(MockBehavior::default(), 2);

    let textures = block_on(ingest.load("bunny.ktx", dxt5_ktx(256, 3), &s3tc())).unwrap();

    assert_eq!(
        key_set(textures.keys()),
        expected_keys(&["bunny.ktx", "bunny.ktx-1"])
    );
    let resource = textures.get("bunny.ktx").unwrap();
    assert_eq!(
        resource.format,
        TextureFormat::Compressed(CompressedFormat::RgbaS3tcDxt5)
    );
    let widths: Vec<u32> = resource.levels.iter().map(|level| level.width).collect();
    assert_eq!(widths, vec![256, 128, 64]);
    assert_eq!(resource.levels[0].bytes.len(), 256 * 256);
    assert_eq!(transcoder.instantiations(), 0);
}

#[test]
fn dds_registers_one_texture() {
    let (ingest, _) = ingest(MockBehavior::default(), 1);

    let textures = block_on(ingest.load("textures/stone.dds", dxt1_dds(64), &s3tc())).unwrap();

    assert_eq!(textures.len(), 1);
    let resource = textures.get("textures/stone.dds-1").unwrap();
    assert_eq!((resource.width, resource.height), (64, 64));
    assert_eq!(resource.levels.len(), 1);
    assert_eq!(resource.levels[0].bytes.len(), 64 * 64 / 2);
}

#[test]
fn basis_with_three_images_registers_four_keys() {
    let (ingest, _) = ingest(MockBehavior::default(), 2);
    let blob = MockBlob::new(vec![vec![(32, 32)], vec![(32, 32)], vec![(32, 32)]]).encode();

    let textures = block_on(ingest.load("foo.basis", blob, &s3tc())).unwrap();

    assert_eq!(
        key_set(textures.keys()),
        expected_keys(&["foo.basis", "foo.basis-1", "foo.basis-2", "foo.basis-3"])
    );
    assert!(Arc::ptr_eq(
        textures.get("foo.basis").unwrap(),
        textures.get("foo.basis-1").unwrap()
    ));
    assert!(textures
        .resources()
        .iter()
        .all(|resource| resource.format == BasisFormat::Bc1.texture_format().unwrap()));
}

#[rstest]
#[case::opaque(MockBlob::single(16, 16, 1), BasisFormat::Bc1)]
#[case::with_alpha(MockBlob::single(16, 16, 1).with_alpha(), BasisFormat::Bc3)]
fn basis_target_follows_alpha(#[case] blob: MockBlob, #[case] expected: BasisFormat) {
    let (ingest, _) = ingest(MockBehavior::default(), 1);

    let textures = block_on(ingest.load("tile.basis", blob.encode(), &s3tc())).unwrap();

    assert_eq!(
        textures.resources()[0].format,
        expected.texture_format().unwrap()
    );
}

#[test]
fn failing_target_falls_back_to_rgb565() {
    let (ingest, _) = ingest(MockBehavior::default().fail_format(BasisFormat::Bc1), 1);
    let blob = MockBlob::single(8, 8, 2).encode();

    let textures = block_on(ingest.load("tile.basis", blob, &s3tc())).unwrap();

    let resource = &textures.resources()[0];
    assert_eq!(
        resource.format,
        TextureFormat::Uncompressed(UncompressedFormat::RGB565)
    );
    assert_eq!(resource.levels[0].bytes.len(), 8 * 8 * 2);
}

#[test]
fn context_without_extensions_transcodes_uncompressed() {
    let (ingest, _) = ingest(MockBehavior::default(), 1);
    let blob = MockBlob::single(4, 4, 1).encode();

    let textures = block_on(ingest.load("tile.basis", blob, &ExtensionSet::empty())).unwrap();

    assert!(ingest.capabilities(&ExtensionSet::empty()).fallback_required);
    assert_eq!(
        textures.resources()[0].format,
        TextureFormat::Uncompressed(UncompressedFormat::RGB565)
    );
}

#[test]
fn unknown_container_is_rejected() {
    let (ingest, _) = ingest(MockBehavior::default(), 1);

    let result = block_on(ingest.load("image.png", b"\x89PNG\r\n\x1a\n".to_vec(), &s3tc()));

    assert_eq!(
        result,
        Err(IngestError::UnknownContainer {
            url: "image.png".to_owned()
        })
    );
}

#[test]
fn malformed_ktx_surfaces_format_error() {
    let (ingest, _) = ingest(MockBehavior::default(), 1);
    let mut data = dxt5_ktx(16, 1);
    data[0] = 0;

    let result = block_on(ingest.load("broken.ktx", data, &s3tc()));

    assert!(matches!(result, Err(IngestError::Format(FormatError::InvalidMagic))));
}

#[test]
fn transcode_failure_is_reported_per_load() {
    let (ingest, _) = ingest(MockBehavior::default().fail_start(), 1);

    let result = block_on(ingest.load("bad.basis", MockBlob::single(4, 4, 1).encode(), &s3tc()));

    assert!(matches!(
        result,
        Err(IngestError::Scheduler(SchedulerError::Transcode(_)))
    ));
}

#[test]
fn concurrent_basis_loads_share_one_binary_fetch() {
    let (ingest, transcoder) = ingest(MockBehavior::default().require_payload(b"transcoder"), 3);
    let context = s3tc();
    let urls: Vec<String> = (0..6).map(|index| format!("tile-{index}.basis")).collect();

    let loads = urls
        .iter()
        .map(|url| ingest.load(url, MockBlob::single(16, 16, 2).encode(), &context));
    let results = block_on(join_all(loads));

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(transcoder.instantiations(), 3);
    let stats = ingest.scheduler().stats();
    assert_eq!(stats.pending, 0);
    assert_eq!(
        stats.workers.iter().map(|worker| worker.dispatched).sum::<u64>(),
        6
    );
}

#[test]
fn inline_mode_loads_basis_without_workers() {
    let (ingest, transcoder) = ingest(MockBehavior::default(), 0);

    let textures = block_on(ingest.load("foo.basis", MockBlob::single(8, 8, 1).encode(), &s3tc()))
        .unwrap();

    assert_eq!(textures.len(), 1);
    assert!(ingest.scheduler().stats().inline);
    assert_eq!(transcoder.instantiations(), 1);
}
