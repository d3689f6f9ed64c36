#![no_main]

// Structure-aware variant: a valid identifier and endianness marker followed by arbitrary
// header fields and level records, so the fuzzer spends its time past the magic check.

use libfuzzer_sys::{arbitrary, fuzz_target};
use texture_ingest_ktx::parse_ktx;

const KTX_MAGIC: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Header {
    pub big_endian: bool,
    /// glType through bytesOfKeyValueData.
    pub fields: [u32; 12],
    pub body: Vec<u8>,
}

fuzz_target!(|header: Header| {
    let encode = |value: u32| {
        if header.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    };

    let mut data = KTX_MAGIC.to_vec();
    data.extend_from_slice(&encode(0x0403_0201));
    for field in header.fields {
        data.extend_from_slice(&encode(field));
    }
    data.extend_from_slice(&header.body);

    if let Ok(container) = parse_ktx(&data) {
        let level_count = container.images[0].levels.len() as u32;
        assert!(level_count >= 1);
        assert!(level_count <= header.fields[10].max(1));
    }
});
