#![no_main]

// Arbitrary bytes must parse or fail with an error, never panic. Every level of a successful
// parse holds exactly the bytes its format and mip dimensions require.

use libfuzzer_sys::fuzz_target;
use texture_ingest_common::mip_dimensions;
use texture_ingest_dds::parse_dds;

fuzz_target!(|data: &[u8]| {
    let Ok(container) = parse_dds(data) else {
        return;
    };

    assert!(!container.images.is_empty(), "at least one image");
    let mut total = 0;
    for image in &container.images {
        assert!(!image.levels.is_empty(), "at least one level");
        for (index, level) in image.levels.iter().enumerate() {
            let (width, height) = mip_dimensions(image.width, image.height, index as u32);
            assert_eq!(
                Some(level.bytes.len()),
                container.format.level_byte_len(width, height),
                "level {index} has the size its dimensions require"
            );
            total += level.bytes.len();
        }
    }
    assert!(total <= data.len(), "levels never exceed the input");
});
