#![no_main]

// Arbitrary bytes must parse or fail with an error, never panic. Successful parses are
// checked for a consistent mip chain.

use libfuzzer_sys::{arbitrary, fuzz_target};
use texture_ingest_ktx::{parse_ktx_with_options, KtxParseOptions};

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Input {
    pub load_key_value_data: bool,
    pub data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let options = KtxParseOptions::default().with_key_value_data(input.load_key_value_data);
    let Ok(container) = parse_ktx_with_options(&input.data, options) else {
        return;
    };

    assert_eq!(container.images.len(), 1, "KTX yields exactly one image");
    let image = &container.images[0];
    assert!(!image.levels.is_empty(), "at least one level");
    for (index, level) in image.levels.iter().enumerate() {
        assert_eq!(level.level_index, index as u32, "levels are ordered");
    }
    for pair in image.levels.windows(2) {
        assert!(pair[1].width <= pair[0].width, "widths never grow");
        assert!(pair[1].height <= pair[0].height, "heights never grow");
    }
    assert_eq!(
        container.key_value_data.is_some(),
        input.load_key_value_data,
        "metadata is decoded only on request"
    );
});
