//! Common test imports and utilities for transcode engine tests.
#![allow(unused_imports)]

pub use rstest::rstest;

pub use crate::mock::{MockBehavior, MockBlob, MockGate, MockTranscoder};
pub use crate::transcoder::{TranscoderModule, TranscoderModuleFactory};
pub use texture_ingest_common::{CompressedFormat, TextureFormat, UncompressedFormat};

/// Instantiates a mock module scripted by `behavior`.
pub fn instantiate(behavior: MockBehavior) -> Box<dyn TranscoderModule> {
    MockTranscoder::new(behavior)
        .instantiate(&[])
        .expect("mock instantiation only fails when asked to")
}
