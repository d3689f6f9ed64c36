//! Common test imports and utilities for the ingestion API tests.
#![allow(unused_imports)]

pub use futures::executor::block_on;
pub use rstest::rstest;

pub use texture_ingest_basis::mock::{MockBehavior, MockBlob, MockGate, MockTranscoder};
pub use texture_ingest_basis::{BasisFormat, TranscoderModule, TranscoderModuleFactory};
pub use texture_ingest_common::{
    CompressedFormat, DecodedImage, LevelBuffer, TextureFormat, UncompressedFormat,
};

/// Instantiates a mock module scripted by `behavior`.
pub fn instantiate(behavior: MockBehavior) -> Box<dyn TranscoderModule> {
    MockTranscoder::new(behavior)
        .instantiate(&[])
        .expect("mock instantiation only fails when asked to")
}
