//! Basis Universal transcoding for the texture-ingest pipeline.
//!
//! The transcoder itself is a native (or WASM) binding this crate treats as opaque. It is
//! reached through three traits:
//!
//! - [`TranscoderModuleFactory`]: turns the transcoder payload into a live [`TranscoderModule`].
//! - [`TranscoderModule`]: opens Basis blobs.
//! - [`BasisFile`]: one open blob; reports images, levels and sizes and transcodes levels.
//!
//! [`transcode_basis`] drives a [`BasisFile`] to produce a [`TranscodedSet`] in a single format,
//! falling back to uncompressed [`BasisFormat::Rgb565`] when the preferred format fails.
//!
//! # Features
//!
//! - `basis-universal`: a native backend using the `basis-universal` crate.
//! - `mock`: [`mock::MockTranscoder`], a scriptable in-memory transcoder for tests.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod engine;
pub mod error;
pub mod format;
pub mod transcoder;

#[cfg(feature = "basis-universal")]
#[cfg_attr(docsrs, doc(cfg(feature = "basis-universal")))]
pub mod native;

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

pub use engine::{transcode_basis, TranscodedSet};
pub use error::{NativeError, TranscodeError};
pub use format::BasisFormat;
pub use transcoder::{BasisFile, TranscoderModule, TranscoderModuleFactory};

#[cfg(test)]
pub(crate) mod test_prelude;
