//! High-level texture ingestion.
//!
//! Turns KTX, DDS and Basis Universal files into GPU-ready, uniformly formatted texture
//! resources keyed for a texture cache.
//!
//! - [`capabilities`]: which Basis transcode targets the rendering context can sample.
//! - [`scheduler`]: a worker pool transcoding Basis blobs off the calling thread.
//! - [`registrar`]: cache keys for decoded images.
//! - [`TextureIngest`]: the context object tying these together.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use futures::executor::block_on;
//! use texture_ingest_api::{ExtensionSet, IngestConfig, StaticSource, TextureIngest};
//! use texture_ingest_basis::mock::{MockBehavior, MockBlob, MockTranscoder};
//!
//! let ingest = TextureIngest::new(
//!     IngestConfig::default().with_worker_count(2),
//!     Arc::new(MockTranscoder::new(MockBehavior::default())),
//!     Arc::new(StaticSource::new(&b"transcoder"[..])),
//! );
//! let context = ExtensionSet::from_names(["WEBGL_compressed_texture_s3tc"]);
//!
//! let blob = MockBlob::single(64, 64, 2).encode();
//! let textures = block_on(ingest.load("foo.basis", blob, &context)).unwrap();
//! assert_eq!(textures.keys(), ["foo.basis", "foo.basis-1"]);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod capabilities;
pub mod error;
pub mod ingest;
pub mod registrar;
pub mod scheduler;
pub mod transcoder_source;

pub use capabilities::{
    detect_capabilities, CapabilityCache, CapabilityProfile, CompressionExtension, ExtensionSet,
    RenderingContext,
};
pub use error::{
    CapabilityError, IngestError, IngestResult, SchedulerError, SourceError, WorkerError,
};
pub use ingest::{ContainerKind, IngestConfig, TextureIngest};
pub use registrar::{register, RegisteredTextures, TextureResource};
pub use scheduler::{
    PendingTranscode, SchedulerConfig, SchedulerStats, TranscodeScheduler, WorkerState,
    WorkerStats,
};
pub use transcoder_source::{FileSource, StaticSource, TranscoderBinary, TranscoderSource};

pub use texture_ingest_basis::{BasisFormat, TranscoderModuleFactory};

#[cfg(feature = "basis-universal")]
pub use texture_ingest_basis::native::NativeTranscoder;

#[cfg(feature = "mock")]
pub use texture_ingest_basis::mock;

#[cfg(test)]
pub(crate) mod test_prelude;
