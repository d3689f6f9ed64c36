//! Error types for Basis transcoding.

use crate::format::BasisFormat;
use thiserror::Error;

/// A failure reported by the native transcoder binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NativeError(pub String);

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised while transcoding a Basis blob.
///
/// A failing compressed transcode is retried once in the uncompressed fallback format before
/// [`TranscodeError::TranscodeFailed`] is surfaced; every other variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    /// The transcoder could not open the blob.
    #[error("Invalid Basis blob")]
    InvalidBlob,

    /// The transcoder refused to start a transcoding session for the blob.
    #[error("Failed to start transcoding session: {0}")]
    SessionStartFailed(NativeError),

    /// The blob contains no images.
    #[error("Basis blob contains no images")]
    EmptyBlob,

    /// The selected target format has no GPU-side counterpart.
    #[error("Transcode target {0:?} has no GPU texture format")]
    UnsupportedTarget(BasisFormat),

    /// Transcoding a level failed, in the fallback format as well when one applies.
    #[error("Failed to transcode image {image}, level {level} to {format:?}")]
    TranscodeFailed {
        image: u32,
        level: u32,
        format: BasisFormat,
    },
}
