//! Error types for the ingestion API.

use std::path::PathBuf;
use texture_ingest_basis::TranscodeError;
use texture_ingest_common::FormatError;
use thiserror::Error;

/// Result type for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Failures of the transcode worker infrastructure.
///
/// The worker involved is retired. [`crate::TranscodeScheduler::transcode`] retries the request
/// once on another worker before surfacing one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The worker could not load the transcoder binary or instantiate its module.
    #[error("Transcode worker {worker} failed to initialize: {reason}")]
    InitializationFailed { worker: usize, reason: String },

    /// The calling thread could not load the transcoder binary or instantiate its module.
    #[error("Inline transcoder failed to initialize: {0}")]
    InlineInitializationFailed(String),

    /// The worker thread exited (or panicked) while requests were still assigned to it.
    #[error("Transcode worker {worker} terminated with requests pending")]
    Terminated { worker: usize },

    /// The channel to or from the worker closed unexpectedly.
    #[error("Transcode worker {worker} disconnected")]
    Disconnected { worker: usize },
}

/// Errors returned by [`crate::TranscodeScheduler`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The transcode itself failed, after the fallback ladder where one applies.
    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    /// Worker infrastructure failed.
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// The scheduler is shutting down and accepts no more requests.
    #[error("Scheduler is shut down")]
    ShutDown,
}

/// The embedding renderer could not report its compression extensions.
///
/// Never surfaced by [`crate::CapabilityCache`]; it degrades to
/// [`crate::CapabilityProfile::FALLBACK`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// There is no rendering context to query.
    #[error("No rendering context available")]
    NoContext,

    /// The context exists but the query failed.
    #[error("Failed to query rendering context: {0}")]
    QueryFailed(String),
}

/// Errors fetching the transcoder binary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Reading the binary from disk failed.
    #[error("Failed to read transcoder binary from {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// The source produced zero bytes.
    #[error("Transcoder binary is empty")]
    Empty,

    /// The fetch was dropped before it produced a result.
    #[error("Transcoder binary fetch was abandoned")]
    Abandoned,
}

/// Errors returned by [`crate::TextureIngest::load`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Neither the URL's extension nor the leading bytes identify a supported container.
    #[error("Unrecognized texture container: {url}")]
    UnknownContainer { url: String },

    /// The container is malformed or unsupported.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Transcoding a Basis blob failed.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// The transcoder binary could not be fetched.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The container decoded to zero images.
    #[error("Texture {url} contains no images")]
    NoImages { url: String },
}
