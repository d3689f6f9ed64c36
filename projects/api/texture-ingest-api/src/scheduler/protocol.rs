//! Messages exchanged between the scheduler and its worker threads.
//!
//! Each worker has its own request queue, processed in order. Every worker answers on one
//! shared response queue, so responses from different workers interleave arbitrarily.

use crate::error::WorkerError;
use crate::transcoder_source::TranscoderBinary;
use std::sync::Arc;
use texture_ingest_basis::{BasisFormat, TranscodeError, TranscodedSet};

/// Scheduler to worker.
pub(crate) enum WorkerRequest {
    /// Load the transcoder binary and instantiate the module. Always the first message.
    Init { binary: Arc<TranscoderBinary> },
    Transcode(TranscodeRequest),
}

pub(crate) struct TranscodeRequest {
    pub request_id: u64,
    pub basis_data: Arc<[u8]>,
    /// Target for blobs with alpha.
    pub rgba_format: BasisFormat,
    /// Target for blobs without alpha.
    pub rgb_format: BasisFormat,
}

/// Worker to scheduler.
pub(crate) enum WorkerResponse {
    Init {
        worker: usize,
        result: Result<(), WorkerError>,
    },
    Transcode {
        worker: usize,
        request_id: u64,
        result: Result<TranscodedSet, TranscodeError>,
    },
    /// The worker thread is gone, normally or by panic. Sent exactly once per worker.
    Exited { worker: usize },
}
