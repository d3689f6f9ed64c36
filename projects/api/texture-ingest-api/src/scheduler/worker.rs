//! The transcode worker thread.

use super::protocol::{TranscodeRequest, WorkerRequest, WorkerResponse};
use crate::error::{SourceError, WorkerError};
use crossbeam_channel::{Receiver, Sender};
use futures::executor::block_on;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use texture_ingest_basis::{transcode_basis, TranscoderModule, TranscoderModuleFactory};
use tracing::{debug, trace};

/// Spawns worker `id`, which serves `requests` until the queue closes.
pub(crate) fn spawn_worker(
    id: usize,
    factory: Arc<dyn TranscoderModuleFactory>,
    requests: Receiver<WorkerRequest>,
    responses: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("texture-ingest-worker-{id}"))
        .spawn(move || run_worker(id, factory.as_ref(), requests, responses))
}

/// Reports [`WorkerResponse::Exited`] however the thread ends, unwinding included.
struct ExitGuard {
    worker: usize,
    responses: Sender<WorkerResponse>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let _ = self.responses.send(WorkerResponse::Exited {
            worker: self.worker,
        });
    }
}

fn run_worker(
    id: usize,
    factory: &dyn TranscoderModuleFactory,
    requests: Receiver<WorkerRequest>,
    responses: Sender<WorkerResponse>,
) {
    let _exit = ExitGuard {
        worker: id,
        responses: responses.clone(),
    };
    let mut module: Option<Box<dyn TranscoderModule>> = None;

    for request in requests.iter() {
        match request {
            WorkerRequest::Init { binary } => {
                match initialize(id, factory, block_on(binary.get())) {
                    Ok(instance) => {
                        module = Some(instance);
                        let _ = responses.send(WorkerResponse::Init {
                            worker: id,
                            result: Ok(()),
                        });
                        debug!(worker = id, "Transcode worker ready");
                    }
                    Err(error) => {
                        let _ = responses.send(WorkerResponse::Init {
                            worker: id,
                            result: Err(error),
                        });
                        return;
                    }
                }
            }
            WorkerRequest::Transcode(request) => {
                // Init always precedes the first transcode on the queue.
                let Some(module) = module.as_deref() else {
                    return;
                };
                let _ = responses.send(transcode(id, module, request));
            }
        }
    }
    trace!(worker = id, "Transcode worker queue closed");
}

fn initialize(
    id: usize,
    factory: &dyn TranscoderModuleFactory,
    payload: Result<Arc<[u8]>, SourceError>,
) -> Result<Box<dyn TranscoderModule>, WorkerError> {
    let failed = |reason: String| WorkerError::InitializationFailed { worker: id, reason };
    let payload = payload.map_err(|error| failed(error.to_string()))?;
    factory
        .instantiate(&payload)
        .map_err(|error| failed(error.to_string()))
}

fn transcode(id: usize, module: &dyn TranscoderModule, request: TranscodeRequest) -> WorkerResponse {
    let TranscodeRequest {
        request_id,
        basis_data,
        rgba_format,
        rgb_format,
    } = request;
    trace!(worker = id, request_id, bytes = basis_data.len(), "Transcoding");

    WorkerResponse::Transcode {
        worker: id,
        request_id,
        result: transcode_basis(module, &basis_data, rgba_format, rgb_format),
    }
}
