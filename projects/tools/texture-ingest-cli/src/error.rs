use std::io;
use std::path::PathBuf;
use texture_ingest_api::IngestError;
use texture_ingest_common::FormatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{path}: {source}")]
    Format { path: PathBuf, source: FormatError },
    #[error("{path}: {source}")]
    Ingest { path: PathBuf, source: IngestError },
    #[error("{0}: not a KTX, DDS or Basis file")]
    UnknownContainer(PathBuf),
}
