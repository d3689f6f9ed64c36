//! Where the transcoder binary comes from, and fetching it only once.

use crate::error::SourceError;
use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Produces the transcoder payload (the WASM module or native binary bytes).
pub trait TranscoderSource: Send + Sync {
    /// Starts fetching the payload.
    fn fetch(&self) -> BoxFuture<'static, Result<Arc<[u8]>, SourceError>>;
}

/// A payload already held in memory.
#[derive(Debug, Clone)]
pub struct StaticSource(Arc<[u8]>);

impl StaticSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }
}

impl TranscoderSource for StaticSource {
    fn fetch(&self) -> BoxFuture<'static, Result<Arc<[u8]>, SourceError>> {
        future::ready(Ok(Arc::clone(&self.0))).boxed()
    }
}

/// A payload read from disk on a dedicated thread.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TranscoderSource for FileSource {
    fn fetch(&self) -> BoxFuture<'static, Result<Arc<[u8]>, SourceError>> {
        let path = self.path.clone();
        let (sender, receiver) = oneshot::channel();

        let spawned = thread::Builder::new()
            .name("texture-ingest-fetch".into())
            .spawn(move || {
                let result = std::fs::read(&path)
                    .map(Arc::<[u8]>::from)
                    .map_err(|error| SourceError::Io {
                        path,
                        message: error.to_string(),
                    });
                let _ = sender.send(result);
            });
        if let Err(error) = spawned {
            return future::ready(Err(SourceError::Io {
                path: self.path.clone(),
                message: error.to_string(),
            }))
            .boxed();
        }

        receiver
            .map(|received| received.unwrap_or(Err(SourceError::Abandoned)))
            .boxed()
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<[u8]>, SourceError>>>;

enum FetchState {
    Idle,
    Fetching(SharedFetch),
    Ready(Arc<[u8]>),
}

/// The transcoder payload, fetched at most once at a time and cached once fetched.
///
/// Concurrent callers of [`TranscoderBinary::get`] share one in-flight fetch. A failed fetch is
/// not cached; the next call starts a new one.
pub struct TranscoderBinary {
    source: Arc<dyn TranscoderSource>,
    state: Mutex<FetchState>,
}

impl TranscoderBinary {
    pub fn new(source: Arc<dyn TranscoderSource>) -> Self {
        Self {
            source,
            state: Mutex::new(FetchState::Idle),
        }
    }

    /// The payload, if it has already been fetched.
    pub fn cached(&self) -> Option<Arc<[u8]>> {
        match &*self.state.lock() {
            FetchState::Ready(bytes) => Some(Arc::clone(bytes)),
            _ => None,
        }
    }

    /// Fetches the payload, or joins the fetch already running.
    ///
    /// # Errors
    ///
    /// Returns the [`SourceError`] of the fetch this call joined, or [`SourceError::Empty`] if
    /// the source produced no bytes.
    pub async fn get(&self) -> Result<Arc<[u8]>, SourceError> {
        let fetch = {
            let mut state = self.state.lock();
            match &*state {
                FetchState::Ready(bytes) => return Ok(Arc::clone(bytes)),
                FetchState::Fetching(fetch) => fetch.clone(),
                FetchState::Idle => {
                    debug!("Fetching transcoder binary");
                    let fetch = self
                        .source
                        .fetch()
                        .map(|result| match result {
                            Ok(bytes) if bytes.is_empty() => Err(SourceError::Empty),
                            other => other,
                        })
                        .boxed()
                        .shared();
                    *state = FetchState::Fetching(fetch.clone());
                    fetch
                }
            }
        };

        let result = fetch.clone().await;

        let mut state = self.state.lock();
        if let FetchState::Fetching(current) = &*state {
            if Shared::ptr_eq(current, &fetch) {
                *state = match &result {
                    Ok(bytes) => FetchState::Ready(Arc::clone(bytes)),
                    Err(error) => {
                        warn!(%error, "Transcoder binary fetch failed");
                        FetchState::Idle
                    }
                };
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;
    use futures::executor::block_on;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Poll;

    /// Counts fetches; the first `failures` fetches fail.
    struct CountingSource {
        fetches: AtomicUsize,
        failures: AtomicUsize,
    }

    impl CountingSource {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                failures: AtomicUsize::new(failures),
            })
        }
    }

    impl TranscoderSource for CountingSource {
        fn fetch(&self) -> BoxFuture<'static, Result<Arc<[u8]>, SourceError>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            let result: Result<Arc<[u8]>, SourceError> = if failing {
                Err(SourceError::Abandoned)
            } else {
                Ok(Arc::from(&b"payload"[..]))
            };
            // Yield once so concurrent callers observe the in-flight fetch.
            let mut yielded = false;
            future::poll_fn(move |cx| {
                if yielded {
                    return Poll::Ready(result.clone());
                }
                yielded = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            })
            .boxed()
        }
    }

    #[test]
    fn concurrent_callers_share_one_fetch() {
        let source = CountingSource::new(0);
        let binary = TranscoderBinary::new(source.clone());

        let results = block_on(join_all((0..4).map(|_| binary.get())));
        assert!(results.iter().all(|result| result.as_deref() == Ok(&b"payload"[..])));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(binary.cached().is_some());

        block_on(binary.get()).unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_fetch_is_retried_by_next_call() {
        let source = CountingSource::new(1);
        let binary = TranscoderBinary::new(source.clone());

        assert_eq!(block_on(binary.get()), Err(SourceError::Abandoned));
        assert!(binary.cached().is_none());
        assert!(block_on(binary.get()).is_ok());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_payload_is_an_error() {
        let binary = TranscoderBinary::new(Arc::new(StaticSource::new(Vec::new())));
        assert_eq!(block_on(binary.get()), Err(SourceError::Empty));
    }

    #[test]
    fn file_source_reads_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"transcoder").unwrap();

        let binary = TranscoderBinary::new(Arc::new(FileSource::new(file.path())));
        assert_eq!(block_on(binary.get()).unwrap().as_ref(), b"transcoder");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.wasm");

        let binary = TranscoderBinary::new(Arc::new(FileSource::new(&path)));
        assert!(matches!(
            block_on(binary.get()),
            Err(SourceError::Io { path: reported, .. }) if reported == path
        ));
    }
}
