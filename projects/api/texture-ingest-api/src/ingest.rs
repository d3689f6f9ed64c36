//! The ingestion entry point: bytes and a URL in, registered textures out.

use crate::capabilities::{CapabilityCache, CapabilityProfile, RenderingContext};
use crate::error::{IngestError, IngestResult, SourceError};
use crate::registrar::{register, RegisteredTextures};
use crate::scheduler::{SchedulerConfig, TranscodeScheduler};
use crate::transcoder_source::{TranscoderBinary, TranscoderSource};
use std::sync::Arc;
use texture_ingest_basis::TranscoderModuleFactory;
use texture_ingest_dds::{likely_dds, parse_dds};
use texture_ingest_ktx::{likely_ktx, parse_ktx_with_options, KtxParseOptions};
use tracing::{debug, info};

/// First bytes of a Basis Universal file (`"sB"`).
const BASIS_SIGNATURE: [u8; 2] = *b"sB";

/// The container a texture file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Ktx,
    Dds,
    Basis,
}

impl ContainerKind {
    /// Detects the container from the URL's extension, then from the leading bytes.
    pub fn detect(url: &str, bytes: &[u8]) -> Option<Self> {
        Self::from_url(url).or_else(|| Self::from_magic(bytes))
    }

    /// Matches the file extension of `url`, ignoring any query string or fragment.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let (_, extension) = file_name.rsplit_once('.')?;

        match extension.to_ascii_lowercase().as_str() {
            "ktx" => Some(ContainerKind::Ktx),
            "dds" => Some(ContainerKind::Dds),
            "basis" => Some(ContainerKind::Basis),
            _ => None,
        }
    }

    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if likely_ktx(bytes) {
            Some(ContainerKind::Ktx)
        } else if likely_dds(bytes) {
            Some(ContainerKind::Dds)
        } else if bytes.starts_with(&BASIS_SIGNATURE) {
            Some(ContainerKind::Basis)
        } else {
            None
        }
    }
}

/// Configuration for [`TextureIngest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestConfig {
    pub scheduler: SchedulerConfig,
    pub ktx: KtxParseOptions,
}

impl IngestConfig {
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.scheduler = self.scheduler.with_worker_count(worker_count);
        self
    }

    pub fn with_ktx_options(mut self, ktx: KtxParseOptions) -> Self {
        self.ktx = ktx;
        self
    }
}

/// Owns everything the pipeline shares between loads: the capability profile, the
/// transcoder binary and the worker pool.
///
/// Independent instances share nothing.
pub struct TextureIngest {
    config: IngestConfig,
    capabilities: CapabilityCache,
    binary: Arc<TranscoderBinary>,
    scheduler: TranscodeScheduler,
}

impl TextureIngest {
    pub fn new(
        config: IngestConfig,
        factory: Arc<dyn TranscoderModuleFactory>,
        source: Arc<dyn TranscoderSource>,
    ) -> Self {
        let binary = Arc::new(TranscoderBinary::new(source));
        let scheduler = TranscodeScheduler::new(config.scheduler, factory, Arc::clone(&binary));
        Self {
            config,
            capabilities: CapabilityCache::new(),
            binary,
            scheduler,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &TranscodeScheduler {
        &self.scheduler
    }

    /// The capability profile of `context`, detected once and cached.
    pub fn capabilities(&self, context: &dyn RenderingContext) -> CapabilityProfile {
        self.capabilities.get_or_detect(context)
    }

    /// Forgets the cached capability profile, e.g. after the rendering context was replaced.
    pub fn invalidate_capabilities(&self) {
        self.capabilities.invalidate();
    }

    /// Fetches the transcoder binary ahead of the first Basis load.
    pub async fn preload_transcoder(&self) -> Result<(), SourceError> {
        self.binary.get().await.map(|_| ())
    }

    /// Decodes `bytes` fetched from `url` and registers the result under `url`.
    ///
    /// KTX and DDS files are parsed as-is. Basis files are transcoded to the defaults of
    /// `context`'s [`CapabilityProfile`].
    ///
    /// # Errors
    ///
    /// - [`IngestError::UnknownContainer`] if the container cannot be identified.
    /// - [`IngestError::Format`] if a KTX or DDS file is malformed or unsupported.
    /// - [`IngestError::Scheduler`] if transcoding a Basis file failed.
    /// - [`IngestError::NoImages`] if the container held no images.
    pub async fn load(
        &self,
        url: &str,
        bytes: Vec<u8>,
        context: &dyn RenderingContext,
    ) -> IngestResult<RegisteredTextures> {
        let kind = ContainerKind::detect(url, &bytes).ok_or_else(|| {
            IngestError::UnknownContainer {
                url: url.to_owned(),
            }
        })?;
        debug!(url, ?kind, bytes = bytes.len(), "Loading texture");

        let (format, images) = match kind {
            ContainerKind::Ktx => {
                let parsed = parse_ktx_with_options(&bytes, self.config.ktx)?;
                (parsed.format, parsed.images)
            }
            ContainerKind::Dds => {
                let parsed = parse_dds(&bytes)?;
                (parsed.format, parsed.images)
            }
            ContainerKind::Basis => {
                let profile = self.capabilities(context);
                let set = self
                    .scheduler
                    .transcode(
                        bytes.into(),
                        profile.default_format_with_alpha,
                        profile.default_format_no_alpha,
                    )
                    .await?;
                if set.fallback_used {
                    info!(url, "Basis texture fell back to uncompressed output");
                }
                (set.texture_format, set.images)
            }
        };

        register(url, format, images).ok_or_else(|| IngestError::NoImages {
            url: url.to_owned(),
        })
    }
}
