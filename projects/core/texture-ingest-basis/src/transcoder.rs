//! The seam between the transcode engine and a native Basis transcoder binding.

use crate::error::NativeError;
use crate::format::BasisFormat;

/// Creates transcoder modules from the transcoder payload (the WASM or native binary bytes).
///
/// One factory is shared by every worker; each worker instantiates its own module once and
/// reuses it for all of its requests.
pub trait TranscoderModuleFactory: Send + Sync {
    /// Initializes a transcoder module from `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`NativeError`] if the payload cannot be loaded. The worker that requested the
    /// module is then considered failed.
    fn instantiate(&self, payload: &[u8]) -> Result<Box<dyn TranscoderModule>, NativeError>;
}

/// An initialized transcoder able to open Basis blobs.
pub trait TranscoderModule: Send {
    /// Opens `blob` for inspection and transcoding.
    ///
    /// Returns `None` if the blob is not a valid Basis file. The returned file is closed
    /// when dropped.
    fn open<'a>(&'a self, blob: &'a [u8]) -> Option<Box<dyn BasisFile + 'a>>;
}

/// One open Basis blob.
///
/// Mirrors the native transcoder's file object: image and level queries are cheap, while
/// [`BasisFile::transcode_level`] requires a prior successful
/// [`BasisFile::start_transcoding`].
pub trait BasisFile {
    /// Whether the source data has an alpha channel. Decides which candidate format is used.
    fn has_alpha(&self) -> bool;

    /// Starts a transcoding session; must succeed before any level is transcoded.
    fn start_transcoding(&mut self) -> Result<(), NativeError>;

    /// Number of images in the blob.
    fn image_count(&self) -> u32;

    /// Number of mip levels of `image`.
    fn level_count(&self, image: u32) -> u32;

    /// Original (unpadded) width and height of a level.
    fn level_dimensions(&self, image: u32, level: u32) -> Option<(u32, u32)>;

    /// Bytes needed to hold a level transcoded to `format`.
    fn transcoded_size(&self, image: u32, level: u32, format: BasisFormat) -> Option<usize>;

    /// Transcodes one level into `dst`, which is exactly
    /// [`BasisFile::transcoded_size`] bytes long.
    fn transcode_level(
        &mut self,
        dst: &mut [u8],
        image: u32,
        level: u32,
        format: BasisFormat,
    ) -> Result<(), NativeError>;
}
