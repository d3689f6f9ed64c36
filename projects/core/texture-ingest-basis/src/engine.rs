//! Transcoding a whole Basis blob to one uniform format.

use crate::error::TranscodeError;
use crate::format::BasisFormat;
use crate::transcoder::{BasisFile, TranscoderModule};
use texture_ingest_common::{DecodedImage, LevelBuffer, TextureFormat};
use tracing::{debug, warn};

/// Every image of a blob, transcoded to a single format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodedSet {
    /// The transcode target actually used.
    pub basis_format: BasisFormat,
    /// GPU format of every level in `images`.
    pub texture_format: TextureFormat,
    pub images: Vec<DecodedImage>,
    /// `true` when the preferred format failed and the set was redone in [`BasisFormat::FALLBACK`].
    pub fallback_used: bool,
}

/// Transcodes `blob` to `with_alpha` or `no_alpha`, chosen by the blob's alpha flag.
///
/// Runs in two phases. The first transcodes every level of every image to the chosen target.
/// If any level fails, everything produced so far is discarded and the whole set is redone in
/// [`BasisFormat::FALLBACK`], base level only, so a set never mixes formats. Targets that are
/// already uncompressed transcode the base level only and have no further fallback.
///
/// # Errors
///
/// - [`TranscodeError::InvalidBlob`] if the module cannot open the blob.
/// - [`TranscodeError::UnsupportedTarget`] if the chosen target has no GPU format.
/// - [`TranscodeError::SessionStartFailed`] if the transcoding session does not start.
/// - [`TranscodeError::EmptyBlob`] if the blob has no images.
/// - [`TranscodeError::TranscodeFailed`] if a level fails in the last format attempted.
pub fn transcode_basis(
    module: &dyn TranscoderModule,
    blob: &[u8],
    with_alpha: BasisFormat,
    no_alpha: BasisFormat,
) -> Result<TranscodedSet, TranscodeError> {
    let mut file = module.open(blob).ok_or(TranscodeError::InvalidBlob)?;

    let target = if file.has_alpha() { with_alpha } else { no_alpha };
    let texture_format = target
        .texture_format()
        .ok_or(TranscodeError::UnsupportedTarget(target))?;

    file.start_transcoding()
        .map_err(TranscodeError::SessionStartFailed)?;

    if file.image_count() == 0 {
        return Err(TranscodeError::EmptyBlob);
    }

    let first_attempt = transcode_images(file.as_mut(), target, texture_format);
    match first_attempt {
        Ok(images) => Ok(TranscodedSet {
            basis_format: target,
            texture_format,
            images,
            fallback_used: false,
        }),
        Err(error) if texture_format.is_compressed() => {
            warn!(
                %error,
                "Compressed transcode failed, retrying all images as {:?}",
                BasisFormat::FALLBACK
            );
            let fallback_format = BasisFormat::FALLBACK
                .texture_format()
                .ok_or(TranscodeError::UnsupportedTarget(BasisFormat::FALLBACK))?;
            let images = transcode_images(file.as_mut(), BasisFormat::FALLBACK, fallback_format)?;
            Ok(TranscodedSet {
                basis_format: BasisFormat::FALLBACK,
                texture_format: fallback_format,
                images,
                fallback_used: true,
            })
        }
        Err(error) => Err(error),
    }
}

/// Transcodes every image to `format`. Uncompressed formats get the base level only.
fn transcode_images<'a>(
    file: &mut (dyn BasisFile + 'a),
    format: BasisFormat,
    texture_format: TextureFormat,
) -> Result<Vec<DecodedImage>, TranscodeError> {
    let image_count = file.image_count();
    let mut images = Vec::with_capacity(image_count as usize);

    for image_index in 0..image_count {
        let level_count = if texture_format.is_compressed() {
            file.level_count(image_index).max(1)
        } else {
            1
        };

        let failed = TranscodeError::TranscodeFailed {
            image: image_index,
            level: 0,
            format,
        };
        let (width, height) = file.level_dimensions(image_index, 0).ok_or(failed)?;
        let mut image = DecodedImage::new(image_index, width, height);

        for level in 0..level_count {
            let failed = TranscodeError::TranscodeFailed {
                image: image_index,
                level,
                format,
            };
            let (level_width, level_height) = file
                .level_dimensions(image_index, level)
                .ok_or(failed.clone())?;
            let size = file
                .transcoded_size(image_index, level, format)
                .ok_or(failed.clone())?;
            let (stored_width, stored_height) = texture_format
                .storage_dimensions(level_width, level_height)
                .ok_or(failed.clone())?;

            let mut bytes = vec![0u8; size];
            if let Err(error) = file.transcode_level(&mut bytes, image_index, level, format) {
                debug!(%error, image = image_index, level, ?format, "Level transcode failed");
                return Err(failed);
            }

            image
                .levels
                .push(LevelBuffer::new(level, stored_width, stored_height, bytes));
        }

        debug!(
            image = image_index,
            levels = image.levels.len(),
            ?format,
            "Transcoded image"
        );
        images.push(image);
    }

    Ok(images)
}
