//! Transcoder backend linking the Basis Universal C++ transcoder through `basis-universal`.
//!
//! The transcoder is compiled into the binary, so the payload handed to
//! [`NativeTranscoder::instantiate`] only has to be present; its bytes are not interpreted.

use crate::error::NativeError;
use crate::format::BasisFormat;
use crate::transcoder::{BasisFile, TranscoderModule, TranscoderModuleFactory};
use basis_universal::{TranscodeParameters, Transcoder, TranscoderTextureFormat};
use std::sync::Once;

static TRANSCODER_INIT: Once = Once::new();

/// Factory for modules backed by the statically linked Basis Universal transcoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTranscoder;

impl TranscoderModuleFactory for NativeTranscoder {
    fn instantiate(&self, _payload: &[u8]) -> Result<Box<dyn TranscoderModule>, NativeError> {
        TRANSCODER_INIT.call_once(basis_universal::transcoder_init);
        Ok(Box::new(NativeModule))
    }
}

struct NativeModule;

impl TranscoderModule for NativeModule {
    fn open<'a>(&'a self, blob: &'a [u8]) -> Option<Box<dyn BasisFile + 'a>> {
        let transcoder = Transcoder::new();
        if !transcoder.validate_header(blob) {
            return None;
        }
        Some(Box::new(NativeFile {
            transcoder,
            data: blob,
            prepared: false,
        }))
    }
}

struct NativeFile<'a> {
    transcoder: Transcoder,
    data: &'a [u8],
    prepared: bool,
}

impl Drop for NativeFile<'_> {
    fn drop(&mut self) {
        if self.prepared {
            self.transcoder.end_transcoding();
        }
    }
}

impl BasisFile for NativeFile<'_> {
    fn has_alpha(&self) -> bool {
        self.transcoder
            .image_info(self.data, 0)
            .is_some_and(|info| info.m_alpha_flag)
    }

    fn start_transcoding(&mut self) -> Result<(), NativeError> {
        self.transcoder
            .prepare_transcoding(self.data)
            .map_err(|_| NativeError::new("prepare_transcoding failed"))?;
        self.prepared = true;
        Ok(())
    }

    fn image_count(&self) -> u32 {
        self.transcoder.image_count(self.data)
    }

    fn level_count(&self, image: u32) -> u32 {
        self.transcoder.image_level_count(self.data, image)
    }

    fn level_dimensions(&self, image: u32, level: u32) -> Option<(u32, u32)> {
        let description = self
            .transcoder
            .image_level_description(self.data, image, level)?;
        Some((description.original_width, description.original_height))
    }

    fn transcoded_size(&self, image: u32, level: u32, format: BasisFormat) -> Option<usize> {
        let (width, height) = self.level_dimensions(image, level)?;
        format.texture_format()?.level_byte_len(width, height)
    }

    fn transcode_level(
        &mut self,
        dst: &mut [u8],
        image: u32,
        level: u32,
        format: BasisFormat,
    ) -> Result<(), NativeError> {
        let parameters = TranscodeParameters {
            image_index: image,
            level_index: level,
            ..Default::default()
        };
        let bytes = self
            .transcoder
            .transcode_image_level(self.data, native_format(format), parameters)
            .map_err(|error| NativeError::new(format!("{error:?}")))?;

        if bytes.len() != dst.len() {
            return Err(NativeError::new(format!(
                "transcoded {} bytes, expected {}",
                bytes.len(),
                dst.len()
            )));
        }
        dst.copy_from_slice(&bytes);
        Ok(())
    }
}

fn native_format(format: BasisFormat) -> TranscoderTextureFormat {
    match format {
        BasisFormat::Etc1 => TranscoderTextureFormat::ETC1_RGB,
        BasisFormat::Etc2 => TranscoderTextureFormat::ETC2_RGBA,
        BasisFormat::Bc1 => TranscoderTextureFormat::BC1_RGB,
        BasisFormat::Bc3 => TranscoderTextureFormat::BC3_RGBA,
        BasisFormat::Bc4 => TranscoderTextureFormat::BC4_R,
        BasisFormat::Bc5 => TranscoderTextureFormat::BC5_RG,
        BasisFormat::Bc7 => TranscoderTextureFormat::BC7_RGBA,
        BasisFormat::Pvrtc1_4Rgb => TranscoderTextureFormat::PVRTC1_4_RGB,
        BasisFormat::Pvrtc1_4Rgba => TranscoderTextureFormat::PVRTC1_4_RGBA,
        BasisFormat::Astc4x4 => TranscoderTextureFormat::ASTC_4x4_RGBA,
        BasisFormat::AtcRgb => TranscoderTextureFormat::ATC_RGB,
        BasisFormat::AtcRgbaInterpolatedAlpha => TranscoderTextureFormat::ATC_RGBA,
        BasisFormat::Rgba32 => TranscoderTextureFormat::RGBA32,
        BasisFormat::Rgb565 => TranscoderTextureFormat::RGB565,
        BasisFormat::Bgr565 => TranscoderTextureFormat::BGR565,
        BasisFormat::Rgba4444 => TranscoderTextureFormat::RGBA4444,
    }
}
