//! Transcoder target formats and their GPU-side counterparts.

use derive_enum_all_values::AllValues;
use texture_ingest_common::{CompressedFormat, TextureFormat, UncompressedFormat};

/// A Basis Universal transcode target.
///
/// The discriminants are the values the native transcoder expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AllValues)]
#[repr(u32)]
pub enum BasisFormat {
    Etc1 = 0,
    Etc2 = 1,
    Bc1 = 2,
    Bc3 = 3,
    Bc4 = 4,
    Bc5 = 5,
    Bc7 = 6,
    Pvrtc1_4Rgb = 8,
    Pvrtc1_4Rgba = 9,
    Astc4x4 = 10,
    AtcRgb = 11,
    AtcRgbaInterpolatedAlpha = 12,
    Rgba32 = 13,
    Rgb565 = 14,
    Bgr565 = 15,
    Rgba4444 = 16,
}

impl BasisFormat {
    /// The universal fallback: every transcoder can produce it and every GPU can sample it.
    pub const FALLBACK: BasisFormat = BasisFormat::Rgb565;

    pub const fn native_value(self) -> u32 {
        self as u32
    }

    pub fn from_native(value: u32) -> Option<Self> {
        Self::all_values()
            .iter()
            .copied()
            .find(|format| format.native_value() == value)
    }

    /// Whether transcoding to this format keeps the alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            BasisFormat::Etc2
                | BasisFormat::Bc3
                | BasisFormat::Bc7
                | BasisFormat::Pvrtc1_4Rgba
                | BasisFormat::Astc4x4
                | BasisFormat::AtcRgbaInterpolatedAlpha
                | BasisFormat::Rgba32
                | BasisFormat::Rgba4444
        )
    }

    /// The GPU texture format the transcoded bytes are uploaded as.
    ///
    /// `None` for targets no WebGL compression extension exposes (BC4, BC5, BC7, BGR565).
    pub const fn texture_format(self) -> Option<TextureFormat> {
        Some(match self {
            BasisFormat::Etc1 => TextureFormat::Compressed(CompressedFormat::RgbEtc1),
            BasisFormat::Etc2 => TextureFormat::Compressed(CompressedFormat::Rgba8Etc2Eac),
            BasisFormat::Bc1 => TextureFormat::Compressed(CompressedFormat::RgbS3tcDxt1),
            BasisFormat::Bc3 => TextureFormat::Compressed(CompressedFormat::RgbaS3tcDxt5),
            BasisFormat::Pvrtc1_4Rgb => TextureFormat::Compressed(CompressedFormat::RgbPvrtc4Bppv1),
            BasisFormat::Pvrtc1_4Rgba => {
                TextureFormat::Compressed(CompressedFormat::RgbaPvrtc4Bppv1)
            }
            BasisFormat::Astc4x4 => TextureFormat::Compressed(CompressedFormat::RgbaAstc4x4),
            BasisFormat::AtcRgb => TextureFormat::Compressed(CompressedFormat::RgbAtc),
            BasisFormat::AtcRgbaInterpolatedAlpha => {
                TextureFormat::Compressed(CompressedFormat::RgbaAtcInterpolatedAlpha)
            }
            BasisFormat::Rgba32 => TextureFormat::Uncompressed(UncompressedFormat::RGBA8),
            BasisFormat::Rgb565 => TextureFormat::Uncompressed(UncompressedFormat::RGB565),
            BasisFormat::Rgba4444 => TextureFormat::Uncompressed(UncompressedFormat::RGBA4444),
            BasisFormat::Bc4 | BasisFormat::Bc5 | BasisFormat::Bc7 | BasisFormat::Bgr565 => {
                return None
            }
        })
    }

    /// The transcode target producing `format`, if Basis can produce it.
    pub const fn from_compressed(format: CompressedFormat) -> Option<Self> {
        Some(match format {
            CompressedFormat::RgbEtc1 => BasisFormat::Etc1,
            CompressedFormat::RgbS3tcDxt1 => BasisFormat::Bc1,
            CompressedFormat::RgbaS3tcDxt5 => BasisFormat::Bc3,
            CompressedFormat::RgbPvrtc4Bppv1 => BasisFormat::Pvrtc1_4Rgb,
            CompressedFormat::RgbaPvrtc4Bppv1 => BasisFormat::Pvrtc1_4Rgba,
            CompressedFormat::RgbAtc => BasisFormat::AtcRgb,
            CompressedFormat::RgbaAtcInterpolatedAlpha => BasisFormat::AtcRgbaInterpolatedAlpha,
            CompressedFormat::RgbaAstc4x4 => BasisFormat::Astc4x4,
            CompressedFormat::Rgba8Etc2Eac => BasisFormat::Etc2,
            _ => return None,
        })
    }
}
