//! GPU block-compressed formats, keyed by their WebGL internal format enum.

use derive_enum_all_values::AllValues;

// WEBGL_compressed_texture_s3tc
pub const COMPRESSED_RGB_S3TC_DXT1_EXT: u32 = 0x83F0;
pub const COMPRESSED_RGBA_S3TC_DXT1_EXT: u32 = 0x83F1;
pub const COMPRESSED_RGBA_S3TC_DXT3_EXT: u32 = 0x83F2;
pub const COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;

// WEBGL_compressed_texture_s3tc_srgb
pub const COMPRESSED_SRGB_S3TC_DXT1_EXT: u32 = 0x8C4C;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT: u32 = 0x8C4D;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT: u32 = 0x8C4E;
pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT: u32 = 0x8C4F;

// WEBGL_compressed_texture_etc
pub const COMPRESSED_R11_EAC: u32 = 0x9270;
pub const COMPRESSED_SIGNED_R11_EAC: u32 = 0x9271;
pub const COMPRESSED_RG11_EAC: u32 = 0x9272;
pub const COMPRESSED_SIGNED_RG11_EAC: u32 = 0x9273;
pub const COMPRESSED_RGB8_ETC2: u32 = 0x9274;
pub const COMPRESSED_SRGB8_ETC2: u32 = 0x9275;
pub const COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9276;
pub const COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9277;
pub const COMPRESSED_RGBA8_ETC2_EAC: u32 = 0x9278;
pub const COMPRESSED_SRGB8_ALPHA8_ETC2_EAC: u32 = 0x9279;

// WEBGL_compressed_texture_etc1
pub const COMPRESSED_RGB_ETC1_WEBGL: u32 = 0x8D64;

// WEBGL_compressed_texture_pvrtc
pub const COMPRESSED_RGB_PVRTC_4BPPV1_IMG: u32 = 0x8C00;
pub const COMPRESSED_RGB_PVRTC_2BPPV1_IMG: u32 = 0x8C01;
pub const COMPRESSED_RGBA_PVRTC_4BPPV1_IMG: u32 = 0x8C02;
pub const COMPRESSED_RGBA_PVRTC_2BPPV1_IMG: u32 = 0x8C03;

// WEBGL_compressed_texture_atc
pub const COMPRESSED_RGB_ATC_WEBGL: u32 = 0x8C92;
pub const COMPRESSED_RGBA_ATC_EXPLICIT_ALPHA_WEBGL: u32 = 0x8C93;
pub const COMPRESSED_RGBA_ATC_INTERPOLATED_ALPHA_WEBGL: u32 = 0x87EE;

// WEBGL_compressed_texture_astc
pub const COMPRESSED_RGBA_ASTC_4X4_KHR: u32 = 0x93B0;

/// A GPU block-compressed texture format.
///
/// Every variant has a fixed block footprint and byte cost, so the byte length of a
/// mip level is always derivable from its dimensions. Unknown GL enums are not
/// representable; [`CompressedFormat::from_gl`] returns [`None`] for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AllValues)]
pub enum CompressedFormat {
    /// a.k.a. BC1 without alpha
    RgbS3tcDxt1,
    /// a.k.a. BC1 with 1-bit alpha
    RgbaS3tcDxt1,
    /// a.k.a. BC2
    RgbaS3tcDxt3,
    /// a.k.a. BC3
    RgbaS3tcDxt5,
    SrgbS3tcDxt1,
    SrgbAlphaS3tcDxt1,
    SrgbAlphaS3tcDxt3,
    SrgbAlphaS3tcDxt5,
    R11Eac,
    SignedR11Eac,
    Rg11Eac,
    SignedRg11Eac,
    Rgb8Etc2,
    Srgb8Etc2,
    Rgb8PunchthroughAlpha1Etc2,
    Srgb8PunchthroughAlpha1Etc2,
    Rgba8Etc2Eac,
    Srgb8Alpha8Etc2Eac,
    RgbEtc1,
    RgbPvrtc4Bppv1,
    RgbPvrtc2Bppv1,
    RgbaPvrtc4Bppv1,
    RgbaPvrtc2Bppv1,
    RgbAtc,
    RgbaAtcExplicitAlpha,
    RgbaAtcInterpolatedAlpha,
    RgbaAstc4x4,
}

impl CompressedFormat {
    /// Resolves a WebGL compressed internal format enum.
    pub fn from_gl(value: u32) -> Option<Self> {
        Self::all_values()
            .iter()
            .copied()
            .find(|format| format.gl_internal_format() == value)
    }

    /// The WebGL `internalformat` value passed to `compressedTexImage2D`.
    pub const fn gl_internal_format(self) -> u32 {
        match self {
            CompressedFormat::RgbS3tcDxt1 => COMPRESSED_RGB_S3TC_DXT1_EXT,
            CompressedFormat::RgbaS3tcDxt1 => COMPRESSED_RGBA_S3TC_DXT1_EXT,
            CompressedFormat::RgbaS3tcDxt3 => COMPRESSED_RGBA_S3TC_DXT3_EXT,
            CompressedFormat::RgbaS3tcDxt5 => COMPRESSED_RGBA_S3TC_DXT5_EXT,
            CompressedFormat::SrgbS3tcDxt1 => COMPRESSED_SRGB_S3TC_DXT1_EXT,
            CompressedFormat::SrgbAlphaS3tcDxt1 => COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT,
            CompressedFormat::SrgbAlphaS3tcDxt3 => COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT,
            CompressedFormat::SrgbAlphaS3tcDxt5 => COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT,
            CompressedFormat::R11Eac => COMPRESSED_R11_EAC,
            CompressedFormat::SignedR11Eac => COMPRESSED_SIGNED_R11_EAC,
            CompressedFormat::Rg11Eac => COMPRESSED_RG11_EAC,
            CompressedFormat::SignedRg11Eac => COMPRESSED_SIGNED_RG11_EAC,
            CompressedFormat::Rgb8Etc2 => COMPRESSED_RGB8_ETC2,
            CompressedFormat::Srgb8Etc2 => COMPRESSED_SRGB8_ETC2,
            CompressedFormat::Rgb8PunchthroughAlpha1Etc2 => COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2,
            CompressedFormat::Srgb8PunchthroughAlpha1Etc2 => {
                COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2
            }
            CompressedFormat::Rgba8Etc2Eac => COMPRESSED_RGBA8_ETC2_EAC,
            CompressedFormat::Srgb8Alpha8Etc2Eac => COMPRESSED_SRGB8_ALPHA8_ETC2_EAC,
            CompressedFormat::RgbEtc1 => COMPRESSED_RGB_ETC1_WEBGL,
            CompressedFormat::RgbPvrtc4Bppv1 => COMPRESSED_RGB_PVRTC_4BPPV1_IMG,
            CompressedFormat::RgbPvrtc2Bppv1 => COMPRESSED_RGB_PVRTC_2BPPV1_IMG,
            CompressedFormat::RgbaPvrtc4Bppv1 => COMPRESSED_RGBA_PVRTC_4BPPV1_IMG,
            CompressedFormat::RgbaPvrtc2Bppv1 => COMPRESSED_RGBA_PVRTC_2BPPV1_IMG,
            CompressedFormat::RgbAtc => COMPRESSED_RGB_ATC_WEBGL,
            CompressedFormat::RgbaAtcExplicitAlpha => COMPRESSED_RGBA_ATC_EXPLICIT_ALPHA_WEBGL,
            CompressedFormat::RgbaAtcInterpolatedAlpha => {
                COMPRESSED_RGBA_ATC_INTERPOLATED_ALPHA_WEBGL
            }
            CompressedFormat::RgbaAstc4x4 => COMPRESSED_RGBA_ASTC_4X4_KHR,
        }
    }

    /// Width and height of one compression block, in texels.
    ///
    /// 2-bit-per-texel PVRTC stores 8x4 blocks; everything else is 4x4.
    pub const fn block_footprint(self) -> (u32, u32) {
        match self {
            CompressedFormat::RgbPvrtc2Bppv1 | CompressedFormat::RgbaPvrtc2Bppv1 => (8, 4),
            _ => (4, 4),
        }
    }

    /// Bytes occupied by a single compression block.
    pub const fn block_bytes(self) -> u32 {
        match self {
            CompressedFormat::RgbS3tcDxt1
            | CompressedFormat::RgbaS3tcDxt1
            | CompressedFormat::SrgbS3tcDxt1
            | CompressedFormat::SrgbAlphaS3tcDxt1
            | CompressedFormat::R11Eac
            | CompressedFormat::SignedR11Eac
            | CompressedFormat::Rgb8Etc2
            | CompressedFormat::Srgb8Etc2
            | CompressedFormat::Rgb8PunchthroughAlpha1Etc2
            | CompressedFormat::Srgb8PunchthroughAlpha1Etc2
            | CompressedFormat::RgbEtc1
            | CompressedFormat::RgbPvrtc4Bppv1
            | CompressedFormat::RgbPvrtc2Bppv1
            | CompressedFormat::RgbaPvrtc4Bppv1
            | CompressedFormat::RgbaPvrtc2Bppv1
            | CompressedFormat::RgbAtc => 8,
            CompressedFormat::RgbaS3tcDxt3
            | CompressedFormat::RgbaS3tcDxt5
            | CompressedFormat::SrgbAlphaS3tcDxt3
            | CompressedFormat::SrgbAlphaS3tcDxt5
            | CompressedFormat::Rg11Eac
            | CompressedFormat::SignedRg11Eac
            | CompressedFormat::Rgba8Etc2Eac
            | CompressedFormat::Srgb8Alpha8Etc2Eac
            | CompressedFormat::RgbaAtcExplicitAlpha
            | CompressedFormat::RgbaAtcInterpolatedAlpha
            | CompressedFormat::RgbaAstc4x4 => 16,
        }
    }

    /// Average bytes per texel (0.25 for 2bpp PVRTC, 0.5 for 8-byte blocks, 1.0 for 16-byte blocks).
    pub fn bytes_per_texel(self) -> f32 {
        let (block_width, block_height) = self.block_footprint();
        self.block_bytes() as f32 / (block_width * block_height) as f32
    }

    /// Whether the format stores an alpha channel.
    pub const fn has_alpha(self) -> bool {
        !matches!(
            self,
            CompressedFormat::RgbS3tcDxt1
                | CompressedFormat::SrgbS3tcDxt1
                | CompressedFormat::R11Eac
                | CompressedFormat::SignedR11Eac
                | CompressedFormat::Rg11Eac
                | CompressedFormat::SignedRg11Eac
                | CompressedFormat::Rgb8Etc2
                | CompressedFormat::Srgb8Etc2
                | CompressedFormat::RgbEtc1
                | CompressedFormat::RgbPvrtc4Bppv1
                | CompressedFormat::RgbPvrtc2Bppv1
                | CompressedFormat::RgbAtc
        )
    }

    /// Smallest footprint a stored level covers, in texels.
    ///
    /// PVRTC1 levels never cover less than 8x8 texels, or 16x8 at 2 bits per texel.
    pub const fn min_dimensions(self) -> (u32, u32) {
        match self {
            CompressedFormat::RgbPvrtc4Bppv1 | CompressedFormat::RgbaPvrtc4Bppv1 => (8, 8),
            CompressedFormat::RgbPvrtc2Bppv1 | CompressedFormat::RgbaPvrtc2Bppv1 => (16, 8),
            _ => (1, 1),
        }
    }

    /// Byte length of a `width` x `height` level, rounded up to whole blocks.
    ///
    /// [`None`] if the length does not fit in a `usize`.
    pub const fn level_byte_len(self, width: u32, height: u32) -> Option<usize> {
        let (block_width, block_height) = self.block_footprint();
        let Some((width, height)) = self.block_aligned(width, height) else {
            return None;
        };
        let blocks_wide = (width / block_width) as usize;
        let blocks_high = (height / block_height) as usize;
        match blocks_wide.checked_mul(blocks_high) {
            Some(blocks) => blocks.checked_mul(self.block_bytes() as usize),
            None => None,
        }
    }

    /// Rounds level dimensions up to the block footprint, never below [`Self::min_dimensions`].
    ///
    /// [`None`] if an aligned dimension does not fit in a `u32`.
    pub const fn block_aligned(self, width: u32, height: u32) -> Option<(u32, u32)> {
        let (block_width, block_height) = self.block_footprint();
        let (min_width, min_height) = self.min_dimensions();
        let width = if width < min_width { min_width } else { width };
        let height = if height < min_height { min_height } else { height };
        match (
            width.div_ceil(block_width).checked_mul(block_width),
            height.div_ceil(block_height).checked_mul(block_height),
        ) {
            (Some(width), Some(height)) => Some((width, height)),
            _ => None,
        }
    }
}
