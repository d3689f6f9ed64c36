//! The format capability table.
//!
//! Maps every pixel format a decoded image may carry to its byte cost. Formats are
//! closed enums; a value that cannot be resolved through this table is a hard error
//! at the parsing site.

pub mod compressed;
pub mod uncompressed;

pub use compressed::CompressedFormat;
pub use uncompressed::{GlFormat, GlType, UncompressedFormat};

/// The pixel format shared by every level of every image in a decoded set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Compressed(CompressedFormat),
    Uncompressed(UncompressedFormat),
}

impl TextureFormat {
    pub const fn is_compressed(self) -> bool {
        matches!(self, TextureFormat::Compressed(_))
    }

    /// Byte length of one mip level with the given (unaligned) dimensions.
    ///
    /// Compressed formats round up to whole blocks; uncompressed formats are tightly packed.
    /// [`None`] if the length does not fit in a `usize`.
    pub const fn level_byte_len(self, width: u32, height: u32) -> Option<usize> {
        match self {
            TextureFormat::Compressed(format) => format.level_byte_len(width, height),
            TextureFormat::Uncompressed(format) => format.level_byte_len(width, height),
        }
    }

    /// Dimensions as stored: block aligned for compressed formats, unchanged otherwise.
    pub const fn storage_dimensions(self, width: u32, height: u32) -> Option<(u32, u32)> {
        match self {
            TextureFormat::Compressed(format) => format.block_aligned(width, height),
            TextureFormat::Uncompressed(_) => Some((width, height)),
        }
    }

    /// Average bytes per texel; fractional for block-compressed formats.
    pub fn bytes_per_texel(self) -> f32 {
        match self {
            TextureFormat::Compressed(format) => format.bytes_per_texel(),
            TextureFormat::Uncompressed(format) => format.bytes_per_pixel() as f32,
        }
    }
}

impl From<CompressedFormat> for TextureFormat {
    fn from(format: CompressedFormat) -> Self {
        TextureFormat::Compressed(format)
    }
}

impl From<UncompressedFormat> for TextureFormat {
    fn from(format: UncompressedFormat) -> Self {
        TextureFormat::Uncompressed(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_dimensions_only_align_compressed_formats() {
        let compressed = TextureFormat::from(CompressedFormat::RgbaS3tcDxt5);
        let uncompressed = TextureFormat::from(UncompressedFormat::RGBA8);
        assert_eq!(compressed.storage_dimensions(2, 2), Some((4, 4)));
        assert_eq!(uncompressed.storage_dimensions(2, 2), Some((2, 2)));
    }

    #[test]
    fn level_byte_len_dispatches_on_kind() {
        assert_eq!(
            TextureFormat::from(CompressedFormat::RgbaS3tcDxt5).level_byte_len(2, 2),
            Some(16)
        );
        assert_eq!(
            TextureFormat::from(UncompressedFormat::RGBA8).level_byte_len(2, 2),
            Some(16)
        );
    }
}
