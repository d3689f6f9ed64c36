use super::constants::*;
use alloc::vec::Vec;
use endian_writer::{EndianReader, LittleEndianReader};
use texture_ingest_common::{
    mip_dimensions, CompressedFormat, DecodedImage, FormatError, FormatResult, LevelBuffer,
    ParsedContainer, TextureFormat, UncompressedFormat, UnknownPixelFormat, UnsupportedLayout,
    MAX_MIP_LEVELS,
};

/// The header fields of a DDS file that describe its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsInfo {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Mip levels per image, at least 1.
    pub mipmap_count: u32,
    /// Images stored back to back, at least 1. Only DX10 headers can declare more than one.
    pub array_size: u32,
    /// Offset of the first byte of pixel data.
    pub data_offset: usize,
}

/// Parses a DDS file into its images and mip levels.
///
/// DDS stores no per-level size, so every level's span is computed from its dimensions.
/// DX10 files with an `arraySize` above 1 produce one [`DecodedImage`] per element; the
/// payload is image-major, each image holding its complete mip chain.
///
/// # Errors
///
/// - [`FormatError::InputTooShort`] / [`FormatError::InvalidMagic`] /
///   [`FormatError::InvalidHeader`] for a malformed header.
/// - [`FormatError::UnsupportedLayout`] for cube maps, volumes and non-2D resources.
/// - [`FormatError::UnknownPixelFormat`] if the pixel format is not in the format table.
/// - [`FormatError::TruncatedLevel`] if the payload is shorter than the header implies.
pub fn parse_dds(data: &[u8]) -> FormatResult<ParsedContainer> {
    let info = parse_dds_header(data)?;

    let mut images = Vec::new();
    let mut offset = info.data_offset;
    for image_index in 0..info.array_size {
        let mut image = DecodedImage::new(image_index, info.width, info.height);
        image.levels = Vec::with_capacity(info.mipmap_count.min(MAX_MIP_LEVELS) as usize);

        for level in 0..info.mipmap_count {
            let (width, height) = mip_dimensions(info.width, info.height, level);
            let len = info
                .format
                .level_byte_len(width, height)
                .ok_or(FormatError::InvalidHeader("level size overflows"))?;
            let available = data.len().saturating_sub(offset);
            if len > available {
                return Err(FormatError::TruncatedLevel {
                    level,
                    offset,
                    required: len,
                    actual: available,
                });
            }

            let (stored_width, stored_height) = info
                .format
                .storage_dimensions(width, height)
                .ok_or(FormatError::InvalidHeader("level size overflows"))?;
            image.levels.push(LevelBuffer::new(
                level,
                stored_width,
                stored_height,
                data[offset..offset + len].to_vec(),
            ));
            offset += len;
        }
        images.push(image);
    }

    Ok(ParsedContainer {
        format: info.format,
        images,
        key_value_data: None,
    })
}

/// Reads and validates the DDS header (and DX10 extension header, if present).
pub fn parse_dds_header(data: &[u8]) -> FormatResult<DdsInfo> {
    if data.len() < DDS_HEADER_SIZE {
        return Err(FormatError::InputTooShort {
            required: DDS_HEADER_SIZE,
            actual: data.len(),
        });
    }

    // SAFETY: We checked data.len() >= DDS_HEADER_SIZE (128); every legacy field lies below it.
    let mut reader = unsafe { LittleEndianReader::new(data.as_ptr()) };
    if unsafe { reader.read_u32_at(0) } != DDS_MAGIC {
        return Err(FormatError::InvalidMagic);
    }
    if unsafe { reader.read_u32_at(DDS_SIZE_OFFSET as isize) } != DDS_HEADER_STRUCT_SIZE {
        return Err(FormatError::InvalidHeader("DDS_HEADER size is not 124"));
    }

    let flags = unsafe { reader.read_u32_at(DDS_FLAGS_OFFSET as isize) };
    let height = unsafe { reader.read_u32_at(DDS_HEIGHT_OFFSET as isize) };
    let width = unsafe { reader.read_u32_at(DDS_WIDTH_OFFSET as isize) };
    let depth = unsafe { reader.read_u32_at(DDS_DEPTH_OFFSET as isize) };
    let raw_mipmap_count = unsafe { reader.read_u32_at(DDS_MIPMAP_COUNT_OFFSET as isize) };
    let caps2 = unsafe { reader.read_u32_at(DDS_CAPS2_OFFSET as isize) };
    let pixel_flags = unsafe { reader.read_u32_at(DDS_PIXELFORMAT_FLAGS_OFFSET as isize) };
    let fourcc = unsafe { reader.read_u32_at(FOURCC_OFFSET as isize) };

    if width == 0 || height == 0 {
        return Err(FormatError::InvalidHeader("zero width or height"));
    }
    if caps2 & DDSCAPS2_CUBEMAP != 0 {
        return Err(FormatError::UnsupportedLayout(UnsupportedLayout::CubeMap {
            faces: 6,
        }));
    }
    if caps2 & DDSCAPS2_VOLUME != 0 || (flags & DDSD_DEPTH != 0 && depth > 1) {
        return Err(FormatError::UnsupportedLayout(UnsupportedLayout::Volume {
            depth: depth.max(1),
        }));
    }

    let mipmap_count = if (flags & DDSD_MIPMAPCOUNT) != 0 {
        raw_mipmap_count.max(1)
    } else {
        1
    };

    let (format, array_size, data_offset) = if pixel_flags & DDPF_FOURCC != 0
        && fourcc == FOURCC_DX10
    {
        if data.len() < DDS_HEADER_SIZE + DX10_HEADER_SIZE {
            return Err(FormatError::InputTooShort {
                required: DDS_HEADER_SIZE + DX10_HEADER_SIZE,
                actual: data.len(),
            });
        }

        // SAFETY: We checked data.len() >= DDS_HEADER_SIZE + DX10_HEADER_SIZE (148),
        // so every DX10 field up to 0x8C + 4 is in bounds.
        let dxgi_format = unsafe { reader.read_u32_at(DX10_FORMAT_OFFSET as isize) };
        let dimension = unsafe { reader.read_u32_at(DX10_RESOURCE_DIMENSION_OFFSET as isize) };
        let misc_flag = unsafe { reader.read_u32_at(DX10_MISC_FLAG_OFFSET as isize) };
        let array_size = unsafe { reader.read_u32_at(DX10_ARRAY_SIZE_OFFSET as isize) };

        match dimension {
            RESOURCE_DIMENSION_TEXTURE2D => {}
            RESOURCE_DIMENSION_TEXTURE3D => {
                return Err(FormatError::UnsupportedLayout(UnsupportedLayout::Volume {
                    depth: depth.max(1),
                }))
            }
            other => {
                return Err(FormatError::UnsupportedLayout(
                    UnsupportedLayout::NotTwoDimensional { dimension: other },
                ))
            }
        }
        if misc_flag & RESOURCE_MISC_TEXTURECUBE != 0 {
            return Err(FormatError::UnsupportedLayout(UnsupportedLayout::CubeMap {
                faces: 6,
            }));
        }

        (
            format_from_dxgi(dxgi_format)?,
            array_size.max(1),
            DDS_HEADER_SIZE + DX10_HEADER_SIZE,
        )
    } else if pixel_flags & DDPF_FOURCC != 0 {
        (format_from_fourcc(fourcc)?, 1, DDS_HEADER_SIZE)
    } else {
        (format_from_pixel_masks(data, pixel_flags)?, 1, DDS_HEADER_SIZE)
    };

    Ok(DdsInfo {
        format,
        width,
        height,
        mipmap_count,
        array_size,
        data_offset,
    })
}

fn format_from_fourcc(fourcc: u32) -> FormatResult<TextureFormat> {
    let format = match fourcc {
        FOURCC_DXT1 => CompressedFormat::RgbaS3tcDxt1,
        FOURCC_DXT2 | FOURCC_DXT3 => CompressedFormat::RgbaS3tcDxt3,
        FOURCC_DXT4 | FOURCC_DXT5 => CompressedFormat::RgbaS3tcDxt5,
        FOURCC_ATC => CompressedFormat::RgbAtc,
        FOURCC_ATCA => CompressedFormat::RgbaAtcExplicitAlpha,
        FOURCC_ATCI => CompressedFormat::RgbaAtcInterpolatedAlpha,
        other => {
            return Err(FormatError::UnknownPixelFormat(UnknownPixelFormat::FourCc(
                other,
            )))
        }
    };
    Ok(TextureFormat::Compressed(format))
}

fn format_from_dxgi(dxgi_format: u32) -> FormatResult<TextureFormat> {
    let format = match dxgi_format {
        DXGI_FORMAT_BC1_TYPELESS | DXGI_FORMAT_BC1_UNORM => CompressedFormat::RgbaS3tcDxt1,
        DXGI_FORMAT_BC1_UNORM_SRGB => CompressedFormat::SrgbAlphaS3tcDxt1,
        DXGI_FORMAT_BC2_TYPELESS | DXGI_FORMAT_BC2_UNORM => CompressedFormat::RgbaS3tcDxt3,
        DXGI_FORMAT_BC2_UNORM_SRGB => CompressedFormat::SrgbAlphaS3tcDxt3,
        DXGI_FORMAT_BC3_TYPELESS | DXGI_FORMAT_BC3_UNORM => CompressedFormat::RgbaS3tcDxt5,
        DXGI_FORMAT_BC3_UNORM_SRGB => CompressedFormat::SrgbAlphaS3tcDxt5,
        DXGI_FORMAT_R8G8B8A8_TYPELESS
        | DXGI_FORMAT_R8G8B8A8_UNORM
        | DXGI_FORMAT_R8G8B8A8_UNORM_SRGB => {
            return Ok(TextureFormat::Uncompressed(UncompressedFormat::RGBA8))
        }
        other => {
            return Err(FormatError::UnknownPixelFormat(UnknownPixelFormat::Dxgi(
                other,
            )))
        }
    };
    Ok(TextureFormat::Compressed(format))
}

/// Resolves a legacy uncompressed pixel format from its bit count and channel masks.
fn format_from_pixel_masks(data: &[u8], pixel_flags: u32) -> FormatResult<TextureFormat> {
    // SAFETY: Caller checked data.len() >= DDS_HEADER_SIZE; the masks end at 0x6C.
    let mut reader = unsafe { LittleEndianReader::new(data.as_ptr()) };
    let bit_count = unsafe { reader.read_u32_at(DDS_PIXELFORMAT_RGBBITCOUNT_OFFSET as isize) };
    let r_mask = unsafe { reader.read_u32_at(DDS_PIXELFORMAT_RBITMASK_OFFSET as isize) };
    let g_mask = unsafe { reader.read_u32_at(DDS_PIXELFORMAT_GBITMASK_OFFSET as isize) };
    let b_mask = unsafe { reader.read_u32_at(DDS_PIXELFORMAT_BBITMASK_OFFSET as isize) };
    let a_mask = unsafe { reader.read_u32_at(DDS_PIXELFORMAT_ABITMASK_OFFSET as isize) };

    let is_rgba8888 = pixel_flags & DDPF_RGB != 0
        && pixel_flags & DDPF_ALPHAPIXELS != 0
        && bit_count == 32
        && r_mask == RGBA8888_RED_MASK
        && g_mask == RGBA8888_GREEN_MASK
        && b_mask == RGBA8888_BLUE_MASK
        && a_mask == RGBA8888_ALPHA_MASK;

    if is_rgba8888 {
        Ok(TextureFormat::Uncompressed(UncompressedFormat::RGBA8))
    } else {
        Err(FormatError::UnknownPixelFormat(
            UnknownPixelFormat::PixelMasks {
                bit_count,
                flags: pixel_flags,
            },
        ))
    }
}
