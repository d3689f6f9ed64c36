//! Common test imports and utilities for DDS parser tests
//!
//! This module provides a common prelude for test modules to avoid
//! duplicate imports across the codebase.
#![allow(unused_imports)]

// External crate declaration for no_std compatibility
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

// Re-export commonly used alloc types for tests
pub use alloc::{boxed::Box, format, string::String, vec, vec::Vec};

// External crates commonly used in tests
pub use rstest::rstest;

use crate::dds::constants::*;
use endian_writer::{EndianWriter, LittleEndianWriter};
use texture_ingest_common::{mip_dimensions, CompressedFormat, TextureFormat, UncompressedFormat};

#[derive(Debug, Clone, Copy)]
enum PixelFormat {
    FourCc(u32),
    Dx10(u32),
    Rgba8888,
}

/// Writes synthetic DDS files with a payload sized for the declared format.
#[derive(Debug, Clone)]
pub struct DdsBuilder {
    pixel_format: PixelFormat,
    payload_format: TextureFormat,
    width: u32,
    height: u32,
    mip_levels: u32,
    depth: u32,
    caps2: u32,
    resource_dimension: u32,
    misc_flag: u32,
    array_size: u32,
}

impl DdsBuilder {
    fn new(pixel_format: PixelFormat, payload_format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            pixel_format,
            payload_format,
            width,
            height,
            mip_levels: 1,
            depth: 0,
            caps2: 0,
            resource_dimension: RESOURCE_DIMENSION_TEXTURE2D,
            misc_flag: 0,
            array_size: 1,
        }
    }

    /// Legacy header with a FourCC code. Unknown codes get a DXT1-sized payload.
    pub fn fourcc(fourcc: u32, width: u32, height: u32) -> Self {
        let payload_format = match fourcc {
            FOURCC_DXT2 | FOURCC_DXT3 => CompressedFormat::RgbaS3tcDxt3,
            FOURCC_DXT4 | FOURCC_DXT5 => CompressedFormat::RgbaS3tcDxt5,
            FOURCC_ATC => CompressedFormat::RgbAtc,
            FOURCC_ATCA | FOURCC_ATCI => CompressedFormat::RgbaAtcExplicitAlpha,
            _ => CompressedFormat::RgbaS3tcDxt1,
        };
        Self::new(PixelFormat::FourCc(fourcc), payload_format.into(), width, height)
    }

    /// DX10 header; `payload_format` sizes the pixel data.
    pub fn dx10(dxgi_format: u32, payload_format: TextureFormat, width: u32, height: u32) -> Self {
        Self::new(PixelFormat::Dx10(dxgi_format), payload_format, width, height)
    }

    /// Legacy header with R8G8B8A8 channel masks.
    pub fn rgba8888(width: u32, height: u32) -> Self {
        Self::new(PixelFormat::Rgba8888, UncompressedFormat::RGBA8.into(), width, height)
    }

    pub fn mip_levels(mut self, levels: u32) -> Self {
        self.mip_levels = levels;
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn caps2(mut self, caps2: u32) -> Self {
        self.caps2 = caps2;
        self
    }

    pub fn resource_dimension(mut self, dimension: u32) -> Self {
        self.resource_dimension = dimension;
        self
    }

    pub fn misc_flag(mut self, flag: u32) -> Self {
        self.misc_flag = flag;
        self
    }

    pub fn array_size(mut self, size: u32) -> Self {
        self.array_size = size;
        self
    }

    fn header_size(&self) -> usize {
        match self.pixel_format {
            PixelFormat::Dx10(_) => DDS_HEADER_SIZE + DX10_HEADER_SIZE,
            _ => DDS_HEADER_SIZE,
        }
    }

    fn payload_len(&self) -> usize {
        let chain: usize = (0..self.mip_levels.max(1))
            .map(|level| {
                let (width, height) = mip_dimensions(self.width, self.height, level);
                self.payload_format.level_byte_len(width, height).unwrap()
            })
            .sum();
        chain * self.array_size.max(1) as usize
    }

    pub fn build(&self) -> Vec<u8> {
        let header_size = self.header_size();
        let mut data = vec![0u8; header_size + self.payload_len()];

        let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_LINEARSIZE;
        if self.mip_levels > 1 {
            flags |= DDSD_MIPMAPCOUNT;
        }
        if self.depth > 0 {
            flags |= DDSD_DEPTH;
        }

        // SAFETY: `data` holds at least `header_size` bytes; every offset written lies below it.
        let mut writer = unsafe { LittleEndianWriter::new(data.as_mut_ptr()) };
        unsafe {
            writer.write_u32_at(DDS_MAGIC, 0);
            writer.write_u32_at(DDS_HEADER_STRUCT_SIZE, DDS_SIZE_OFFSET as isize);
            writer.write_u32_at(flags, DDS_FLAGS_OFFSET as isize);
            writer.write_u32_at(self.height, DDS_HEIGHT_OFFSET as isize);
            writer.write_u32_at(self.width, DDS_WIDTH_OFFSET as isize);
            writer.write_u32_at(self.depth, DDS_DEPTH_OFFSET as isize);
            writer.write_u32_at(self.mip_levels, DDS_MIPMAP_COUNT_OFFSET as isize);
            writer.write_u32_at(self.caps2, DDS_CAPS2_OFFSET as isize);

            match self.pixel_format {
                PixelFormat::FourCc(fourcc) => {
                    writer.write_u32_at(DDPF_FOURCC, DDS_PIXELFORMAT_FLAGS_OFFSET as isize);
                    writer.write_u32_at(fourcc, FOURCC_OFFSET as isize);
                }
                PixelFormat::Dx10(dxgi_format) => {
                    writer.write_u32_at(DDPF_FOURCC, DDS_PIXELFORMAT_FLAGS_OFFSET as isize);
                    writer.write_u32_at(FOURCC_DX10, FOURCC_OFFSET as isize);
                    writer.write_u32_at(dxgi_format, DX10_FORMAT_OFFSET as isize);
                    writer.write_u32_at(
                        self.resource_dimension,
                        DX10_RESOURCE_DIMENSION_OFFSET as isize,
                    );
                    writer.write_u32_at(self.misc_flag, DX10_MISC_FLAG_OFFSET as isize);
                    writer.write_u32_at(self.array_size, DX10_ARRAY_SIZE_OFFSET as isize);
                }
                PixelFormat::Rgba8888 => {
                    writer.write_u32_at(
                        DDPF_RGB | DDPF_ALPHAPIXELS,
                        DDS_PIXELFORMAT_FLAGS_OFFSET as isize,
                    );
                    writer.write_u32_at(32, DDS_PIXELFORMAT_RGBBITCOUNT_OFFSET as isize);
                    writer.write_u32_at(RGBA8888_RED_MASK, DDS_PIXELFORMAT_RBITMASK_OFFSET as isize);
                    writer.write_u32_at(
                        RGBA8888_GREEN_MASK,
                        DDS_PIXELFORMAT_GBITMASK_OFFSET as isize,
                    );
                    writer.write_u32_at(RGBA8888_BLUE_MASK, DDS_PIXELFORMAT_BBITMASK_OFFSET as isize);
                    writer.write_u32_at(
                        RGBA8888_ALPHA_MASK,
                        DDS_PIXELFORMAT_ABITMASK_OFFSET as isize,
                    );
                }
            }
        }

        // Fill texture data area with test pattern
        for (index, byte) in data[header_size..].iter_mut().enumerate() {
            *byte = (index % 251) as u8;
        }

        data
    }
}
