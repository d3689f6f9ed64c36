//! Common test imports and a synthetic KTX writer for the parser tests.
#![allow(unused_imports)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub use alloc::{boxed::Box, format, string::String, vec, vec::Vec};

pub use rstest::rstest;

pub use texture_ingest_common::{
    mip_dimensions, CompressedFormat, GlFormat, GlType, TextureFormat, UncompressedFormat,
};

use crate::ktx::constants::*;
use endian_writer::{BigEndianWriter, EndianWriter, LittleEndianWriter};

/// Builds KTX files field by field. Every setter has a sensible default so a test only
/// spells out what it cares about.
#[derive(Debug, Clone)]
pub struct KtxBuilder {
    big_endian: bool,
    gl_type: u32,
    gl_type_size: u32,
    gl_format: u32,
    gl_internal_format: u32,
    format: TextureFormat,
    width: u32,
    height: u32,
    depth: u32,
    array_elements: u32,
    faces: u32,
    levels: u32,
    declared_levels: Option<u32>,
    level_data: Option<Vec<Vec<u8>>>,
    key_value_block: Vec<u8>,
}

impl KtxBuilder {
    fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        let (gl_type, gl_type_size, gl_format, gl_internal_format) = match format {
            TextureFormat::Compressed(compressed) => (0, 1, 0, compressed.gl_internal_format()),
            TextureFormat::Uncompressed(uncompressed) => {
                let type_size = uncompressed
                    .gl_type
                    .packed_bytes_per_pixel()
                    .or(uncompressed.gl_type.bytes_per_component())
                    .unwrap_or(1);
                (
                    uncompressed.gl_type.to_gl(),
                    type_size,
                    uncompressed.gl_format.to_gl(),
                    uncompressed.gl_format.to_gl(),
                )
            }
        };

        Self {
            big_endian: false,
            gl_type,
            gl_type_size,
            gl_format,
            gl_internal_format,
            format,
            width,
            height,
            depth: 0,
            array_elements: 0,
            faces: 1,
            levels: 1,
            declared_levels: None,
            level_data: None,
            key_value_block: Vec::new(),
        }
    }

    pub fn compressed(format: CompressedFormat, width: u32, height: u32) -> Self {
        Self::new(TextureFormat::Compressed(format), width, height)
    }

    pub fn uncompressed(format: UncompressedFormat, width: u32, height: u32) -> Self {
        Self::new(TextureFormat::Uncompressed(format), width, height)
    }

    /// Declares and writes `levels` mip levels.
    pub fn mip_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    /// Overrides only the header's level count; the written levels are unchanged.
    pub fn declared_mip_levels(mut self, levels: u32) -> Self {
        self.declared_levels = Some(levels);
        self
    }

    /// Writes these exact level payloads; `imageSize` is each payload's length.
    pub fn level_data(mut self, levels: Vec<Vec<u8>>) -> Self {
        self.levels = levels.len() as u32;
        self.level_data = Some(levels);
        self
    }

    pub fn faces(mut self, faces: u32) -> Self {
        self.faces = faces;
        self
    }

    pub fn array_elements(mut self, elements: u32) -> Self {
        self.array_elements = elements;
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn raw_internal_format(mut self, value: u32) -> Self {
        self.gl_internal_format = value;
        self
    }

    /// Appends one well-formed key/value entry.
    pub fn key_value(mut self, key: &str, value: &[u8]) -> Self {
        let size = (key.len() + 1 + value.len()) as u32;
        let size = self.encode(size);
        self.key_value_block.extend_from_slice(&size);
        self.key_value_block.extend_from_slice(key.as_bytes());
        self.key_value_block.push(0);
        self.key_value_block.extend_from_slice(value);
        pad_to_4(&mut self.key_value_block);
        self
    }

    /// Replaces the key/value block with arbitrary bytes.
    pub fn raw_key_value_block(mut self, block: Vec<u8>) -> Self {
        self.key_value_block = block;
        self
    }

    fn encode(&self, value: u32) -> [u8; 4] {
        let mut bytes = [0u8; 4];
        self.write_fields(&mut bytes, &[(0, value)]);
        bytes
    }

    /// Writes `(offset, value)` pairs into `data` in the builder's byte order.
    fn write_fields(&self, data: &mut [u8], fields: &[(usize, u32)]) {
        assert!(fields.iter().all(|&(offset, _)| offset + 4 <= data.len()));

        // SAFETY: Every field was checked to lie inside `data`.
        unsafe {
            if self.big_endian {
                write_u32s(BigEndianWriter::new(data.as_mut_ptr()), fields);
            } else {
                write_u32s(LittleEndianWriter::new(data.as_mut_ptr()), fields);
            }
        }
    }

    fn generated_levels(&self) -> Vec<Vec<u8>> {
        (0..self.levels)
            .map(|level| {
                let (width, height) = mip_dimensions(self.width, self.height.max(1), level);
                let len = self.format.level_byte_len(width, height).unwrap();
                (0..len).map(|i| (i as u8).wrapping_add(level as u8)).collect()
            })
            .collect()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = vec![0u8; KTX_HEADER_SIZE];
        data[..KTX_MAGIC.len()].copy_from_slice(&KTX_MAGIC);
        self.write_fields(
            &mut data,
            &[
                (ENDIANNESS_OFFSET, KTX_ENDIANNESS),
                (GL_TYPE_OFFSET, self.gl_type),
                (GL_TYPE_SIZE_OFFSET, self.gl_type_size),
                (GL_FORMAT_OFFSET, self.gl_format),
                (GL_INTERNAL_FORMAT_OFFSET, self.gl_internal_format),
                (GL_BASE_INTERNAL_FORMAT_OFFSET, self.gl_format),
                (PIXEL_WIDTH_OFFSET, self.width),
                (PIXEL_HEIGHT_OFFSET, self.height),
                (PIXEL_DEPTH_OFFSET, self.depth),
                (NUMBER_OF_ARRAY_ELEMENTS_OFFSET, self.array_elements),
                (NUMBER_OF_FACES_OFFSET, self.faces),
                (
                    NUMBER_OF_MIPMAP_LEVELS_OFFSET,
                    self.declared_levels.unwrap_or(self.levels),
                ),
                (
                    BYTES_OF_KEY_VALUE_DATA_OFFSET,
                    self.key_value_block.len() as u32,
                ),
            ],
        );

        // The declared length excludes any trailing padding of a raw block.
        data.extend_from_slice(&self.key_value_block);
        pad_to_4(&mut data);

        let levels = self
            .level_data
            .clone()
            .unwrap_or_else(|| self.generated_levels());
        for level in levels {
            data.extend_from_slice(&self.encode(level.len() as u32));
            data.extend_from_slice(&level);
            pad_to_4(&mut data);
        }
        data
    }
}

unsafe fn write_u32s<W: EndianWriter>(mut writer: W, fields: &[(usize, u32)]) {
    for &(offset, value) in fields {
        writer.write_u32_at(value, offset as isize);
    }
}

fn pad_to_4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}
