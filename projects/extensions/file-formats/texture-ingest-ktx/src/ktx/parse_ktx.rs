use super::{constants::*, key_value::parse_key_value_data};
use alloc::vec;
use alloc::vec::Vec;
use endian_writer::{BigEndianReader, EndianReader, LittleEndianReader};
use texture_ingest_common::{
    mip_dimensions, CompressedFormat, DecodedImage, FormatError, FormatResult, LevelBuffer,
    ParsedContainer, TextureFormat, UncompressedFormat, UnknownPixelFormat, UnsupportedLayout,
    MAX_MIP_LEVELS,
};

/// Byte order of the integer fields in a KTX file, chosen by the endianness sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Reads the `u32` at the start of `bytes`; [`None`] if fewer than 4 bytes remain.
    #[inline(always)]
    pub(crate) fn read_u32(self, bytes: &[u8]) -> Option<u32> {
        if bytes.len() < 4 {
            return None;
        }

        // SAFETY: `bytes` holds at least 4 bytes.
        Some(unsafe {
            match self {
                ByteOrder::Little => LittleEndianReader::new(bytes.as_ptr()).read_u32(),
                ByteOrder::Big => BigEndianReader::new(bytes.as_ptr()).read_u32(),
            }
        })
    }
}

/// Options for [`parse_ktx_with_options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KtxParseOptions {
    /// Decode the key/value metadata block into [`ParsedContainer::key_value_data`].
    /// When unset the block is skipped without being inspected.
    pub load_key_value_data: bool,
}

impl KtxParseOptions {
    pub fn with_key_value_data(mut self, load: bool) -> Self {
        self.load_key_value_data = load;
        self
    }
}

/// The fixed 64-byte KTX header, decoded in the file's byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KtxHeader {
    pub byte_order: ByteOrder,
    pub gl_type: u32,
    pub gl_type_size: u32,
    pub gl_format: u32,
    pub gl_internal_format: u32,
    pub gl_base_internal_format: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
    pub number_of_array_elements: u32,
    pub number_of_faces: u32,
    pub number_of_mipmap_levels: u32,
    pub bytes_of_key_value_data: u32,
}

impl KtxHeader {
    /// Reads and validates the identifier and endianness sentinel, then decodes the fields.
    ///
    /// No layout or format validation happens here; see [`KtxHeader::validate_layout`] and
    /// [`KtxHeader::texture_format`].
    pub fn read(data: &[u8]) -> FormatResult<Self> {
        if data.len() < KTX_HEADER_SIZE {
            return Err(FormatError::InputTooShort {
                required: KTX_HEADER_SIZE,
                actual: data.len(),
            });
        }
        if data[..KTX_MAGIC.len()] != KTX_MAGIC {
            return Err(FormatError::InvalidMagic);
        }

        // SAFETY: We checked data.len() >= KTX_HEADER_SIZE (64); every field lies below it.
        let sentinel = unsafe {
            LittleEndianReader::new(data.as_ptr()).read_u32_at(ENDIANNESS_OFFSET as isize)
        };
        let header = match sentinel {
            KTX_ENDIANNESS => unsafe {
                Self::read_fields(LittleEndianReader::new(data.as_ptr()), ByteOrder::Little)
            },
            KTX_ENDIANNESS_SWAPPED => unsafe {
                Self::read_fields(BigEndianReader::new(data.as_ptr()), ByteOrder::Big)
            },
            other => return Err(FormatError::InvalidEndianness(other)),
        };
        Ok(header)
    }

    /// # Safety
    ///
    /// `reader` must point at the start of a complete [`KTX_HEADER_SIZE`] byte header.
    unsafe fn read_fields<R: EndianReader>(mut reader: R, byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            gl_type: reader.read_u32_at(GL_TYPE_OFFSET as isize),
            gl_type_size: reader.read_u32_at(GL_TYPE_SIZE_OFFSET as isize),
            gl_format: reader.read_u32_at(GL_FORMAT_OFFSET as isize),
            gl_internal_format: reader.read_u32_at(GL_INTERNAL_FORMAT_OFFSET as isize),
            gl_base_internal_format: reader.read_u32_at(GL_BASE_INTERNAL_FORMAT_OFFSET as isize),
            pixel_width: reader.read_u32_at(PIXEL_WIDTH_OFFSET as isize),
            pixel_height: reader.read_u32_at(PIXEL_HEIGHT_OFFSET as isize),
            pixel_depth: reader.read_u32_at(PIXEL_DEPTH_OFFSET as isize),
            number_of_array_elements: reader.read_u32_at(NUMBER_OF_ARRAY_ELEMENTS_OFFSET as isize),
            number_of_faces: reader.read_u32_at(NUMBER_OF_FACES_OFFSET as isize),
            number_of_mipmap_levels: reader.read_u32_at(NUMBER_OF_MIPMAP_LEVELS_OFFSET as isize),
            bytes_of_key_value_data: reader.read_u32_at(BYTES_OF_KEY_VALUE_DATA_OFFSET as isize),
        }
    }

    /// Rejects cube maps, arrays and volume textures.
    ///
    /// KTX writes 0 for the array element count and depth of a plain 2D texture, so both 0
    /// and 1 are accepted there.
    pub fn validate_layout(&self) -> FormatResult<()> {
        if self.number_of_faces != 1 {
            return Err(FormatError::UnsupportedLayout(UnsupportedLayout::CubeMap {
                faces: self.number_of_faces,
            }));
        }
        if self.number_of_array_elements > 1 {
            return Err(FormatError::UnsupportedLayout(
                UnsupportedLayout::TextureArray {
                    elements: self.number_of_array_elements,
                },
            ));
        }
        if self.pixel_depth > 1 {
            return Err(FormatError::UnsupportedLayout(UnsupportedLayout::Volume {
                depth: self.pixel_depth,
            }));
        }
        if self.pixel_width == 0 {
            return Err(FormatError::InvalidHeader("pixelWidth is zero"));
        }
        Ok(())
    }

    /// Resolves the pixel format: `glType == 0` marks a compressed payload described by
    /// `glInternalFormat`, anything else is an uncompressed `glType` + `glFormat` pair.
    pub fn texture_format(&self) -> FormatResult<TextureFormat> {
        if self.gl_type == 0 {
            return CompressedFormat::from_gl(self.gl_internal_format)
                .map(TextureFormat::Compressed)
                .ok_or(FormatError::UnknownPixelFormat(
                    UnknownPixelFormat::GlInternalFormat(self.gl_internal_format),
                ));
        }

        let format = UncompressedFormat::from_gl(self.gl_type, self.gl_format).ok_or(
            FormatError::UnknownPixelFormat(UnknownPixelFormat::GlTypeAndFormat {
                gl_type: self.gl_type,
                gl_format: self.gl_format,
            }),
        )?;

        // Multi-byte elements would need swapping in place.
        if self.byte_order == ByteOrder::Big && self.gl_type_size > 1 {
            return Err(FormatError::UnsupportedEndianness {
                type_size: self.gl_type_size,
            });
        }
        Ok(TextureFormat::Uncompressed(format))
    }

    /// 1D textures store a height of 0.
    pub fn height(&self) -> u32 {
        self.pixel_height.max(1)
    }

    /// A level count of 0 asks the loader to generate mips; only the base level is stored.
    pub fn level_count(&self) -> u32 {
        self.number_of_mipmap_levels.max(1)
    }
}

/// Parses a KTX file into its mip levels, skipping the key/value metadata.
///
/// See [`parse_ktx_with_options`].
#[inline]
pub fn parse_ktx(data: &[u8]) -> FormatResult<ParsedContainer> {
    parse_ktx_with_options(data, KtxParseOptions::default())
}

/// Parses a KTX file into its mip levels.
///
/// The result holds exactly one image whose levels are ordered from full resolution down.
/// Level dimensions halve each step (floored, minimum 1); compressed levels report their
/// block-aligned dimensions.
///
/// # Errors
///
/// - [`FormatError::InputTooShort`] if the fixed header does not fit.
/// - [`FormatError::InvalidMagic`] if the identifier does not match.
/// - [`FormatError::InvalidEndianness`] / [`FormatError::UnsupportedEndianness`] for bad or
///   unsupported byte orders.
/// - [`FormatError::UnsupportedLayout`] for cube maps, arrays and volumes.
/// - [`FormatError::UnknownPixelFormat`] if the format is not in the format table.
/// - [`FormatError::TruncatedLevel`] / [`FormatError::LevelTooSmall`] if a level's declared
///   `imageSize` does not fit the buffer or the level's dimensions.
/// - [`FormatError::MalformedKeyValueData`] if metadata was requested and is malformed.
pub fn parse_ktx_with_options(
    data: &[u8],
    options: KtxParseOptions,
) -> FormatResult<ParsedContainer> {
    let header = KtxHeader::read(data)?;
    header.validate_layout()?;
    let format = header.texture_format()?;

    let key_value_end = KTX_HEADER_SIZE
        .checked_add(header.bytes_of_key_value_data as usize)
        .filter(|&end| end <= data.len())
        .ok_or(FormatError::InvalidHeader(
            "bytesOfKeyValueData exceeds the file length",
        ))?;

    let key_value_data = if options.load_key_value_data {
        Some(parse_key_value_data(
            &data[KTX_HEADER_SIZE..key_value_end],
            KTX_HEADER_SIZE,
            header.byte_order,
        )?)
    } else {
        None
    };

    let mut image = DecodedImage::new(0, header.pixel_width, header.height());
    image.levels = Vec::with_capacity(header.level_count().min(MAX_MIP_LEVELS) as usize);

    // Writers that declare an unpadded block still start level 0 on a 4-byte boundary.
    let mut offset = align_4(key_value_end);
    for level in 0..header.level_count() {
        let (level_buffer, next) = read_level(data, offset, level, &header, format)?;
        image.levels.push(level_buffer);
        offset = next;
    }

    Ok(ParsedContainer {
        format,
        images: vec![image],
        key_value_data,
    })
}

/// Reads one `{imageSize, imageData}` record starting at `offset`.
/// Returns the level and the 4-byte aligned offset of the next record.
fn read_level(
    data: &[u8],
    offset: usize,
    level: u32,
    header: &KtxHeader,
    format: TextureFormat,
) -> FormatResult<(LevelBuffer, usize)> {
    let remaining = data.len().saturating_sub(offset);
    let image_size = data
        .get(offset..)
        .and_then(|record| header.byte_order.read_u32(record))
        .ok_or(FormatError::TruncatedLevel {
            level,
            offset,
            required: IMAGE_SIZE_FIELD,
            actual: remaining,
        })? as usize;
    let start = offset + IMAGE_SIZE_FIELD;
    let available = data.len() - start;
    if image_size > available {
        return Err(FormatError::TruncatedLevel {
            level,
            offset: start,
            required: image_size,
            actual: available,
        });
    }

    let (width, height) = mip_dimensions(header.pixel_width, header.height(), level);
    let expected = format
        .level_byte_len(width, height)
        .ok_or(FormatError::InvalidHeader("level size overflows"))?;
    if image_size < expected {
        return Err(FormatError::LevelTooSmall {
            level,
            expected,
            actual: image_size,
        });
    }

    let span = &data[start..start + image_size];
    let bytes = match format {
        TextureFormat::Uncompressed(uncompressed) if image_size != expected => {
            unpack_rows(span, width, height, uncompressed.bytes_per_pixel() as usize)
        }
        _ => span[..expected].to_vec(),
    };

    let (stored_width, stored_height) = format
        .storage_dimensions(width, height)
        .ok_or(FormatError::InvalidHeader("level size overflows"))?;
    Ok((
        LevelBuffer::new(level, stored_width, stored_height, bytes),
        align_4(start + image_size),
    ))
}

/// KTX pads each uncompressed row to 4 bytes (`GL_UNPACK_ALIGNMENT` of 4). Strips that
/// padding when the span is large enough to hold it, otherwise keeps the tightly packed
/// prefix.
fn unpack_rows(span: &[u8], width: u32, height: u32, bytes_per_pixel: usize) -> Vec<u8> {
    let row = width as usize * bytes_per_pixel;
    let padded_row = align_4(row);
    let packed_len = row * height as usize;

    if padded_row == row || span.len() < padded_row * height as usize {
        return span[..packed_len].to_vec();
    }

    let mut bytes = Vec::with_capacity(packed_len);
    for line in span.chunks_exact(padded_row).take(height as usize) {
        bytes.extend_from_slice(&line[..row]);
    }
    bytes
}
