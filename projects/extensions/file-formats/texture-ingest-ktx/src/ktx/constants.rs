//! KTX format constants and definitions

/// The 12-byte file identifier, `«KTX 11»\r\n\x1A\n`.
pub const KTX_MAGIC: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// Endianness sentinel as written by the producer.
pub const KTX_ENDIANNESS: u32 = 0x0403_0201;
/// The sentinel as read back when the producer's byte order differs from ours.
pub const KTX_ENDIANNESS_SWAPPED: u32 = 0x0102_0304;

/// Size of the fixed header, including the identifier.
pub const KTX_HEADER_SIZE: usize = 64;

// Header field offsets
pub(crate) const ENDIANNESS_OFFSET: usize = 12;
pub(crate) const GL_TYPE_OFFSET: usize = 16;
pub(crate) const GL_TYPE_SIZE_OFFSET: usize = 20;
pub(crate) const GL_FORMAT_OFFSET: usize = 24;
pub(crate) const GL_INTERNAL_FORMAT_OFFSET: usize = 28;
pub(crate) const GL_BASE_INTERNAL_FORMAT_OFFSET: usize = 32;
pub(crate) const PIXEL_WIDTH_OFFSET: usize = 36;
pub(crate) const PIXEL_HEIGHT_OFFSET: usize = 40;
pub(crate) const PIXEL_DEPTH_OFFSET: usize = 44;
pub(crate) const NUMBER_OF_ARRAY_ELEMENTS_OFFSET: usize = 48;
pub(crate) const NUMBER_OF_FACES_OFFSET: usize = 52;
pub(crate) const NUMBER_OF_MIPMAP_LEVELS_OFFSET: usize = 56;
pub(crate) const BYTES_OF_KEY_VALUE_DATA_OFFSET: usize = 60;

/// `imageSize` prefix in front of every mip level.
pub(crate) const IMAGE_SIZE_FIELD: usize = 4;

/// Rounds `offset` up to the next 4-byte boundary.
#[inline(always)]
pub(crate) const fn align_4(offset: usize) -> usize {
    (offset + 3) & !3
}
