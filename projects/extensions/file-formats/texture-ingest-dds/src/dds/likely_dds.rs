use super::constants::*;
use endian_writer::{EndianReader, LittleEndianReader};

/// Cheap content sniff for files whose URL does not say what they are.
///
/// Only the `"DDS "` magic and room for the 128-byte legacy header are checked; pixel
/// format, layout and payload length are left to [`parse_dds`].
///
/// [`parse_dds`]: crate::dds::parse_dds::parse_dds
#[inline(always)]
pub fn likely_dds(data: &[u8]) -> bool {
    if data.len() < DDS_HEADER_SIZE {
        return false;
    }

    // SAFETY: data.len() >= DDS_HEADER_SIZE, so the magic is in bounds.
    unsafe { LittleEndianReader::new(data.as_ptr()).read_u32() == DDS_MAGIC }
}
