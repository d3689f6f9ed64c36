use super::constants::*;

/// Determines if the given data likely represents a KTX texture.
/// This is done by checking the 12-byte identifier at offset 0 and that the fixed header fits.
/// For full validation, use [`parse_ktx`].
///
/// [`parse_ktx`]: crate::ktx::parse_ktx::parse_ktx
#[inline(always)]
pub fn likely_ktx(data: &[u8]) -> bool {
    data.len() >= KTX_HEADER_SIZE && data[..KTX_MAGIC.len()] == KTX_MAGIC
}
