use super::constants::align_4;
use super::parse_ktx::ByteOrder;
use alloc::string::String;
use texture_ingest_common::{FormatError, FormatResult, KeyValueData};

/// Decodes the key/value block that follows the KTX header.
///
/// Each entry is `{keyAndValueByteSize: u32, key, NUL, value}` followed by padding to a
/// 4-byte boundary. `block_offset` is the file offset of `block`, used for error reporting.
///
/// # Errors
///
/// [`FormatError::MalformedKeyValueData`] if an entry overruns the block, has no NUL
/// terminated key, or the key is not UTF-8.
pub fn parse_key_value_data(
    block: &[u8],
    block_offset: usize,
    order: ByteOrder,
) -> FormatResult<KeyValueData> {
    let mut entries = KeyValueData::new();
    let mut cursor = 0usize;

    while cursor < block.len() {
        let malformed = FormatError::MalformedKeyValueData {
            offset: block_offset + cursor,
        };
        let Some(entry_size) = order.read_u32(&block[cursor..]) else {
            return Err(malformed);
        };
        let entry_size = entry_size as usize;
        let entry_start = cursor + 4;
        let entry_end = match entry_start.checked_add(entry_size) {
            Some(end) if end <= block.len() => end,
            _ => return Err(malformed),
        };

        let entry = &block[entry_start..entry_end];
        let Some(nul) = entry.iter().position(|&byte| byte == 0) else {
            return Err(malformed);
        };
        let key = match core::str::from_utf8(&entry[..nul]) {
            Ok(key) => String::from(key),
            Err(_) => return Err(malformed),
        };
        entries.insert(key, entry[nul + 1..].to_vec());

        cursor = align_4(entry_end);
    }

    Ok(entries)
}
