//! The decoded image model produced by the container parsers and the transcoder.

use crate::format::TextureFormat;
use alloc::string::String;
use alloc::vec::Vec;

/// One mip level of one image.
///
/// `bytes.len()` equals [`TextureFormat::level_byte_len`] of `width` x `height` for the
/// format of the set the level belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelBuffer {
    pub level_index: u32,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl LevelBuffer {
    pub fn new(level_index: u32, width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            level_index,
            width,
            height,
            bytes,
        }
    }
}

/// One image with its ordered mip chain; `levels[0]` is full resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub image_index: u32,
    pub width: u32,
    pub height: u32,
    pub levels: Vec<LevelBuffer>,
}

impl DecodedImage {
    pub fn new(image_index: u32, width: u32, height: u32) -> Self {
        Self {
            image_index,
            width,
            height,
            levels: Vec::new(),
        }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Total payload bytes across every level.
    pub fn byte_len(&self) -> usize {
        self.levels.iter().map(|level| level.bytes.len()).sum()
    }
}

/// Key/value metadata entries from a KTX header, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueData {
    entries: Vec<(String, Vec<u8>)>,
}

impl KeyValueData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: Vec<u8>) {
        self.entries.push((key, value));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Value under `key` as UTF-8 with the trailing NUL (if any) removed.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        let value = self.get(key)?;
        let value = value.strip_suffix(&[0]).unwrap_or(value);
        core::str::from_utf8(value).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The result of parsing a container: a uniformly formatted image set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContainer {
    /// Format shared by every level of every image.
    pub format: TextureFormat,
    pub images: Vec<DecodedImage>,
    /// Only populated when the parser was asked to decode metadata.
    pub key_value_data: Option<KeyValueData>,
}
