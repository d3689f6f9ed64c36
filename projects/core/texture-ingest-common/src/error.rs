//! Error types for container parsing.

use thiserror::Error;

/// Result type for container parsing operations
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while validating or decoding a texture container (KTX, DDS).
///
/// These are never retried; they are surfaced to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The file identifier / magic bytes at the start of the buffer do not match.
    #[error("Invalid container magic")]
    InvalidMagic,

    /// Input buffer is too short to contain the fixed-size header.
    #[error("Input buffer too short: required at least {required} bytes, got {actual} bytes")]
    InputTooShort { required: usize, actual: usize },

    /// A header field holds a value the container format does not allow.
    #[error("Invalid container header: {0}")]
    InvalidHeader(&'static str),

    /// The KTX endianness sentinel is neither `0x04030201` nor its byte-swapped form.
    #[error("Invalid endianness sentinel {0:#010X}")]
    InvalidEndianness(u32),

    /// Big-endian files with multi-byte pixel elements would need their payload
    /// byte-swapped; that path is not implemented.
    #[error("Big-endian payload with {type_size}-byte elements is not supported")]
    UnsupportedEndianness { type_size: u32 },

    /// Cube maps, texture arrays and volume textures are rejected.
    #[error("Unsupported texture layout: {0}")]
    UnsupportedLayout(UnsupportedLayout),

    /// The pixel format could not be resolved through the format capability table.
    #[error("Unknown pixel format: {0}")]
    UnknownPixelFormat(UnknownPixelFormat),

    /// A mip level's declared byte span runs past the end of the buffer.
    #[error("Mip level {level} truncated: needs {required} bytes at offset {offset}, buffer holds {actual}")]
    TruncatedLevel {
        level: u32,
        offset: usize,
        required: usize,
        actual: usize,
    },

    /// A mip level's declared byte span is smaller than its dimensions require.
    #[error("Mip level {level} holds {actual} bytes, {expected} required by its dimensions")]
    LevelTooSmall {
        level: u32,
        expected: usize,
        actual: usize,
    },

    /// A key/value metadata entry overran its block or lacked a NUL terminated key.
    #[error("Malformed key/value metadata entry at offset {offset}")]
    MalformedKeyValueData { offset: usize },
}

/// The kind of non-2D layout a container declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedLayout {
    /// More than one face.
    CubeMap { faces: u32 },
    /// More than one array element.
    TextureArray { elements: u32 },
    /// Depth greater than one.
    Volume { depth: u32 },
    /// A resource dimension other than 2D (DDS DX10 header).
    NotTwoDimensional { dimension: u32 },
}

impl core::fmt::Display for UnsupportedLayout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UnsupportedLayout::CubeMap { faces } => write!(f, "cube map ({faces} faces)"),
            UnsupportedLayout::TextureArray { elements } => {
                write!(f, "texture array ({elements} elements)")
            }
            UnsupportedLayout::Volume { depth } => write!(f, "volume texture (depth {depth})"),
            UnsupportedLayout::NotTwoDimensional { dimension } => {
                write!(f, "resource dimension {dimension}")
            }
        }
    }
}

/// The raw identifier of a pixel format that was not found in the format table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownPixelFormat {
    /// KTX `glInternalFormat` on the compressed path.
    GlInternalFormat(u32),
    /// KTX `glType` + `glFormat` pair on the uncompressed path.
    GlTypeAndFormat { gl_type: u32, gl_format: u32 },
    /// DDS legacy FourCC code.
    FourCc(u32),
    /// DDS DX10 `DXGI_FORMAT` value.
    Dxgi(u32),
    /// DDS legacy uncompressed pixel format described by bit count and masks.
    PixelMasks { bit_count: u32, flags: u32 },
}

impl core::fmt::Display for UnknownPixelFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UnknownPixelFormat::GlInternalFormat(value) => {
                write!(f, "glInternalFormat {value:#06X}")
            }
            UnknownPixelFormat::GlTypeAndFormat { gl_type, gl_format } => {
                write!(f, "glType {gl_type:#06X} / glFormat {gl_format:#06X}")
            }
            UnknownPixelFormat::FourCc(code) => {
                let bytes = code.to_le_bytes();
                if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                    write!(
                        f,
                        "FourCC '{}{}{}{}'",
                        bytes[0] as char, bytes[1] as char, bytes[2] as char, bytes[3] as char
                    )
                } else {
                    write!(f, "FourCC {code:#010X}")
                }
            }
            UnknownPixelFormat::Dxgi(value) => write!(f, "DXGI_FORMAT {value}"),
            UnknownPixelFormat::PixelMasks { bit_count, flags } => {
                write!(f, "{bit_count}-bit pixel format (flags {flags:#X})")
            }
        }
    }
}
