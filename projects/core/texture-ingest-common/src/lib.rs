//! Shared building blocks for the texture-ingest container parsers and transcoders.
//!
//! This crate holds the pieces every stage of the ingestion pipeline agrees on:
//!
//! - The format capability table ([`CompressedFormat`], [`UncompressedFormat`], [`TextureFormat`]),
//!   which knows the block footprint and byte cost of every format a decoded image may carry.
//! - The decoded image model ([`LevelBuffer`], [`DecodedImage`], [`ParsedContainer`]).
//! - The error type returned by the container parsers ([`FormatError`]).
//!
//! Nothing in here performs I/O; the crate is `no_std` with `alloc`.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod error;
pub mod format;
pub mod image;
pub mod mip;

pub use error::{FormatError, FormatResult, UnknownPixelFormat, UnsupportedLayout};
pub use format::{CompressedFormat, GlFormat, GlType, TextureFormat, UncompressedFormat};
pub use image::{DecodedImage, KeyValueData, LevelBuffer, ParsedContainer};
pub use mip::{mip_dimension, mip_dimensions, MAX_MIP_LEVELS};

#[cfg(test)]
pub(crate) mod test_prelude;
