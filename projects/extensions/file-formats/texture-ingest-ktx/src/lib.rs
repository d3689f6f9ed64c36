//! KTX (version 1) container parsing.
//!
//! [`parse_ktx`] validates a KTX file held in memory and splits it into per-level buffers
//! described by the shared [`texture_ingest_common`] image model. Only plain 2D textures are
//! accepted: cube maps, arrays and volume textures are rejected with
//! [`FormatError::UnsupportedLayout`].
//!
//! ```ignore
//! let container = texture_ingest_ktx::parse_ktx(&bytes)?;
//! for level in &container.images[0].levels {
//!     upload(level.width, level.height, &level.bytes);
//! }
//! ```
//!
//! [`FormatError::UnsupportedLayout`]: texture_ingest_common::FormatError::UnsupportedLayout

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod ktx;

pub use ktx::*;

#[cfg(test)]
pub(crate) mod test_prelude;
