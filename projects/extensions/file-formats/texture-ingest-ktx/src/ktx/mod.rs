/// KTX header layout constants.
pub mod constants;

/// Key/value metadata block decoding.
pub mod key_value;

/// Determine if a file is a KTX file.
pub mod likely_ktx;

/// Split a KTX file into per-level buffers.
pub mod parse_ktx;

pub use likely_ktx::*;
pub use parse_ktx::*;
