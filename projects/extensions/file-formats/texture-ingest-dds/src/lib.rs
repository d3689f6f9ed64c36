#![doc = "DirectDraw Surface (DDS) container parsing for the texture-ingest pipeline."]
#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod dds;

pub use dds::*;

#[cfg(test)]
pub(crate) mod test_prelude;
