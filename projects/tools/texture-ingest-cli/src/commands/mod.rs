pub mod inspect;
pub mod transcode;
