//! Upload module for atomic and chunked package uploads

pub mod chunked;
pub mod digest;
pub mod strategy;
pub mod uploader;

pub use chunked::ChunkedUploader;
pub use digest::DigestUtils;
pub use strategy::{ChunkRange, Transfer};
pub use uploader::Uploader;
