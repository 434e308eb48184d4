//! Codec implementations for picked media

pub mod heic;
pub mod thumbnail;
pub mod video;
