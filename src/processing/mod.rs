//! Image pipeline: decode, size-budgeted compression, format conversion and
//! batch orchestration.

pub mod batch;
pub mod codec;
mod compressor;
mod converter;

pub use batch::{BatchConfig, BatchProcessor};
pub use codec::{DecodedImage, EncodedImage, RenderSurface};
pub use compressor::compress;
pub use converter::convert;
