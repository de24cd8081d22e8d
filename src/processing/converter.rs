//! Re-encoding into the requested output format.

use tracing::debug;
use crate::utils::{ConverterResult, ImageFormat};
use super::codec::{EncodedImage, RenderSurface, decode};

/// Decodes `compressed`, draws it on a surface of identical size and encodes
/// that surface as `target` at `quality`.
///
/// No resizing happens here: output dimensions always equal the decoded
/// bitmap's.
pub fn convert(compressed: &[u8], target: ImageFormat, quality: f32) -> ConverterResult<EncodedImage> {
    let decoded = decode(compressed)?;
    let surface = RenderSurface::draw(&decoded.image)?;
    let encoded = surface.encode(target, quality)?;
    debug!(
        "Converted {:?} {}x{} to {} ({} bytes)",
        decoded.detected,
        encoded.width,
        encoded.height,
        target,
        encoded.data.len()
    );
    Ok(encoded)
}
