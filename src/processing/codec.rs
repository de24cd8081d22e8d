//! Decoding, render surfaces and format-specific encoding.
//!
//! Decoding goes through the `image` crate for every supported input. JPEG and
//! PNG are encoded with the `image` crate encoders, WebP with libwebp via the
//! `webp` crate so the quality factor is honoured. While compressing, PNG
//! output is reduced to a NeuQuant palette sized by the quality factor.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use color_quant::NeuQuant;
use crate::utils::{ConverterError, ConverterResult, ImageFormat};

/// Largest surface side in pixels
pub const MAX_SURFACE_SIDE: u32 = 32_767;
/// Largest surface area in pixels
pub const MAX_SURFACE_AREA: u64 = 268_435_456;

const MAX_PALETTE_COLORS: usize = 256;
/// NeuQuant sampling factor (1 best, 30 fastest)
const QUANT_SAMPLE_FACTOR: i32 = 10;

type Result<T> = ConverterResult<T>;

/// A decoded bitmap together with the container format it was sniffed as.
pub struct DecodedImage {
    pub image: DynamicImage,
    pub detected: image::ImageFormat,
}

/// Encoded output of a pipeline stage.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Decodes `bytes` into a bitmap, sniffing the format from its content.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    let detected = image::guess_format(bytes)
        .map_err(|e| ConverterError::decode(format!("Unrecognised image data: {e}")))?;
    let image = image::load_from_memory_with_format(bytes, detected)
        .map_err(|e| ConverterError::decode(format!("Failed to decode {detected:?} image: {e}")))?;
    Ok(DecodedImage { image, detected })
}

/// RGBA drawing surface sized to the bitmap drawn on it.
pub struct RenderSurface {
    pixels: RgbaImage,
}

impl RenderSurface {
    /// Draws `image` onto a new surface of exactly its dimensions.
    pub fn draw(image: &DynamicImage) -> Result<Self> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self {
            pixels: image.to_rgba8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Redraws the surface scaled by `factor` on each axis, never below 1px.
    pub fn scaled(&self, factor: f32) -> Result<Self> {
        let width = ((self.width() as f32 * factor) as u32).max(1);
        let height = ((self.height() as f32 * factor) as u32).max(1);
        check_dimensions(width, height)?;
        Ok(Self {
            pixels: imageops::resize(&self.pixels, width, height, FilterType::Triangle),
        })
    }

    /// Encodes the surface as `format`. `quality` is a factor in (0, 1].
    pub fn encode(&self, format: ImageFormat, quality: f32) -> Result<EncodedImage> {
        let data = match format {
            ImageFormat::JPEG => encode_jpeg(&self.pixels, quality)?,
            ImageFormat::PNG => encode_png(&self.pixels)?,
            ImageFormat::WebP => encode_webp(&self.pixels, quality)?,
        };
        Ok(self.wrap(data, format))
    }

    /// Encodes for size rather than fidelity: PNG below quality 1 is written
    /// as an indexed image of about `256 * quality` colours. Other formats
    /// encode exactly as [`RenderSurface::encode`].
    pub fn encode_compressed(&self, format: ImageFormat, quality: f32) -> Result<EncodedImage> {
        match format {
            ImageFormat::PNG if quality < 1.0 => {
                let data = encode_png_quantized(&self.pixels, palette_size(quality))?;
                Ok(self.wrap(data, format))
            }
            _ => self.encode(format, quality),
        }
    }

    fn wrap(&self, data: Vec<u8>, format: ImageFormat) -> EncodedImage {
        EncodedImage {
            data,
            format,
            width: self.width(),
            height: self.height(),
        }
    }
}

/// The encoder parameter `quality` resolves to under
/// [`RenderSurface::encode_compressed`]. Equal settings on the same surface
/// give identical output.
pub fn compressed_setting(format: ImageFormat, quality: f32) -> u32 {
    match format {
        ImageFormat::PNG if quality >= 1.0 => u32::MAX,
        ImageFormat::PNG => palette_size(quality) as u32,
        _ => quality_percent(quality) as u32,
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ConverterError::rendering_context(format!(
            "cannot create a {width}x{height} surface"
        )));
    }
    if width > MAX_SURFACE_SIDE
        || height > MAX_SURFACE_SIDE
        || width as u64 * height as u64 > MAX_SURFACE_AREA
    {
        return Err(ConverterError::rendering_context(format!(
            "{width}x{height} exceeds the maximum surface size"
        )));
    }
    Ok(())
}

/// Maps a (0, 1] factor onto the 1-100 scale encoders expect.
fn quality_percent(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode_jpeg(pixels: &RgbaImage, quality: f32) -> Result<Vec<u8>> {
    let rgb = flatten_onto_black(pixels);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality_percent(quality))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ConverterError::encode(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(pixels.as_raw(), pixels.width(), pixels.height(), ExtendedColorType::Rgba8)
        .map_err(|e| ConverterError::encode(format!("PNG encode failed: {e}")))?;
    Ok(out)
}

fn palette_size(quality: f32) -> usize {
    let colors = (quality.clamp(0.0, 1.0) * MAX_PALETTE_COLORS as f32).round() as usize;
    colors.clamp(2, MAX_PALETTE_COLORS)
}

fn encode_png_quantized(pixels: &RgbaImage, colors: usize) -> Result<Vec<u8>> {
    let quantizer = NeuQuant::new(QUANT_SAMPLE_FACTOR, colors, pixels.as_raw());
    let indices: Vec<u8> = pixels
        .as_raw()
        .chunks_exact(4)
        .map(|pixel| quantizer.index_of(pixel) as u8)
        .collect();

    let color_map = quantizer.color_map_rgba();
    let mut palette = Vec::with_capacity(colors * 3);
    let mut alpha = Vec::with_capacity(colors);
    for entry in color_map.chunks_exact(4) {
        palette.extend_from_slice(&entry[..3]);
        alpha.push(entry[3]);
    }

    let png_error = |e: png::EncodingError| ConverterError::encode(format!("PNG encode failed: {e}"));
    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, pixels.width(), pixels.height());
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(palette);
    encoder.set_trns(alpha);
    let mut writer = encoder.write_header().map_err(png_error)?;
    writer.write_image_data(&indices).map_err(png_error)?;
    writer.finish().map_err(png_error)?;
    Ok(out)
}

fn encode_webp(pixels: &RgbaImage, quality: f32) -> Result<Vec<u8>> {
    let encoder = webp::Encoder::from_rgba(pixels.as_raw(), pixels.width(), pixels.height());
    let memory = encoder
        .encode_simple(false, quality_percent(quality) as f32)
        .map_err(|e| ConverterError::encode(format!("WebP encode failed: {e:?}")))?;
    Ok(memory.to_vec())
}

/// JPEG has no alpha channel: transparent pixels end up black.
fn flatten_onto_black(pixels: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let Rgba([r, g, b, a]) = *pixels.get_pixel(x, y);
        let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    })
}
