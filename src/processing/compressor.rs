//! Size-budgeted recompression.
//!
//! The image is redrawn and re-encoded in its own format. While the encoding
//! is over budget (or bigger than the input) the quality factor is lowered and,
//! if the first encoding was over budget, the surface is shrunk by 5% per axis,
//! for at most `max_iteration` trials. PNG quality is the palette size.

use tracing::debug;
use crate::core::ConversionOptions;
use crate::utils::{ConverterResult, ImageFormat};
use super::codec::{EncodedImage, RenderSurface, compressed_setting, decode};

/// Per-axis scale applied on each trial once the budget is exceeded
const SCALE_STEP: f32 = 0.95;
const DECODED_PROGRESS: u8 = 5;
const RENDERED_PROGRESS: u8 = 10;

/// Forwards progress to a sink, never letting the value go backwards.
struct ProgressReporter<'a> {
    sink: &'a dyn Fn(u8),
    last: Option<u8>,
}

impl<'a> ProgressReporter<'a> {
    fn new(sink: &'a dyn Fn(u8)) -> Self {
        Self { sink, last: None }
    }

    fn report(&mut self, percent: u8) {
        let percent = percent.min(100).max(self.last.unwrap_or(0));
        if self.last != Some(percent) {
            self.last = Some(percent);
            (self.sink)(percent);
        }
    }
}

/// Recompresses `source` towards the size budget in `options`.
///
/// The output keeps the input's format when it is jpeg, png or webp and falls
/// back to png otherwise. `sink` receives non-decreasing values from 0 to 100.
pub fn compress(
    source: &[u8],
    options: &ConversionOptions,
    sink: &dyn Fn(u8),
) -> ConverterResult<EncodedImage> {
    let mut progress = ProgressReporter::new(sink);
    progress.report(0);

    let decoded = decode(source)?;
    progress.report(DECODED_PROGRESS);

    let source_format = ImageFormat::from_detected(decoded.detected);
    let format = source_format.unwrap_or(ImageFormat::PNG);
    let max_bytes = options.max_size_bytes();
    let source_size = source.len() as u64;

    let mut surface = RenderSurface::draw(&decoded.image)?;
    let mut quality = options.initial_quality;
    let mut current = surface.encode_compressed(format, quality)?;
    progress.report(RENDERED_PROGRESS);

    let rendered_size = current.data.len() as u64;
    let exceeds_budget = rendered_size > max_bytes;
    if !exceeds_budget && rendered_size <= source_size {
        progress.report(100);
        return Ok(current);
    }

    let mut remaining = options.max_iteration;
    let mut current_size = rendered_size;
    let mut setting = compressed_setting(format, quality);
    while remaining > 0 && (current_size > max_bytes || current_size > source_size) {
        remaining -= 1;
        quality *= format.quality_step();
        let next_setting = compressed_setting(format, quality);
        // an unscaled surface at an unchanged setting re-encodes identically
        if !exceeds_budget && next_setting == setting {
            continue;
        }
        setting = next_setting;

        if exceeds_budget {
            surface = surface.scaled(SCALE_STEP)?;
        }
        current = surface.encode_compressed(format, quality)?;
        current_size = current.data.len() as u64;

        if exceeds_budget {
            let gained = rendered_size.saturating_sub(current_size) * 100 / (rendered_size - max_bytes);
            progress.report(gained.min(99) as u8);
        }
    }

    debug!(
        "Compressed {} bytes to {} bytes as {} ({}x{}, quality {:.2}, {} trials)",
        source_size,
        current_size,
        format,
        current.width,
        current.height,
        quality,
        options.max_iteration - remaining
    );
    progress.report(100);

    if current_size > source_size && source_format == Some(format) {
        debug!("Recompression grew the file, keeping the original bytes");
        return Ok(EncodedImage {
            data: source.to_vec(),
            format,
            width: decoded.image.width(),
            height: decoded.image.height(),
        });
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgb, RgbImage};
    use crate::utils::ConverterError;

    fn noisy_jpeg(side: u32) -> Vec<u8> {
        let mut seed = 0x2545_f491_u32;
        let image = RgbImage::from_fn(side, side, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let [r, g, b, _] = seed.to_le_bytes();
            Rgb([r, g, b])
        });
        let mut out = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 95)
            .write_image(image.as_raw(), side, side, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    fn noisy_png(side: u32) -> Vec<u8> {
        let mut seed = 0x6c07_8965_u32;
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(side, side, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let [r, g, b, _] = seed.to_le_bytes();
            Rgb([r, g, b])
        }));
        let mut out = std::io::Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn low_quality_jpeg(side: u32) -> Vec<u8> {
        let decoded = image::load_from_memory(&noisy_jpeg(side)).unwrap().to_rgb8();
        let mut out = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 5)
            .write_image(decoded.as_raw(), side, side, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    fn solid_png(side: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(side, side, Rgb([10, 120, 200])));
        let mut out = std::io::Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn run(source: &[u8], options: &ConversionOptions) -> (ConverterResult<EncodedImage>, Vec<u8>) {
        let seen = RefCell::new(Vec::new());
        let sink = |p: u8| seen.borrow_mut().push(p);
        let result = compress(source, options, &sink);
        (result, seen.into_inner())
    }

    #[test]
    fn over_budget_image_shrinks_and_reports_monotonic_progress() {
        let source = noisy_jpeg(256);
        let options = ConversionOptions { max_size_mb: 0.01, ..ConversionOptions::default() };

        let (result, seen) = run(&source, &options);
        let out = result.unwrap();

        assert_eq!(out.format, ImageFormat::JPEG);
        assert!(out.width < 256 && out.height < 256);
        assert!((out.data.len() as u64) < source.len() as u64);
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {seen:?}");
    }

    #[test]
    fn reachable_budget_is_met() {
        let source = noisy_jpeg(256);
        let options = ConversionOptions {
            max_size_mb: 0.01,
            max_iteration: 40,
            ..ConversionOptions::default()
        };

        let (result, _) = run(&source, &options);
        let out = result.unwrap();

        assert!(
            out.data.len() as u64 <= options.max_size_bytes(),
            "{} bytes over a {} byte budget", out.data.len(), options.max_size_bytes()
        );
        assert_eq!(image::load_from_memory(&out.data).unwrap().width(), out.width);
    }

    #[test]
    fn over_budget_png_is_palettized_under_budget() {
        let source = noisy_png(128);
        let options = ConversionOptions { max_size_mb: 0.02, ..ConversionOptions::default() };
        assert!(source.len() as u64 > options.max_size_bytes());

        let (result, seen) = run(&source, &options);
        let out = result.unwrap();

        assert_eq!(out.format, ImageFormat::PNG);
        assert!(out.data.len() as u64 <= options.max_size_bytes());
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn input_that_cannot_be_beaten_is_returned_unchanged() {
        let source = low_quality_jpeg(64);
        let options = ConversionOptions { max_iteration: 2, ..ConversionOptions::default() };

        let (result, seen) = run(&source, &options);
        let out = result.unwrap();

        assert_eq!(out.data, source);
        assert_eq!(out.format, ImageFormat::JPEG);
        assert_eq!((out.width, out.height), (64, 64));
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn within_budget_image_keeps_dimensions_and_never_grows() {
        let source = solid_png(32);
        let (result, seen) = run(&source, &ConversionOptions::default());
        let out = result.unwrap();

        assert_eq!(out.format, ImageFormat::PNG);
        assert_eq!((out.width, out.height), (32, 32));
        assert!(out.data.len() <= source.len());
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn undecodable_input_fails_before_any_encoding() {
        let (result, seen) = run(b"not an image at all", &ConversionOptions::default());
        assert!(matches!(result, Err(ConverterError::Decode(_))));
        assert_eq!(seen, vec![0]);
    }

    #[test]
    fn reporter_holds_the_highest_value() {
        let seen = RefCell::new(Vec::new());
        let sink = |p: u8| seen.borrow_mut().push(p);
        let mut reporter = ProgressReporter::new(&sink);
        for p in [0, 30, 20, 30, 150] {
            reporter.report(p);
        }
        assert_eq!(seen.into_inner(), vec![0, 30, 100]);
    }
}
