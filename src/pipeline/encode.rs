//! Image encoding: `DynamicImage` → JPEG bytes under a size ceiling.
//!
//! Platforms reject uploads above roughly 1 MB. Pages are encoded at
//! maximum quality first and re-encoded at falling quality until they fit.
//! The loop is bounded twice, by a quality floor and by an attempt cap, so an
//! incompressible page ends at the floor instead of spinning.

use crate::config::RenderConfig;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Starting JPEG quality.
pub const MAX_QUALITY: u8 = 100;

/// A JPEG and the quality it was encoded at.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub quality: u8,
}

/// Encode `img` as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let rgb = img.to_rgb8();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, MAX_QUALITY));
    rgb.write_with_encoder(encoder)?;
    Ok(buf)
}

/// Encode `img` as JPEG, lowering quality until it fits `config.byte_budget`.
///
/// An image still above budget once the floor or the attempt cap is reached
/// is returned as is.
pub fn encode_under_budget(
    img: &DynamicImage,
    config: &RenderConfig,
) -> Result<EncodedImage, image::ImageError> {
    let floor = config.quality_floor.clamp(1, MAX_QUALITY);
    let step = config.quality_step.max(1);
    let mut quality = MAX_QUALITY;
    let mut bytes = encode_jpeg(img, quality)?;
    let mut attempts = 1;

    while bytes.len() > config.byte_budget && quality > floor && attempts < config.max_attempts {
        quality = quality.saturating_sub(step).max(floor);
        bytes = encode_jpeg(img, quality)?;
        attempts += 1;
        debug!("Re-encoded at quality {} → {} bytes", quality, bytes.len());
    }

    Ok(EncodedImage { bytes, quality })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    /// Deterministic noise: JPEG compresses it poorly, which exercises the
    /// quality loop.
    fn noise(size: u32) -> DynamicImage {
        let mut state: u32 = 0x2545_f491;
        DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let b = state.to_le_bytes();
            Rgb([b[0], b[1], b[2]])
        }))
    }

    #[test]
    fn small_image_keeps_max_quality() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 40, Rgba([200, 10, 10, 255])));
        let out = encode_under_budget(&img, &RenderConfig::default()).unwrap();
        assert_eq!(out.quality, MAX_QUALITY);
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
    }

    #[test]
    fn oversize_image_is_reencoded_smaller() {
        let img = noise(256);
        let full = encode_jpeg(&img, MAX_QUALITY).unwrap().len();
        let config = RenderConfig {
            byte_budget: full - 1,
            ..RenderConfig::default()
        };
        let out = encode_under_budget(&img, &config).unwrap();
        assert!(out.quality < MAX_QUALITY);
        assert!(out.bytes.len() <= config.byte_budget || out.quality == config.quality_floor);
    }

    #[test]
    fn impossible_budget_stops_at_floor() {
        let img = noise(128);
        let config = RenderConfig {
            byte_budget: 10,
            ..RenderConfig::default()
        };
        let out = encode_under_budget(&img, &config).unwrap();
        assert_eq!(out.quality, config.quality_floor);
        assert!(out.bytes.len() > 10);
    }

    #[test]
    fn attempt_cap_bounds_the_loop() {
        let img = noise(64);
        let config = RenderConfig {
            byte_budget: 10,
            quality_step: 1,
            max_attempts: 3,
            ..RenderConfig::default()
        };
        let out = encode_under_budget(&img, &config).unwrap();
        assert_eq!(out.quality, MAX_QUALITY - 2);
    }
}
