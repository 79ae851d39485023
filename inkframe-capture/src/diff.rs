//! Per-pixel perceptual difference between two encoded frames.

use crate::error::CaptureError;

/// Fraction of differing pixels above which a frame counts as changed.
pub const CHANGE_RATIO_THRESHOLD: f64 = 0.005;

/// A pixel counts as differing when any RGB channel moves by more than
/// this many steps (out of 255).
pub const PER_CHANNEL_DELTA: u8 = 25;

/// Fraction of pixels differing between two PNG-encoded frames of equal
/// dimensions, in `0.0..=1.0`.
pub fn change_ratio(previous: &[u8], current: &[u8]) -> Result<f64, CaptureError> {
    let previous = image::load_from_memory(previous)?.into_rgb8();
    let current = image::load_from_memory(current)?.into_rgb8();

    if previous.dimensions() != current.dimensions() {
        let (pw, ph) = previous.dimensions();
        let (cw, ch) = current.dimensions();
        return Err(CaptureError::DimensionMismatch {
            previous: format!("{pw}x{ph}"),
            current: format!("{cw}x{ch}"),
        });
    }

    let differing = previous
        .pixels()
        .zip(current.pixels())
        .filter(|(a, b)| {
            a.0.iter()
                .zip(b.0.iter())
                .any(|(&x, &y)| x.abs_diff(y) > PER_CHANNEL_DELTA)
        })
        .count();

    let (width, height) = previous.dimensions();
    Ok(differing as f64 / f64::from(width * height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_of(img: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).expect("encode");
        out.into_inner()
    }

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    #[test]
    fn identical_frames_have_zero_ratio() {
        let png = png_of(&solid(40, 40, [80, 80, 80]));
        assert_eq!(change_ratio(&png, &png).expect("ratio"), 0.0);
    }

    #[test]
    fn ratio_counts_only_pixels_past_the_channel_delta() {
        let mut changed = solid(10, 10, [80, 80, 80]);
        // 3 pixels nudged within tolerance, 4 pixels moved far.
        for x in 0..3 {
            changed.put_pixel(x, 0, Rgb([80 + 20, 80, 80]));
        }
        for x in 0..4 {
            changed.put_pixel(x, 5, Rgb([255, 80, 80]));
        }
        let base = png_of(&solid(10, 10, [80, 80, 80]));
        let ratio = change_ratio(&base, &png_of(&changed)).expect("ratio");
        assert!((ratio - 0.04).abs() < 1e-9, "got {ratio}, expected 4/100");
    }

    #[test]
    fn fully_different_frames_ratio_one() {
        let a = png_of(&solid(16, 16, [0, 0, 0]));
        let b = png_of(&solid(16, 16, [255, 255, 255]));
        assert_eq!(change_ratio(&a, &b).expect("ratio"), 1.0);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let a = png_of(&solid(16, 16, [0, 0, 0]));
        let b = png_of(&solid(16, 8, [0, 0, 0]));
        assert!(matches!(
            change_ratio(&a, &b),
            Err(CaptureError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let a = png_of(&solid(16, 16, [0, 0, 0]));
        assert!(matches!(
            change_ratio(&a, b"not a png"),
            Err(CaptureError::Decode(_))
        ));
    }
}
