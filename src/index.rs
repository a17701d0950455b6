//! Synthetic vegetation index computed from visible colour channels.
//!
//! Near-infrared is not measured; it is approximated per pixel as the mean of
//! the red, green and blue channels. The normalised difference against red is
//! then shifted from `[-1, 1]` into the display range `[0, 1]`.

use std::ops::Deref;

use image::{DynamicImage, ImageBuffer, Pixel};
use serde::Serialize;

use crate::errors::{NdviError, Result};

/// Added to the denominator so a fully black pixel yields 0 instead of NaN
pub const EPSILON: f64 = 1e-8;

/// Per-pixel index values, row-major, same width and height as the source
#[derive(Debug, Clone, PartialEq)]
pub struct IndexArray {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

/// Summary statistics over an index array
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl IndexArray {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Index at column `x`, row `y`, or `None` outside the grid
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// All values in row-major order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Min, max and mean; `None` for an empty image
    pub fn stats(&self) -> Option<IndexStats> {
        if self.values.is_empty() {
            return None;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &value in &self.values {
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }

        Some(IndexStats {
            min,
            max,
            mean: sum / self.values.len() as f64,
        })
    }
}

/// Normalised difference between the approximated NIR band and red, in `[-1, 1]`
#[inline]
pub fn raw_index(red: f64, green: f64, blue: f64) -> f64 {
    let nir_approx = (red + green + blue) / 3.0;
    (nir_approx - red) / (nir_approx + red + EPSILON)
}

/// Raw index shifted into the display range `[0, 1]`
#[inline]
pub fn pixel_index(red: f64, green: f64, blue: f64) -> f64 {
    (raw_index(red, green, blue) + 1.0) / 2.0
}

/// Compute the synthetic index for every pixel of `image`.
///
/// Channels 0, 1 and 2 are read as red, green and blue; any further channel
/// (alpha) is ignored. Values are not clamped: negative channel values may
/// produce indices outside `[0, 1]`.
///
/// # Panics
///
/// Panics when the pixel type has fewer than three channels. Decoded images
/// should go through [`calculate_from_dynamic`], which rejects them instead.
pub fn calculate_synthetic_ndvi<P, C>(image: &ImageBuffer<P, C>) -> IndexArray
where
    P: Pixel,
    P::Subpixel: Into<f64>,
    C: Deref<Target = [P::Subpixel]>,
{
    assert!(
        P::CHANNEL_COUNT >= 3,
        "synthetic index needs 3 colour channels, pixel type has {}",
        P::CHANNEL_COUNT
    );

    let (width, height) = image.dimensions();
    let values = image
        .pixels()
        .map(|pixel| {
            let channels = pixel.channels();
            pixel_index(channels[0].into(), channels[1].into(), channels[2].into())
        })
        .collect();

    IndexArray { width, height, values }
}

/// Validate the colour layout of a decoded image and compute its index,
/// keeping the source bit depth.
pub fn calculate_from_dynamic(image: &DynamicImage) -> Result<IndexArray> {
    let color = image.color();
    if !color.has_color() {
        let alpha = u8::from(color.has_alpha());
        return Err(NdviError::UnsupportedChannels {
            found: color.channel_count() - alpha,
        });
    }

    let index = match image {
        DynamicImage::ImageRgb8(buffer) => calculate_synthetic_ndvi(buffer),
        DynamicImage::ImageRgba8(buffer) => calculate_synthetic_ndvi(buffer),
        DynamicImage::ImageRgb16(buffer) => calculate_synthetic_ndvi(buffer),
        DynamicImage::ImageRgba16(buffer) => calculate_synthetic_ndvi(buffer),
        DynamicImage::ImageRgb32F(buffer) => calculate_synthetic_ndvi(buffer),
        DynamicImage::ImageRgba32F(buffer) => calculate_synthetic_ndvi(buffer),
        other => calculate_synthetic_ndvi(&other.to_rgb32f()),
    };

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use image::{imageops, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(5, 3, |x, y| {
            Rgb([(x * 50) as u8, (y * 90 + 10) as u8, ((x + y) * 30) as u8])
        })
    }

    #[test]
    fn black_pixel_is_neutral() {
        assert_eq!(raw_index(0.0, 0.0, 0.0), 0.0);
        assert_approx_eq!(pixel_index(0.0, 0.0, 0.0), 0.5, 1e-12);
    }

    #[test]
    fn grey_pixels_are_neutral() {
        for v in [1.0, 64.0, 255.0] {
            assert_approx_eq!(pixel_index(v, v, v), 0.5, 1e-9);
        }
    }

    #[test]
    fn known_values() {
        // nir = 100, raw = (100 - 0) / (100 + 0) = 1
        assert_approx_eq!(pixel_index(0.0, 150.0, 150.0), 1.0, 1e-9);
        // nir = 85, raw = (85 - 255) / (85 + 255) = -0.5
        assert_approx_eq!(pixel_index(255.0, 0.0, 0.0), 0.25, 1e-9);
        // nir = 100, raw = (100 - 60) / 160 = 0.25
        assert_approx_eq!(pixel_index(60.0, 120.0, 120.0), 0.625, 1e-9);
    }

    #[test]
    fn low_red_scores_above_midpoint() {
        assert!(pixel_index(20.0, 200.0, 60.0) > 0.5);
        assert!(pixel_index(230.0, 40.0, 30.0) < 0.5);
    }

    #[test]
    fn non_negative_channels_stay_in_unit_range() {
        let steps = [0.0, 1.0, 17.0, 128.0, 254.0, 255.0, 4095.0];
        for &r in &steps {
            for &g in &steps {
                for &b in &steps {
                    let value = pixel_index(r, g, b);
                    assert!(value.is_finite());
                    assert!((0.0..=1.0).contains(&value), "({r}, {g}, {b}) -> {value}");
                }
            }
        }
    }

    #[test]
    fn raw_index_decreases_as_red_grows() {
        let (g, b) = (90.0, 40.0);
        let mut previous = raw_index(0.0, g, b);
        for step in 1..=255 {
            let current = raw_index(step as f64, g, b);
            assert!(current < previous, "red={step}: {current} !< {previous}");
            previous = current;
        }
    }

    #[test]
    fn output_shape_matches_input() {
        let index = calculate_synthetic_ndvi(&sample_image());
        assert_eq!(index.dimensions(), (5, 3));
        assert_eq!(index.values().len(), 15);
        assert!(index.get(5, 0).is_none());
        assert!(index.get(0, 3).is_none());
    }

    #[test]
    fn values_follow_pixel_positions() {
        let image = sample_image();
        let index = calculate_synthetic_ndvi(&image);
        for (x, y, pixel) in image.enumerate_pixels() {
            let expected = pixel_index(pixel[0].into(), pixel[1].into(), pixel[2].into());
            assert_eq!(index.get(x, y), Some(expected));
        }
    }

    #[test]
    fn permuting_pixels_permutes_output() {
        let image = sample_image();
        let rotated = imageops::rotate180(&image);
        let index = calculate_synthetic_ndvi(&image);
        let rotated_index = calculate_synthetic_ndvi(&rotated);
        let (w, h) = index.dimensions();
        for y in 0..h {
            for x in 0..w {
                assert_eq!(index.get(x, y), rotated_index.get(w - 1 - x, h - 1 - y));
            }
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let image = sample_image();
        assert_eq!(calculate_synthetic_ndvi(&image), calculate_synthetic_ndvi(&image));
    }

    #[test]
    fn alpha_channel_is_ignored() {
        let opaque = RgbaImage::from_pixel(2, 2, Rgba([30, 200, 90, 255]));
        let clear = RgbaImage::from_pixel(2, 2, Rgba([30, 200, 90, 0]));
        assert_eq!(calculate_synthetic_ndvi(&opaque), calculate_synthetic_ndvi(&clear));
    }

    #[test]
    fn sixteen_bit_matches_eight_bit() {
        let eight = RgbImage::from_pixel(1, 1, Rgb([40, 180, 120]));
        let sixteen = DynamicImage::ImageRgb8(eight.clone()).to_rgb16();
        let a = calculate_synthetic_ndvi(&eight).get(0, 0).unwrap();
        let b = calculate_synthetic_ndvi(&sixteen).get(0, 0).unwrap();
        assert_approx_eq!(a, b, 1e-9);
    }

    #[test]
    fn float_pixels_are_accepted() {
        let image = DynamicImage::ImageRgb8(sample_image()).to_rgb32f();
        let index = calculate_synthetic_ndvi(&image);
        assert_eq!(index.dimensions(), (5, 3));
        assert!(index.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn negative_channels_are_not_clamped() {
        assert!(pixel_index(-50.0, 10.0, 10.0) > 1.0);
    }

    #[test]
    fn dynamic_grayscale_is_rejected() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([100])));
        match calculate_from_dynamic(&gray) {
            Err(NdviError::UnsupportedChannels { found }) => assert_eq!(found, 1),
            other => panic!("unexpected result: {:?}", other),
        }

        let gray_alpha = DynamicImage::ImageLumaA8(gray.to_luma_alpha8());
        assert!(matches!(
            calculate_from_dynamic(&gray_alpha),
            Err(NdviError::UnsupportedChannels { found: 1 })
        ));
    }

    #[test]
    fn dynamic_colour_matches_direct_call() {
        let image = sample_image();
        let direct = calculate_synthetic_ndvi(&image);
        let dynamic = calculate_from_dynamic(&DynamicImage::ImageRgb8(image)).unwrap();
        assert_eq!(direct, dynamic);
    }

    #[test]
    #[should_panic(expected = "3 colour channels")]
    fn single_channel_buffer_panics() {
        let gray = GrayImage::from_pixel(2, 2, Luma([10]));
        let _ = calculate_synthetic_ndvi(&gray);
    }

    #[test]
    fn stats_cover_all_values() {
        let image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([0, 150, 150]) }
        });
        let stats = calculate_synthetic_ndvi(&image).stats().unwrap();
        assert_approx_eq!(stats.min, 0.5, 1e-9);
        assert_approx_eq!(stats.max, 1.0, 1e-9);
        assert_approx_eq!(stats.mean, 0.75, 1e-9);
    }

    #[test]
    fn empty_image_has_no_stats() {
        let index = calculate_synthetic_ndvi(&RgbImage::new(0, 0));
        assert!(index.stats().is_none());
    }
}
