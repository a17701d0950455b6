use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{imageops, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::colormap::ColorScale;
use crate::errors::{NdviError, Result};
use crate::index::IndexArray;

// Constants
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME: Rgb<u8> = Rgb([0, 0, 0]);
const COLORBAR_GAP: u32 = 10; // Minimum space between plot and colour bar
const TICK_LENGTH: u32 = 4;

/// Layout of a rendered index figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub scale: ColorScale,
    pub colorbar: bool,
    pub colorbar_width: u32,
    /// Colour bar height as a fraction of the plot height
    pub colorbar_shrink: f64,
    /// White margin around the figure
    pub padding: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: ColorScale::default(),
            colorbar: true,
            colorbar_width: 20,
            colorbar_shrink: 0.8,
            padding: 10,
        }
    }
}

/// Colour-map every index value, one output pixel per input pixel
pub fn render_heatmap(index: &IndexArray, scale: &ColorScale) -> RgbImage {
    let (width, height) = index.dimensions();
    let values = index.values();
    RgbImage::from_fn(width, height, |x, y| {
        scale.map(values[y as usize * width as usize + x as usize])
    })
}

/// Render the full figure: padded heatmap plus an optional colour bar on the right
pub fn render_index(index: &IndexArray, options: &RenderOptions) -> Result<RgbImage> {
    let (plot_width, plot_height) = index.dimensions();
    let pad = options.padding;

    let colorbar_extent = if options.colorbar {
        pad.max(COLORBAR_GAP)
            .checked_add(options.colorbar_width)
            .and_then(|extent| extent.checked_add(TICK_LENGTH))
    } else {
        Some(0)
    };

    let width = colorbar_extent.and_then(|extent| {
        pad.checked_add(plot_width)?.checked_add(extent)?.checked_add(pad)
    });
    let height = pad.checked_add(plot_height).and_then(|h| h.checked_add(pad));
    let (width, height) = match (width, height) {
        (Some(width), Some(height)) => (width, height),
        _ => {
            return Err(NdviError::FigureTooLarge(format!(
                "{}x{} plot with padding {} and colour bar width {}",
                plot_width, plot_height, pad, options.colorbar_width
            )))
        }
    };
    let mut figure = RgbImage::from_pixel(width, height, BACKGROUND);

    let heatmap = render_heatmap(index, &options.scale);
    imageops::replace(&mut figure, &heatmap, pad as i64, pad as i64);

    if options.colorbar {
        let bar_x = pad + plot_width + pad.max(COLORBAR_GAP);
        draw_colorbar(&mut figure, bar_x, pad, plot_height, options);
    }

    Ok(figure)
}

/// Vertical gradient, high values on top, centred on the plot height
fn draw_colorbar(figure: &mut RgbImage, x: u32, plot_top: u32, plot_height: u32, options: &RenderOptions) {
    let bar_height = (plot_height as f64 * options.colorbar_shrink).round() as u32;
    if bar_height == 0 || options.colorbar_width == 0 {
        return;
    }
    let top = plot_top + (plot_height - bar_height.min(plot_height)) / 2;

    for row in 0..bar_height {
        let t = if bar_height > 1 {
            1.0 - row as f64 / (bar_height - 1) as f64
        } else {
            0.5
        };
        let color = options.scale.at(t);
        draw_filled_rect_mut(
            figure,
            Rect::at(x as i32, (top + row) as i32).of_size(options.colorbar_width, 1),
            color,
        );
    }

    draw_hollow_rect_mut(
        figure,
        Rect::at(x as i32 - 1, top as i32 - 1).of_size(options.colorbar_width + 2, bar_height + 2),
        FRAME,
    );

    // Ticks at vmax, midpoint and vmin
    let tick_x = (x + options.colorbar_width) as i32;
    for offset in [0, (bar_height - 1) / 2, bar_height - 1] {
        draw_filled_rect_mut(
            figure,
            Rect::at(tick_x, (top + offset) as i32).of_size(TICK_LENGTH, 1),
            FRAME,
        );
    }
}

/// Encode an image into an in-memory buffer
pub fn encode_image(image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format)?;
    Ok(buffer.into_inner())
}

/// Encode an image as PNG
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    encode_image(image, ImageFormat::Png)
}

/// Save a rendered figure, format chosen from the file extension.
/// Nothing is written unless encoding succeeds.
pub fn save_rendered<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;
    let bytes = encode_image(image, format)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// MIME type announced for a download in `format`
pub fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::calculate_synthetic_ndvi;

    fn black_index(width: u32, height: u32) -> IndexArray {
        calculate_synthetic_ndvi(&RgbImage::new(width, height))
    }

    #[test]
    fn heatmap_matches_index_dimensions() {
        let heatmap = render_heatmap(&black_index(7, 4), &ColorScale::default());
        assert_eq!(heatmap.dimensions(), (7, 4));
        // Black pixels sit at the neutral midpoint
        assert_eq!(*heatmap.get_pixel(3, 2), Rgb([255, 255, 191]));
    }

    #[test]
    fn figure_without_colorbar_is_padded_plot() {
        let options = RenderOptions { colorbar: false, padding: 3, ..RenderOptions::default() };
        let figure = render_index(&black_index(10, 6), &options).unwrap();
        assert_eq!(figure.dimensions(), (16, 12));
        assert_eq!(*figure.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*figure.get_pixel(3, 3), Rgb([255, 255, 191]));
    }

    #[test]
    fn colorbar_runs_from_high_to_low() {
        let options = RenderOptions { padding: 10, colorbar_width: 8, colorbar_shrink: 1.0, ..RenderOptions::default() };
        let figure = render_index(&black_index(20, 50), &options).unwrap();
        assert_eq!(figure.dimensions(), (10 + 20 + 10 + 8 + TICK_LENGTH + 10, 70));

        let bar_x = 10 + 20 + 10 + 4;
        assert_eq!(*figure.get_pixel(bar_x, 10 + 1), options.scale.at(1.0 - 1.0 / 49.0));
        assert_eq!(*figure.get_pixel(bar_x, 10 + 48), options.scale.at(1.0 - 48.0 / 49.0));
        // Frame drawn around the bar
        assert_eq!(*figure.get_pixel(bar_x, 9), FRAME);
    }

    #[test]
    fn empty_index_renders_background_only() {
        let figure = render_index(&black_index(0, 0), &RenderOptions::default()).unwrap();
        assert!(figure.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn png_buffer_decodes_back() {
        let figure = render_index(&black_index(5, 5), &RenderOptions::default()).unwrap();
        let bytes = encode_png(&figure).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, figure);
    }

    #[test]
    fn save_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.tif");
        save_rendered(&render_heatmap(&black_index(4, 4), &ColorScale::default()), &path).unwrap();
        assert_eq!(image::ImageFormat::from_path(&path).unwrap(), ImageFormat::Tiff);
        assert_eq!(image::open(&path).unwrap().width(), 4);
    }

    #[test]
    fn overflowing_layout_is_an_error() {
        let options = RenderOptions { padding: u32::MAX / 2, ..RenderOptions::default() };
        match render_index(&black_index(4, 4), &options) {
            Err(NdviError::FigureTooLarge(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|f| f.dimensions())),
        }

        let wide_bar = RenderOptions { colorbar_width: u32::MAX - 8, ..RenderOptions::default() };
        assert!(render_index(&black_index(4, 4), &wide_bar).is_err());
    }

    #[test]
    fn failed_encode_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.ico");
        // ICO tops out at 256 pixels per side
        let figure = RgbImage::new(300, 300);
        assert!(save_rendered(&figure, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn known_mime_types() {
        assert_eq!(mime_type(ImageFormat::Png), "image/png");
        assert_eq!(mime_type(ImageFormat::Jpeg), "image/jpeg");
    }
}
