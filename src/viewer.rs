// Preview window for rendered figures (minifb framebuffer)

use std::time::Duration;

use image::RgbImage;
use minifb::{Key, Window, WindowOptions};

use crate::errors::{NdviError, Result};

/// Pack RGB pixels into the 0x00RRGGBB words minifb expects
pub fn to_framebuffer(image: &RgbImage) -> Vec<u32> {
    image
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect()
}

/// Show `image` until the window is closed or Escape is pressed
pub fn show_image(title: &str, image: &RgbImage) -> Result<()> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if width == 0 || height == 0 {
        return Err(NdviError::Other("Cannot display an empty image".to_string()));
    }
    let buffer = to_framebuffer(image);

    let mut window = Window::new(
        title,
        width,
        height,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| NdviError::Other(format!("Failed to create window: {}", e)))?;

    window.limit_update_rate(Some(Duration::from_millis(50))); // 20 FPS

    log::debug!("Viewer open: {}x{}", width, height);
    while window.is_open() && !window.is_key_down(Key::Escape) {
        window
            .update_with_buffer(&buffer, width, height)
            .map_err(|e| NdviError::Other(format!("Failed to update window: {}", e)))?;
    }

    Ok(())
}
