//! Image decoding.
//!
//! The decoder only has to supply pixel dimensions for the projection and
//! RGB pixels for detector backends that run a model.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;

use crate::geo::ImageFrame;

/// A decoded image.
pub struct LoadedImage {
    pub frame: ImageFrame,
    pub rgb: RgbImage,
}

impl LoadedImage {
    /// Row-major RGB8 bytes.
    pub fn pixels(&self) -> &[u8] {
        self.rgb.as_raw()
    }
}

/// Decode an image file from disk.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?;
    let rgb = decoded.to_rgb8();
    let frame = ImageFrame::new(rgb.width(), rgb.height());
    if frame.width == 0 || frame.height == 0 {
        return Err(anyhow!("image {} has no pixels", path.display()));
    }
    log::info!(
        "decoded {} ({}x{})",
        path.display(),
        frame.width,
        frame.height
    );
    Ok(LoadedImage { frame, rgb })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dimensions_from_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aerial.png");
        RgbImage::from_pixel(64, 48, image::Rgb([10, 20, 30]))
            .save(&path)
            .expect("write png");

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.frame, ImageFrame::new(64, 48));
        assert_eq!(loaded.pixels().len(), 64 * 48 * 3);
        assert_eq!(&loaded.pixels()[..3], &[10, 20, 30]);
    }

    #[test]
    fn missing_image_is_an_error() {
        let err = load_image(Path::new("/nonexistent/aerial.jpg"))
            .err()
            .expect("missing image");
        assert!(err.to_string().contains("aerial.jpg"));
    }
}
