use anyhow::Result;

use crate::detect::result::DetectionResult;

/// Detector backend trait.
///
/// The object detector is an external collaborator. Backends adapt a model
/// (or precomputed results) to pixel-space boxes with class labels.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on an RGB8 image.
    ///
    /// `pixels` is row-major, three bytes per pixel, `width * height * 3` long.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
