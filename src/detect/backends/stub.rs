use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult};

/// Stub backend for testing. Returns the same detections for every image.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    detections: Vec<Detection>,
    calls: u64,
}

impl StubBackend {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            calls: 0,
        }
    }

    /// Number of `detect` calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<DetectionResult> {
        self.calls += 1;
        Ok(DetectionResult {
            detections: self.detections.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    #[test]
    fn stub_backend_replays_detections() {
        let det = Detection::new("person", BoundingBox::new(1.0, 2.0, 3.0, 4.0), 0.5);
        let mut backend = StubBackend::new(vec![det.clone()]);

        let r1 = backend.detect(b"frame1", 10, 10).unwrap();
        let r2 = backend.detect(b"frame2", 10, 10).unwrap();
        assert_eq!(r1.detections, vec![det]);
        assert_eq!(r1, r2);
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn empty_stub_yields_nothing() {
        let mut backend = StubBackend::default();
        assert!(backend.detect(&[], 1, 1).unwrap().detections.is_empty());
    }
}
