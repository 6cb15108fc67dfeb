//! Precomputed detections read from a JSON file.
//!
//! Lets an external detector (any framework, any language) hand its boxes to
//! the projector. Accepted shapes:
//!
//! ```json
//! [{"label": "car", "xmin": 10, "ymin": 20, "xmax": 50, "ymax": 60, "confidence": 0.9}]
//! ```
//!
//! or the same array under a top-level `"detections"` key.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult};

#[derive(Deserialize)]
#[serde(untagged)]
enum DetectionsFile {
    Bare(Vec<Detection>),
    Wrapped { detections: Vec<Detection> },
}

/// Backend that replays detections loaded from disk.
pub struct FileBackend {
    path: PathBuf,
    detections: Vec<Detection>,
}

impl FileBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read detections file {}", path.display()))?;
        let detections = Self::parse(&raw)
            .with_context(|| format!("invalid detections file {}", path.display()))?;
        log::info!(
            "loaded {} detections from {}",
            detections.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            detections,
        })
    }

    pub fn parse(raw: &str) -> Result<Vec<Detection>> {
        let file: DetectionsFile = serde_json::from_str(raw)?;
        Ok(match file {
            DetectionsFile::Bare(detections) => detections,
            DetectionsFile::Wrapped { detections } => detections,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DetectorBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn detect(&mut self, _pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        let (w, h) = (width as f64, height as f64);
        let outside = self
            .detections
            .iter()
            .filter(|det| {
                let b = det.bbox;
                b.xmin < 0.0 || b.ymin < 0.0 || b.xmax > w || b.ymax > h
            })
            .count();
        if outside > 0 {
            log::debug!(
                "{} detections in {} extend past the {}x{} image",
                outside,
                self.path.display(),
                width,
                height
            );
        }
        Ok(DetectionResult {
            detections: self.detections.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::detect::result::BoundingBox;

    #[test]
    fn parses_bare_and_wrapped_arrays() {
        let bare = FileBackend::parse(
            r#"[{"label": "bus", "xmin": 0, "ymin": 0, "xmax": 4, "ymax": 2, "confidence": 0.7}]"#,
        )
        .unwrap();
        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].bbox, BoundingBox::new(0.0, 0.0, 4.0, 2.0));
        assert_eq!(bare[0].confidence, 0.7);

        let wrapped = FileBackend::parse(
            r#"{"detections": [{"label": "car", "xmin": 1, "ymin": 1, "xmax": 2, "ymax": 2}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped[0].label, "car");

        assert!(FileBackend::parse(r#"{"boxes": []}"#).is_err());
    }

    #[test]
    fn replays_file_contents() {
        let mut file = NamedTempFile::new().expect("temp detections");
        file.write_all(
            br#"[{"label": "person", "xmin": 10, "ymin": 10, "xmax": 20, "ymax": 30},
                 {"label": "truck", "xmin": 50, "ymin": 60, "xmax": 90, "ymax": 99}]"#,
        )
        .expect("write detections");

        let mut backend = FileBackend::open(file.path()).unwrap();
        assert_eq!(backend.path(), file.path());
        let result = backend.detect(&[], 100, 100).unwrap();
        let labels: Vec<&str> = result.detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["person", "truck"]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = FileBackend::open("/nonexistent/detections.json")
            .err()
            .expect("missing file");
        assert!(err.to_string().contains("/nonexistent/detections.json"));
    }
}
