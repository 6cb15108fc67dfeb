//! One-shot run: detections on one image to one KML file.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::collect::collect;
use crate::config::{DetectorSettings, GeotagConfig};
use crate::detect::{BackendRegistry, Detection, FileBackend};
use crate::geo::ImageFrame;
use crate::kml::write_kml;

/// What a run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub placed: usize,
    pub skipped: usize,
    pub output: PathBuf,
}

/// `<name>_locations.kml`, where `<name>` is the image file name up to its
/// first `.`.
pub fn default_output_path(image_path: &Path) -> PathBuf {
    let file_name = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    PathBuf::from(format!("{}_locations.kml", stem))
}

/// Register the detector backend for this run.
///
/// A detections file wins. Otherwise an ONNX model is used when the crate
/// was built with `backend-tract` and a model path is configured.
pub fn build_registry(
    detections_path: Option<&Path>,
    detector: &DetectorSettings,
) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    if let Some(path) = detections_path {
        registry.register(FileBackend::open(path)?);
        return Ok(registry);
    }

    #[cfg(feature = "backend-tract")]
    if let Some(model_path) = &detector.model_path {
        registry.register(crate::detect::TractBackend::new(
            model_path,
            detector.params.clone(),
            detector.class_names.clone(),
        )?);
        return Ok(registry);
    }

    #[cfg(not(feature = "backend-tract"))]
    if let Some(model_path) = &detector.model_path {
        return Err(anyhow!(
            "model {} configured, but ONNX inference requires the backend-tract feature; \
             pass --detections <file.json> instead",
            model_path.display()
        ));
    }

    Err(anyhow!(
        "no detector configured: pass --detections <file.json>, or build with \
         --features backend-tract and set --model"
    ))
}

/// Project `detections` and write them as KML to `output`.
///
/// Fails on invalid geometry or I/O; malformed boxes are only counted.
pub fn geotag(
    detections: &[Detection],
    frame: ImageFrame,
    cfg: &GeotagConfig,
    output: &Path,
) -> Result<RunSummary> {
    let collection = collect(detections, frame, &cfg.calibration)?;
    write_kml(output, &collection.placements, &cfg.markers)?;
    Ok(RunSummary {
        placed: collection.placements.len(),
        skipped: collection.skipped.len(),
        output: output.to_path_buf(),
    })
}
