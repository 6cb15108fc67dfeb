use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env::VarError;
use std::path::{Path, PathBuf};

use crate::calibration::{CameraCalibration, Origin};
use crate::detect::yolo::{YoloParams, VISDRONE_CLASSES};
use crate::kml::MarkerStyles;

const DEFAULT_CAMERA_HEIGHT_M: f64 = 25.0;
const DEFAULT_FOV_DEG: f64 = 79.52;
const DEFAULT_HEADING_DEG: f64 = 0.0;
const DEFAULT_ORIGIN_LAT: f64 = 37.540683333333334;
const DEFAULT_ORIGIN_LON: f64 = 127.07928611111111;

#[derive(Debug, Deserialize, Default)]
struct GeotagConfigFile {
    camera: Option<CameraConfigFile>,
    origin: Option<OriginConfigFile>,
    detector: Option<DetectorConfigFile>,
    markers: Option<MarkersConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    height_m: Option<f64>,
    fov_deg: Option<f64>,
    heading_deg: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct OriginConfigFile {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    max_detections: Option<usize>,
    class_names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct MarkersConfigFile {
    default_icon: Option<String>,
    icons: Option<BTreeMap<String, String>>,
}

/// Validated startup configuration.
#[derive(Debug, Clone)]
pub struct GeotagConfig {
    pub calibration: CameraCalibration,
    pub detector: DetectorSettings,
    pub markers: MarkerStyles,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub model_path: Option<PathBuf>,
    pub params: YoloParams,
    pub class_names: Vec<String>,
}

/// Command-line values that win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub height_m: Option<f64>,
    pub fov_deg: Option<f64>,
    pub heading_deg: Option<f64>,
    pub origin_latitude: Option<f64>,
    pub origin_longitude: Option<f64>,
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct CameraSettings {
    height_m: f64,
    fov_deg: f64,
    heading_deg: f64,
    latitude: f64,
    longitude: f64,
}

/// Settings while layers are still being applied.
struct Layered {
    camera: CameraSettings,
    detector: DetectorSettings,
    markers: MarkerStyles,
}

impl GeotagConfig {
    /// Defaults, then the config file (`config_path` or `GEOTAG_CONFIG`),
    /// then `GEOTAG_*` environment variables, then `overrides`.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var("GEOTAG_CONFIG")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        };
        let file_cfg = match path.as_deref() {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut layered = Layered::from_file(file_cfg.unwrap_or_default());
        layered.apply_env()?;
        layered.apply_overrides(overrides);
        layered.validate()
    }
}

impl Layered {
    fn from_file(file: GeotagConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        let origin = file.origin.unwrap_or_default();
        let camera = CameraSettings {
            height_m: camera.height_m.unwrap_or(DEFAULT_CAMERA_HEIGHT_M),
            fov_deg: camera.fov_deg.unwrap_or(DEFAULT_FOV_DEG),
            heading_deg: camera.heading_deg.unwrap_or(DEFAULT_HEADING_DEG),
            latitude: origin.latitude.unwrap_or(DEFAULT_ORIGIN_LAT),
            longitude: origin.longitude.unwrap_or(DEFAULT_ORIGIN_LON),
        };

        let det = file.detector.unwrap_or_default();
        let defaults = YoloParams::default();
        let detector = DetectorSettings {
            model_path: det.model_path,
            params: YoloParams {
                input_size: det.input_size.unwrap_or(defaults.input_size),
                confidence_threshold: det
                    .confidence_threshold
                    .unwrap_or(defaults.confidence_threshold),
                iou_threshold: det.iou_threshold.unwrap_or(defaults.iou_threshold),
                max_detections: det.max_detections.unwrap_or(defaults.max_detections),
            },
            class_names: det.class_names.unwrap_or_else(|| {
                VISDRONE_CLASSES.iter().map(|name| name.to_string()).collect()
            }),
        };

        let mut markers = MarkerStyles::default();
        if let Some(file_markers) = file.markers {
            if let Some(default_icon) = file_markers.default_icon {
                markers.set_default_icon(default_icon);
            }
            for (label, href) in file_markers.icons.unwrap_or_default() {
                markers.insert(label, href);
            }
        }

        Self {
            camera,
            detector,
            markers,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(height) = env_f64("GEOTAG_CAMERA_HEIGHT")? {
            self.camera.height_m = height;
        }
        if let Some(fov) = env_f64("GEOTAG_FOV_DEG")? {
            self.camera.fov_deg = fov;
        }
        if let Some(heading) = env_f64("GEOTAG_HEADING_DEG")? {
            self.camera.heading_deg = heading;
        }
        if let Some(lat) = env_f64("GEOTAG_ORIGIN_LAT")? {
            self.camera.latitude = lat;
        }
        if let Some(lon) = env_f64("GEOTAG_ORIGIN_LON")? {
            self.camera.longitude = lon;
        }
        if let Some(path) = env_string("GEOTAG_MODEL_PATH")? {
            self.detector.model_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        let camera = &mut self.camera;
        camera.height_m = overrides.height_m.unwrap_or(camera.height_m);
        camera.fov_deg = overrides.fov_deg.unwrap_or(camera.fov_deg);
        camera.heading_deg = overrides.heading_deg.unwrap_or(camera.heading_deg);
        camera.latitude = overrides.origin_latitude.unwrap_or(camera.latitude);
        camera.longitude = overrides.origin_longitude.unwrap_or(camera.longitude);
        if let Some(path) = &overrides.model_path {
            self.detector.model_path = Some(path.clone());
        }
    }

    fn validate(self) -> Result<GeotagConfig> {
        let camera = self.camera;
        let calibration = CameraCalibration::new(
            camera.height_m,
            camera.fov_deg,
            camera.heading_deg,
            Origin {
                latitude: camera.latitude,
                longitude: camera.longitude,
            },
        )?;

        let params = &self.detector.params;
        if !(0.0..=1.0).contains(&params.confidence_threshold) {
            return Err(anyhow!("detector confidence_threshold must be within 0..=1"));
        }
        if !(0.0..=1.0).contains(&params.iou_threshold) {
            return Err(anyhow!("detector iou_threshold must be within 0..=1"));
        }
        if params.input_size == 0 {
            return Err(anyhow!("detector input_size must be greater than zero"));
        }
        if params.max_detections == 0 {
            return Err(anyhow!("detector max_detections must be greater than zero"));
        }

        Ok(GeotagConfig {
            calibration,
            detector: self.detector,
            markers: self.markers,
        })
    }
}

fn read_config_file(path: &Path) -> Result<GeotagConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match env_string(key)? {
        Some(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a number, got '{}'", key, value)),
        None => Ok(None),
    }
}

/// Non-blank value of `key`. Unset and blank are `None`; non-UTF-8 is an error.
fn env_string(key: &str) -> Result<Option<String>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
        Ok(_) | Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(anyhow!("{} must be valid UTF-8", key)),
    }
}
