//! Geotagging of object detections on aerial images.
//!
//! Each detection's box center is projected from pixel space to latitude
//! and longitude with a flat-ground pinhole approximation, then written as
//! a KML placemark.
//!
//! # Module Structure
//!
//! - `calibration`: immutable camera parameters (`CameraCalibration`)
//! - `geo`: the pixel offset to `GeoPoint` projection
//! - `collect`: detections to ordered, labelled placements
//! - `detect`: detector backends (precomputed file, stub, ONNX via tract)
//! - `kml`: marker styles and KML rendering
//! - `config`: layered startup configuration
//! - `frame`: image decoding
//! - `pipeline`: the one-shot run used by the `detect_gps` binary

pub mod calibration;
pub mod collect;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod geo;
pub mod kml;
pub mod pipeline;

pub use calibration::{CameraCalibration, Origin, METERS_PER_DEGREE};
pub use collect::{collect, Collection, Placement};
pub use config::{GeotagConfig, Overrides};
pub use detect::{BoundingBox, Detection, DetectionResult, DetectorBackend};
pub use error::GeoError;
pub use geo::{project, GeoPoint, ImageFrame};
pub use kml::{render_kml, write_kml, MarkerStyles};
