//! Pixel offset to GPS projection.
//!
//! Flat-ground pinhole approximation:
//! 1. the field of view (taken along the image diagonal) and the camera
//!    height give the diagonal ground footprint,
//! 2. the footprint is split into per-axis extents by the pixel aspect ratio,
//! 3. the pixel offset from image center is scaled linearly to meters, with
//!    image rows flipped so north is up,
//! 4. the offset is rotated by the camera heading (counter-clockwise),
//! 5. meters are converted to degrees on a local tangent plane.
//!
//! No lens or perspective correction is applied. Accuracy degrades with
//! distance from the origin, and longitude blows up as the origin
//! approaches a pole.

use std::fmt;

use serde::Serialize;

use crate::calibration::{CameraCalibration, METERS_PER_DEGREE};
use crate::error::GeoError;

/// Pixel dimensions of the decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
}

impl ImageFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel coordinates of the image center.
    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    fn check(&self) -> Result<(), GeoError> {
        if self.width == 0 || self.height == 0 {
            return Err(GeoError::calibration(format!(
                "image dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// A (longitude, latitude) pair in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Finite, with latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

impl fmt::Display for GeoPoint {
    /// KML coordinate order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

/// Ground-plane displacement from the origin in meters (x east, y north
/// before heading rotation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundOffset {
    pub x_m: f64,
    pub y_m: f64,
}

impl GroundOffset {
    /// Counter-clockwise rotation by `heading_deg`.
    pub fn rotated(self, heading_deg: f64) -> Self {
        let (sin, cos) = heading_deg.to_radians().sin_cos();
        Self {
            x_m: self.x_m * cos - self.y_m * sin,
            y_m: self.x_m * sin + self.y_m * cos,
        }
    }
}

/// Ground extent covered by the whole image, `(width_m, height_m)`.
pub fn ground_footprint(
    frame: ImageFrame,
    calibration: &CameraCalibration,
) -> Result<(f64, f64), GeoError> {
    frame.check()?;
    let diagonal = calibration.ground_diagonal_m();
    let (w, h) = (frame.width as f64, frame.height as f64);
    let diagonal_px = w.hypot(h);
    Ok((diagonal * w / diagonal_px, diagonal * h / diagonal_px))
}

/// Unrotated ground offset for a pixel offset from the image center.
///
/// Positive `dy` (down the image) maps to negative `y_m` (south).
pub fn ground_offset(
    dx: f64,
    dy: f64,
    frame: ImageFrame,
    calibration: &CameraCalibration,
) -> Result<GroundOffset, GeoError> {
    let (width_m, height_m) = ground_footprint(frame, calibration)?;
    Ok(GroundOffset {
        x_m: (dx / frame.width as f64) * width_m,
        y_m: -(dy / frame.height as f64) * height_m,
    })
}

/// Project a pixel offset from the image center to a geographic point.
///
/// `dx`/`dy` are measured in pixels from the image center, x to the right
/// and y down the image.
pub fn project(
    dx: f64,
    dy: f64,
    frame: ImageFrame,
    calibration: &CameraCalibration,
) -> Result<GeoPoint, GeoError> {
    let offset = ground_offset(dx, dy, frame, calibration)?.rotated(calibration.heading_deg());
    Ok(offset_to_geo(offset, calibration))
}

fn offset_to_geo(offset: GroundOffset, calibration: &CameraCalibration) -> GeoPoint {
    let origin = calibration.origin();
    let lon_scale = METERS_PER_DEGREE * origin.latitude.to_radians().cos();
    GeoPoint {
        longitude: origin.longitude + offset.x_m / lon_scale,
        latitude: origin.latitude + offset.y_m / METERS_PER_DEGREE,
    }
}
