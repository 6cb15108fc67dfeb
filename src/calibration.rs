//! Camera calibration used for every projection.
//!
//! A `CameraCalibration` is built once at startup from the layered
//! configuration and passed by reference into each projection call. It can
//! only be constructed through [`CameraCalibration::new`], so any value in
//! hand already satisfies the geometric preconditions.

use serde::Serialize;

use crate::error::GeoError;

/// Flat-earth approximation of ground distance per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Geographic origin of the camera (the point directly below it).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Origin {
    pub latitude: f64,
    pub longitude: f64,
}

/// Immutable camera parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CameraCalibration {
    height_m: f64,
    fov_deg: f64,
    heading_deg: f64,
    origin: Origin,
}

impl CameraCalibration {
    /// Build a calibration, rejecting degenerate geometry.
    ///
    /// `heading_deg` is measured counter-clockwise from north. `fov_deg` is
    /// the field of view along the image diagonal.
    pub fn new(
        height_m: f64,
        fov_deg: f64,
        heading_deg: f64,
        origin: Origin,
    ) -> Result<Self, GeoError> {
        if !height_m.is_finite() || height_m <= 0.0 {
            return Err(GeoError::calibration(format!(
                "camera height must be a positive number of meters, got {}",
                height_m
            )));
        }
        if !fov_deg.is_finite() || fov_deg <= 0.0 || fov_deg >= 180.0 {
            return Err(GeoError::calibration(format!(
                "field of view must lie strictly between 0 and 180 degrees, got {}",
                fov_deg
            )));
        }
        if !heading_deg.is_finite() {
            return Err(GeoError::calibration(format!(
                "heading must be finite, got {}",
                heading_deg
            )));
        }
        if !origin.latitude.is_finite() || origin.latitude.abs() >= 90.0 {
            return Err(GeoError::calibration(format!(
                "origin latitude must lie strictly between -90 and 90, got {}",
                origin.latitude
            )));
        }
        if !origin.longitude.is_finite() || origin.longitude.abs() > 180.0 {
            return Err(GeoError::calibration(format!(
                "origin longitude must lie within [-180, 180], got {}",
                origin.longitude
            )));
        }
        Ok(Self {
            height_m,
            fov_deg,
            heading_deg,
            origin,
        })
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    pub fn fov_deg(&self) -> f64 {
        self.fov_deg
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Same camera, different heading. Validation of the other fields carries over.
    pub fn with_heading(self, heading_deg: f64) -> Result<Self, GeoError> {
        Self::new(self.height_m, self.fov_deg, heading_deg, self.origin)
    }

    /// Diagonal extent of the ground footprint in meters.
    pub fn ground_diagonal_m(&self) -> f64 {
        2.0 * self.height_m * (self.fov_deg / 2.0).to_radians().tan()
    }
}
