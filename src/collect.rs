//! Detection collection: box centers to labelled geographic points.

use serde::Serialize;

use crate::calibration::CameraCalibration;
use crate::detect::Detection;
use crate::error::GeoError;
use crate::geo::{self, GeoPoint, ImageFrame};

/// A projected detection, ready for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub label: String,
    pub point: GeoPoint,
}

/// Output of [`collect`]: placements in input order plus the detections
/// that had to be skipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    pub placements: Vec<Placement>,
    /// Always `GeoError::MalformedDetection`.
    pub skipped: Vec<GeoError>,
}

enum Outcome {
    Placed(Placement),
    Skipped(GeoError),
}

/// Project every detection's box center.
///
/// Malformed boxes are logged and reported in [`Collection::skipped`]
/// without stopping the others. An invalid frame or calibration is fatal.
pub fn collect(
    detections: &[Detection],
    frame: ImageFrame,
    calibration: &CameraCalibration,
) -> Result<Collection, GeoError> {
    geo::ground_footprint(frame, calibration)?;

    let outcomes = detections
        .iter()
        .enumerate()
        .map(|(index, det)| place(index, det, frame, calibration))
        .collect::<Result<Vec<_>, _>>()?;

    let (placements, skipped) = outcomes.into_iter().fold(
        (Vec::new(), Vec::new()),
        |(mut placements, mut skipped), outcome| {
            match outcome {
                Outcome::Placed(p) => placements.push(p),
                Outcome::Skipped(e) => skipped.push(e),
            }
            (placements, skipped)
        },
    );
    Ok(Collection {
        placements,
        skipped,
    })
}

fn place(
    index: usize,
    det: &Detection,
    frame: ImageFrame,
    calibration: &CameraCalibration,
) -> Result<Outcome, GeoError> {
    let skip = |reason: &str| {
        let err = GeoError::MalformedDetection {
            index,
            label: det.label.clone(),
            reason: reason.to_string(),
        };
        log::warn!("skipping {}", err);
        Outcome::Skipped(err)
    };
    if let Some(reason) = det.bbox.defect() {
        return Ok(skip(reason));
    }

    let (cx, cy) = det.bbox.center();
    let (mid_x, mid_y) = frame.center();
    let point = geo::project(cx - mid_x, cy - mid_y, frame, calibration)?;
    if !point.is_valid() {
        return Ok(skip("box projects outside valid latitude/longitude"));
    }
    log::debug!("#{} {} at ({:.1}, {:.1}) -> {}", index, det.label, cx, cy, point);
    Ok(Outcome::Placed(Placement {
        label: det.label.clone(),
        point,
    }))
}
