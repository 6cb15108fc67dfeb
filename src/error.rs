use thiserror::Error;

/// Geometric failures raised while projecting detections.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// The camera calibration or image dimensions make the projection degenerate.
    /// Fatal: no meaningful output can be produced.
    #[error("invalid calibration: {reason}")]
    InvalidCalibration { reason: String },

    /// A single detection box is non-finite or inverted. Recoverable: the
    /// detection is skipped and the rest are still projected.
    #[error("malformed detection #{index} ({label}): {reason}")]
    MalformedDetection {
        index: usize,
        label: String,
        reason: String,
    },
}

impl GeoError {
    pub(crate) fn calibration(reason: impl Into<String>) -> Self {
        Self::InvalidCalibration {
            reason: reason.into(),
        }
    }
}
