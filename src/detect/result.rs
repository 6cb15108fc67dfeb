use serde::{Deserialize, Serialize};

/// Axis-aligned box in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Build from a center point and size, as emitted by YOLO heads.
    pub fn from_center(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.xmin / 2.0 + self.xmax / 2.0,
            self.ymin / 2.0 + self.ymax / 2.0,
        )
    }

    pub fn area(&self) -> f64 {
        (self.xmax - self.xmin).max(0.0) * (self.ymax - self.ymin).max(0.0)
    }

    /// Intersection over union, 0.0 for disjoint or empty boxes.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let iy = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Returns why the box cannot be projected, if it can't.
    pub fn defect(&self) -> Option<&'static str> {
        let coords = [self.xmin, self.ymin, self.xmax, self.ymax];
        if coords.iter().any(|c| !c.is_finite()) {
            Some("box coordinates must be finite")
        } else if self.xmin > self.xmax {
            Some("xmin is greater than xmax")
        } else if self.ymin > self.ymax {
            Some("ymin is greater than ymax")
        } else {
            None
        }
    }
}

/// One detected object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    #[serde(flatten)]
    pub bbox: BoundingBox,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
        }
    }
}

fn full_confidence() -> f32 {
    1.0
}

/// Result of running detection on one image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    /// Detections in pixel coordinates of the input image.
    pub detections: Vec<Detection>,
}
