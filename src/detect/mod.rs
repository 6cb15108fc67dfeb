mod backend;
pub mod backends;
mod registry;
mod result;
pub mod yolo;

pub use backend::DetectorBackend;
pub use backends::{FileBackend, StubBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection, DetectionResult};
pub use yolo::YoloParams;
