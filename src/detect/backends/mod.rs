pub mod file;
pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use file::FileBackend;
pub use stub::StubBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
