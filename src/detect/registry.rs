use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::detect::result::DetectionResult;

use super::backend::DetectorBackend;

/// Registry of detector backends, keyed by backend name.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn DetectorBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Box::new(backend));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Get backend by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn DetectorBackend + 'static)> {
        self.backends.get_mut(name).map(|backend| backend.as_mut())
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run detection with the named backend, or the default when `name` is `None`.
    pub fn detect_with(
        &mut self,
        name: Option<&str>,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<DetectionResult> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self
                .default_name
                .clone()
                .ok_or_else(|| anyhow!("no detector backend registered"))?,
        };
        let backend = self
            .get_mut(&name)
            .ok_or_else(|| anyhow!("backend '{}' not registered", name))?;
        backend.warm_up()?;
        let result = backend.detect(pixels, width, height)?;
        log::debug!(
            "backend '{}' returned {} detections",
            name,
            result.detections.len()
        );
        Ok(result)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
