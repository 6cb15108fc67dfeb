#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::DetectionResult;
use crate::detect::yolo::{decode_predictions, YoloParams};

/// Tract-based backend for YOLOv8 ONNX models.
///
/// Loads a local model file once and runs it on each image, stretching the
/// image to the model's square input and mapping boxes back to source pixels.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    params: YoloParams,
    class_names: Vec<String>,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        params: YoloParams,
        class_names: Vec<String>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = params.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        log::info!(
            "loaded ONNX model {} ({}x{} input, {} class names)",
            model_path.display(),
            side,
            side,
            class_names.len()
        );

        Ok(Self {
            model,
            params,
            class_names,
        })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("image dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let image = RgbImage::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", width, height))?;
        let side = self.params.input_size;
        let resized = imageops::resize(&image, side, side, FilterType::Triangle);

        let side = side as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });
        Ok(input.into_tensor())
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let shape = view.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
            return Err(anyhow!(
                "unexpected detection head shape {:?}; expected [1, 4 + classes, anchors]",
                shape
            ));
        }
        let (num_classes, num_anchors) = (shape[1] - 4, shape[2]);
        let flat: Vec<f32> = view.iter().copied().collect();

        let side = self.params.input_size as f64;
        let scale = (width as f64 / side, height as f64 / side);
        let detections = decode_predictions(
            &flat,
            num_classes,
            num_anchors,
            scale,
            &self.params,
            &self.class_names,
        );
        Ok(DetectionResult { detections })
    }
}
