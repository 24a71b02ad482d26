//! Tensor Preprocessor - RGBA pixels to normalized float tensor.
//!
//! Mirrors the classifier's training transform: drop alpha, scale each
//! channel to [0, 1], normalize with the ImageNet mean/std. The channel
//! layout is fixed at construction to whatever the consuming backend
//! declares; mixing layouts across calls is a defect.

use crate::constants::{IMAGENET_MEAN, IMAGENET_STD, IMG_SIZE};
use crate::error::PipelineError;

/// Memory layout of the produced tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLayout {
    /// Channels-first (C, H, W) — what the bundled ONNX model consumes.
    #[default]
    Chw,
    /// Channels-last (H, W, C).
    Hwc,
}

/// Normalized model input with its layout.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub data: Vec<f32>,
    pub layout: ChannelLayout,
}

/// Converts decoded RGBA buffers into model input tensors.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    layout: ChannelLayout,
}

impl Preprocessor {
    /// Layout is decided once, from the loaded model's declared input shape.
    pub fn new(layout: ChannelLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Preprocess a 224x224 RGBA buffer.
    ///
    /// Fails with `InvalidInputShape` on any length mismatch; no partial
    /// processing. The per-pixel loop order is fixed so identical buffers
    /// yield bit-identical tensors.
    pub fn preprocess(&self, rgba: &[u8]) -> Result<InputTensor, PipelineError> {
        let pixel_count = IMG_SIZE * IMG_SIZE;
        let expected = pixel_count * 4;
        if rgba.len() != expected {
            return Err(PipelineError::InvalidInputShape {
                expected,
                actual: rgba.len(),
            });
        }

        let mut data = vec![0.0f32; pixel_count * 3];

        for i in 0..pixel_count {
            let rgba_offset = i * 4;
            for c in 0..3 {
                let value = rgba[rgba_offset + c] as f32 / 255.0;
                let normalized = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
                let index = match self.layout {
                    ChannelLayout::Chw => c * pixel_count + i,
                    ChannelLayout::Hwc => i * 3 + c,
                };
                data[index] = normalized;
            }
        }

        Ok(InputTensor {
            data,
            layout: self.layout,
        })
    }
}
