use image::{imageops::FilterType, RgbImage};

use crate::error::{Error, Result};

/// `(pixel - mean) / std`, applied to every channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mean: f32,
    pub std: f32,
}

/// Face detector input: u8 `[0, 255]` to f32 `[-1, 1]`.
pub const DETECTOR_INPUT: Normalization = Normalization {
    mean: 128.0,
    std: 128.0,
};

/// Landmark estimator input: u8 `[0, 255]` to f32 `[0, 1]`.
pub const LANDMARK_INPUT: Normalization = Normalization {
    mean: 0.0,
    std: 255.0,
};

impl Normalization {
    pub fn apply(&self, value: u8) -> f32 {
        (value as f32 - self.mean) / self.std
    }
}

/// Interleaved RGB float input for a model, batch of one (NHWC).
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl InputTensor {
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; rgb_len(width, height)],
        }
    }

    pub fn from_image(image: &RgbImage, norm: Normalization) -> Result<Self> {
        let (width, height) = image.dimensions();
        let mut tensor = Self::zeros(width, height);
        tensor.fill_from(image, norm)?;
        Ok(tensor)
    }

    /// Refills this tensor in place; `image` must have the tensor's dimensions.
    pub fn fill_from(&mut self, image: &RgbImage, norm: Normalization) -> Result<()> {
        normalize_into(image, norm, &mut self.data)
    }

    /// Resizes `image` to the model input size before normalizing.
    pub fn from_image_resized(image: &RgbImage, width: u32, height: u32, norm: Normalization) -> Result<Self> {
        if image.dimensions() == (width, height) {
            return Self::from_image(image, norm);
        }
        let resized = image::imageops::resize(image, width, height, FilterType::Triangle);
        Self::from_image(&resized, norm)
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, 3]
    }
}

fn rgb_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Writes the normalized pixels of `image` into a caller-owned buffer, which
/// must hold exactly `width * height * 3` values.
pub fn normalize_into(image: &RgbImage, norm: Normalization, out: &mut [f32]) -> Result<()> {
    let (width, height) = image.dimensions();
    let expected = rgb_len(width, height);
    if out.len() != expected {
        return Err(Error::BufferSize {
            expected,
            actual: out.len(),
            width,
            height,
        });
    }

    for (dst, src) in out.iter_mut().zip(image.as_raw()) {
        *dst = norm.apply(*src);
    }
    Ok(())
}
