//! Binary gender classifier over a face crop.
//!
//! Small CNN: three conv/pool stages and two dense layers. The single logit
//! is the log-odds that the face is male.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};

use super::sigmoid;

/// Side length of the square face crop fed to the network.
pub const CROP_SIZE: usize = 64;

/// Fraction of the box size added on each side before cropping.
const CROP_MARGIN: f32 = 0.2;

/// Output channels of each conv stage.
const CHANNELS: [usize; 3] = [32, 64, 128];

const HIDDEN: usize = 256;

/// Flattened size after three 2x2 pools: 64 -> 32 -> 16 -> 8.
const FLAT: usize = 128 * (CROP_SIZE / 8) * (CROP_SIZE / 8);

/// Gender classifier network.
pub struct GenderNet {
    convs: Vec<Conv2d>,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl GenderNet {
    /// Builds the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a tensor is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let same = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };

        let mut convs = Vec::with_capacity(CHANNELS.len());
        let mut in_c = 3;
        for (i, out_c) in CHANNELS.into_iter().enumerate() {
            convs.push(
                conv2d(in_c, out_c, 3, same, vb.pp(format!("conv{}", i + 1)))
                    .with_context(|| format!("Failed to load conv{}", i + 1))?,
            );
            in_c = out_c;
        }

        Ok(Self {
            convs,
            fc1: linear(FLAT, HIDDEN, vb.pp("fc1")).context("Failed to load fc1")?,
            fc2: linear(HIDDEN, 1, vb.pp("fc2")).context("Failed to load fc2")?,
            device: vb.device().clone(),
        })
    }

    /// Crops the face at `bbox` (normalized corners) with a margin, resizes
    /// to 64x64 RGB and scales to `[0, 1]`, returning NCHW.
    ///
    /// # Errors
    ///
    /// Returns an error if tensor creation fails.
    pub fn preprocess(&self, image: &image::DynamicImage, bbox: &[f32; 4]) -> Result<Tensor> {
        let (x, y, w, h) = crop_rect(image.width(), image.height(), bbox);
        let rgb = image
            .crop_imm(x, y, w, h)
            .resize_exact(
                CROP_SIZE as u32,
                CROP_SIZE as u32,
                image::imageops::FilterType::Triangle,
            )
            .to_rgb8();

        let data: Vec<f32> = rgb.into_raw().into_iter().map(|v| f32::from(v) / 255.0).collect();
        Tensor::from_vec(data, (1, CROP_SIZE, CROP_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))
            .context("Failed to build face crop tensor")
    }

    /// Returns the probability that the face in `input` is male.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn male_probability(&self, input: &Tensor) -> Result<f32> {
        let logit = self
            .forward(input)
            .context("Gender forward pass failed")?
            .flatten_all()?
            .to_vec1::<f32>()?
            .first()
            .copied()
            .context("Gender network produced no output")?;
        Ok(sigmoid(logit))
    }
}

impl Module for GenderNet {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for conv in &self.convs {
            h = conv.forward(&h)?.relu()?.max_pool2d(2)?;
        }
        let h = self.fc1.forward(&h.flatten_from(1)?)?.relu()?;
        self.fc2.forward(&h)
    }
}

/// Pixel rectangle `(x, y, w, h)` for `bbox` grown by the crop margin and
/// clamped to the image. Never empty for a non-empty image.
fn crop_rect(width: u32, height: u32, bbox: &[f32; 4]) -> (u32, u32, u32, u32) {
    let margin_x = (bbox[2] - bbox[0]) * CROP_MARGIN;
    let margin_y = (bbox[3] - bbox[1]) * CROP_MARGIN;

    let x0 = ((bbox[0] - margin_x).max(0.0) * width as f32) as u32;
    let y0 = ((bbox[1] - margin_y).max(0.0) * height as f32) as u32;
    let x1 = ((bbox[2] + margin_x).min(1.0) * width as f32) as u32;
    let y1 = ((bbox[3] + margin_y).min(1.0) * height as f32) as u32;

    let x0 = x0.min(width.saturating_sub(1));
    let y0 = y0.min(height.saturating_sub(1));
    (
        x0,
        y0,
        x1.saturating_sub(x0).min(width.saturating_sub(x0)).max(1),
        y1.saturating_sub(y0).min(height.saturating_sub(y0)).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_size() {
        assert_eq!(FLAT, 8192);
    }

    #[test]
    fn test_crop_rect_adds_margin() {
        let (x, y, w, h) = crop_rect(100, 100, &[0.25, 0.25, 0.75, 0.75]);
        assert!(x < 25 && y < 25);
        assert!(x + w > 75 && y + h > 75);
    }

    #[test]
    fn test_crop_rect_clamps_to_image() {
        assert_eq!(crop_rect(200, 100, &[0.0, 0.0, 1.0, 1.0]), (0, 0, 200, 100));
    }

    #[test]
    fn test_crop_rect_degenerate_box() {
        let (x, y, w, h) = crop_rect(10, 10, &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!((x, y), (9, 9));
        assert_eq!((w, h), (1, 1));
    }
}
