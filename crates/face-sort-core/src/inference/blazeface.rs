//! `BlazeFace` short-range face detector.
//!
//! Layer layout matches the hollance/BlazeFace-PyTorch weights with batch
//! norm folded into the convolution biases.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::collections::VecDeque;

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};

use super::sigmoid;

/// Side length of the square network input.
pub const INPUT_SIZE: usize = 128;

/// Raw detections scoring below this are discarded before suppression.
const MIN_RAW_SCORE: f32 = 0.5;

/// Overlap above which the weaker of two detections is suppressed.
const NMS_IOU: f32 = 0.3;

/// Values regressed per anchor: 4 box coordinates plus 6 keypoints.
const REGRESSION_LEN: usize = 16;

/// `(in, out, stride)` for each block; all kernels are 3x3.
const BACKBONE_16: [(usize, usize, usize); 11] = [
    (24, 24, 1),
    (24, 28, 1),
    (28, 32, 2),
    (32, 36, 1),
    (36, 42, 1),
    (42, 48, 2),
    (48, 56, 1),
    (56, 64, 1),
    (64, 72, 1),
    (72, 80, 1),
    (80, 88, 1),
];

const BACKBONE_8: [(usize, usize, usize); 5] = [
    (88, 96, 2),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
];

/// A face found by the detector, in normalized `[0, 1]` coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFace {
    /// `[x_min, y_min, x_max, y_max]`.
    pub bbox: [f32; 4],
    /// Detection score after sigmoid.
    pub score: f32,
}

impl DetectedFace {
    /// Box area in normalized units.
    #[must_use]
    pub fn area(&self) -> f32 {
        (self.bbox[2] - self.bbox[0]).max(0.0) * (self.bbox[3] - self.bbox[1]).max(0.0)
    }
}

/// Depthwise-separable residual block.
struct Block {
    depthwise: Conv2d,
    pointwise: Conv2d,
    stride: usize,
    extra_channels: usize,
}

impl Block {
    fn load(vb: &VarBuilder, (in_c, out_c, stride): (usize, usize, usize)) -> Result<Self> {
        let padding = if stride == 2 { 0 } else { 1 };
        let depthwise = conv2d(
            in_c,
            in_c,
            3,
            Conv2dConfig {
                stride,
                padding,
                groups: in_c,
                ..Conv2dConfig::default()
            },
            vb.pp("depthwise"),
        )?;
        let pointwise = conv2d(in_c, out_c, 1, Conv2dConfig::default(), vb.pp("pointwise"))?;

        Ok(Self {
            depthwise,
            pointwise,
            stride,
            extra_channels: out_c.saturating_sub(in_c),
        })
    }
}

impl Module for Block {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (branch_in, shortcut) = if self.stride == 2 {
            (
                x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?,
                x.max_pool2d(2)?,
            )
        } else {
            (x.clone(), x.clone())
        };

        let branch = self
            .pointwise
            .forward(&self.depthwise.forward(&branch_in)?.relu()?)?;
        let shortcut = if self.extra_channels > 0 {
            shortcut.pad_with_zeros(1, 0, self.extra_channels)?
        } else {
            shortcut
        };

        (branch + shortcut)?.relu()
    }
}

/// Classifier and regressor pair over one feature map.
struct Head {
    classifier: Conv2d,
    regressor: Conv2d,
    anchors: usize,
}

impl Head {
    fn load(vb: &VarBuilder, grid: usize, channels: usize, per_cell: usize) -> Result<Self> {
        Ok(Self {
            classifier: conv2d(
                channels,
                per_cell,
                1,
                Conv2dConfig::default(),
                vb.pp(format!("classifier_{grid}")),
            )?,
            regressor: conv2d(
                channels,
                per_cell * REGRESSION_LEN,
                1,
                Conv2dConfig::default(),
                vb.pp(format!("regressor_{grid}")),
            )?,
            anchors: grid * grid * per_cell,
        })
    }

    /// Returns `(scores, boxes)` shaped `(anchors, 1)` and `(anchors, 16)`.
    fn forward(&self, features: &Tensor) -> candle_core::Result<(Tensor, Tensor)> {
        let scores = self
            .classifier
            .forward(features)?
            .permute((0, 2, 3, 1))?
            .reshape((self.anchors, 1))?;
        let boxes = self
            .regressor
            .forward(features)?
            .permute((0, 2, 3, 1))?
            .reshape((self.anchors, REGRESSION_LEN))?;
        Ok((scores, boxes))
    }
}

/// `BlazeFace` detector.
pub struct BlazeFace {
    stem: Conv2d,
    backbone_16: Vec<Block>,
    backbone_8: Vec<Block>,
    head_16: Head,
    head_8: Head,
    anchors: Vec<[f32; 2]>,
    device: Device,
}

impl BlazeFace {
    /// Builds the detector from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a tensor is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let stem = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )
        .context("Failed to load BlazeFace stem")?;

        let backbone_16 = BACKBONE_16
            .iter()
            .enumerate()
            .map(|(i, spec)| Block::load(&vb.pp(format!("backbone1.{i}")), *spec))
            .collect::<Result<Vec<_>>>()
            .context("Failed to load BlazeFace backbone")?;
        let backbone_8 = BACKBONE_8
            .iter()
            .enumerate()
            .map(|(i, spec)| Block::load(&vb.pp(format!("backbone2.{i}")), *spec))
            .collect::<Result<Vec<_>>>()
            .context("Failed to load BlazeFace backbone")?;

        let head_16 = Head::load(&vb, 16, 88, 2).context("Failed to load BlazeFace head")?;
        let head_8 = Head::load(&vb, 8, 96, 6).context("Failed to load BlazeFace head")?;

        let mut anchors = anchor_centers(16, 2);
        anchors.extend(anchor_centers(8, 6));

        Ok(Self {
            stem,
            backbone_16,
            backbone_8,
            head_16,
            head_8,
            anchors,
            device: vb.device().clone(),
        })
    }

    /// Detects faces in `image`, strongest first.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn detect(&self, image: &image::DynamicImage) -> Result<Vec<DetectedFace>> {
        let input = self.preprocess(image)?;
        let (scores, boxes) = self.forward(&input).context("BlazeFace forward pass failed")?;

        let scores = scores.flatten_all()?.to_vec1::<f32>()?;
        let boxes = boxes.to_vec2::<f32>()?;

        let candidates = scores
            .iter()
            .zip(&boxes)
            .zip(&self.anchors)
            .filter_map(|((&logit, regression), anchor)| {
                let score = sigmoid(logit);
                (score >= MIN_RAW_SCORE).then(|| decode_box(anchor, regression, score))
            })
            .collect();

        Ok(suppress(candidates))
    }

    /// Resizes to 128x128 and scales to `[-1, 1]`, returning NCHW.
    fn preprocess(&self, image: &image::DynamicImage) -> Result<Tensor> {
        let rgb = image
            .resize_exact(
                INPUT_SIZE as u32,
                INPUT_SIZE as u32,
                image::imageops::FilterType::Triangle,
            )
            .to_rgb8();
        let data: Vec<f32> = rgb
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 127.5 - 1.0)
            .collect();

        Tensor::from_vec(data, (1, INPUT_SIZE, INPUT_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))
            .context("Failed to build BlazeFace input")
    }

    fn forward(&self, x: &Tensor) -> candle_core::Result<(Tensor, Tensor)> {
        let mut h = self
            .stem
            .forward(&x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?)?
            .relu()?;
        for block in &self.backbone_16 {
            h = block.forward(&h)?;
        }
        let (scores_16, boxes_16) = self.head_16.forward(&h)?;

        for block in &self.backbone_8 {
            h = block.forward(&h)?;
        }
        let (scores_8, boxes_8) = self.head_8.forward(&h)?;

        Ok((
            Tensor::cat(&[scores_16, scores_8], 0)?,
            Tensor::cat(&[boxes_16, boxes_8], 0)?,
        ))
    }
}

/// Anchor centers for a `grid x grid` map with `per_cell` anchors per cell.
fn anchor_centers(grid: u8, per_cell: usize) -> Vec<[f32; 2]> {
    let step = f32::from(grid);
    (0..grid)
        .flat_map(|y| (0..grid).map(move |x| (x, y)))
        .flat_map(|(x, y)| {
            let center = [(f32::from(x) + 0.5) / step, (f32::from(y) + 0.5) / step];
            std::iter::repeat(center).take(per_cell)
        })
        .collect()
}

/// Converts a regression row relative to `anchor` into a clamped box.
fn decode_box(anchor: &[f32; 2], regression: &[f32], score: f32) -> DetectedFace {
    let scale = INPUT_SIZE as f32;
    let cx = anchor[0] + regression[0] / scale;
    let cy = anchor[1] + regression[1] / scale;
    let half_w = regression[2] / scale / 2.0;
    let half_h = regression[3] / scale / 2.0;

    DetectedFace {
        bbox: [
            (cx - half_w).clamp(0.0, 1.0),
            (cy - half_h).clamp(0.0, 1.0),
            (cx + half_w).clamp(0.0, 1.0),
            (cy + half_h).clamp(0.0, 1.0),
        ],
        score,
    }
}

/// Greedy non-maximum suppression, strongest first.
fn suppress(mut candidates: Vec<DetectedFace>) -> Vec<DetectedFace> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut queue = VecDeque::from(candidates);
    let mut kept = Vec::new();

    while let Some(best) = queue.pop_front() {
        queue.retain(|other| iou(&best.bbox, &other.bbox) < NMS_IOU);
        kept.push(best);
    }
    kept
}

/// Intersection over union of two corner-format boxes.
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let overlap_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let overlap_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = overlap_w * overlap_h;
    let union = (a[2] - a[0]) * (a[3] - a[1]) + (b[2] - b[0]) * (b[3] - b[1]) - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(bbox: [f32; 4], score: f32) -> DetectedFace {
        DetectedFace { bbox, score }
    }

    #[test]
    fn test_anchor_count() {
        let total = anchor_centers(16, 2).len() + anchor_centers(8, 6).len();
        assert_eq!(total, 896);
    }

    #[test]
    fn test_anchor_centers_are_cell_midpoints() {
        let anchors = anchor_centers(8, 6);
        assert_eq!(anchors[0], [0.0625, 0.0625]);
        assert_eq!(anchors[5], [0.0625, 0.0625]);
        assert_eq!(anchors[6], [0.1875, 0.0625]);
    }

    #[test]
    fn test_iou() {
        assert!(iou(&[0.0, 0.0, 0.5, 0.5], &[0.6, 0.6, 1.0, 1.0]).abs() < 1e-6);
        assert!((iou(&[0.0, 0.0, 1.0, 1.0], &[0.0, 0.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);
        let expected = 0.0625 / 0.4375;
        assert!((iou(&[0.0, 0.0, 0.5, 0.5], &[0.25, 0.25, 0.75, 0.75]) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_suppress_keeps_strongest_of_overlapping() {
        let kept = suppress(vec![
            face([0.1, 0.1, 0.5, 0.5], 0.7),
            face([0.12, 0.1, 0.52, 0.5], 0.9),
            face([0.6, 0.6, 0.9, 0.9], 0.8),
        ]);
        let scores: Vec<f32> = kept.iter().map(|f| f.score).collect();
        assert_eq!(scores, [0.9, 0.8]);
    }

    #[test]
    fn test_decode_box_is_clamped() {
        let mut regression = [0.0f32; REGRESSION_LEN];
        regression[2] = 512.0;
        regression[3] = 512.0;
        let face = decode_box(&[0.5, 0.5], &regression, 0.9);
        assert_eq!(face.bbox, [0.0, 0.0, 1.0, 1.0]);
        assert!((face.area() - 1.0).abs() < 1e-6);
    }
}
