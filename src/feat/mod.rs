// This file is part of the open-source port of SeetaFace engine, which originally includes three modules:
//      SeetaFace Detection, SeetaFace Alignment, and SeetaFace Identification.
//
// This file is part of the SeetaFace Detection module, containing codes implementing the face detection method described in the following paper:
//
//      Funnel-structured cascade for multi-view face detection with alignment awareness,
//      Shuzhe Wu, Meina Kan, Zhenliang He, Shiguang Shan, Xilin Chen.
//      In Neurocomputing (under review)
//
// Copyright (C) 2016, Visual Information Processing and Learning (VIPL) group,
// Institute of Computing Technology, Chinese Academy of Sciences, Beijing, China.
//
// As an open-source face recognition engine: you can redistribute SeetaFace source codes
// and/or modify it under the terms of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use nalgebra::{DVector, Point2};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::Deserialize;

use crate::common::{derivative, Image, PointCloud};
use crate::error::{Error, Result};

/// Feature computed on the whole image at each scale before fitting.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum HolisticFeature {
    NoOp,
    GradientMagnitude,
}

impl HolisticFeature {
    #[inline]
    pub fn from(id: i32) -> Option<Self> {
        match id {
            0 => Some(HolisticFeature::NoOp),
            1 => Some(HolisticFeature::GradientMagnitude),
            _ => None,
        }
    }

    #[inline]
    pub fn id(&self) -> i32 {
        match self {
            HolisticFeature::NoOp => 0,
            HolisticFeature::GradientMagnitude => 1,
        }
    }

    pub fn compute(&self, image: &Image) -> Image {
        match self {
            HolisticFeature::NoOp => image.clone(),
            HolisticFeature::GradientMagnitude => image.gradient_magnitude(),
        }
    }
}

/// Normalisation applied to every extracted patch independently.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum PatchNormalisation {
    NoOp,
    ZeroMeanUnitNorm,
}

impl PatchNormalisation {
    #[inline]
    pub fn from(id: i32) -> Option<Self> {
        match id {
            0 => Some(PatchNormalisation::NoOp),
            1 => Some(PatchNormalisation::ZeroMeanUnitNorm),
            _ => None,
        }
    }

    #[inline]
    pub fn id(&self) -> i32 {
        match self {
            PatchNormalisation::NoOp => 0,
            PatchNormalisation::ZeroMeanUnitNorm => 1,
        }
    }

    pub fn apply(&self, patch: &mut [f64]) {
        match self {
            PatchNormalisation::NoOp => {}
            PatchNormalisation::ZeroMeanUnitNorm => {
                if patch.is_empty() {
                    return;
                }
                let mean = patch.iter().sum::<f64>() / patch.len() as f64;
                patch.iter_mut().for_each(|v| *v -= mean);
                let norm = patch.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    patch.iter_mut().for_each(|v| *v /= norm);
                }
            }
        }
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct PatchShape {
    pub height: u32,
    pub width: u32,
}

impl PatchShape {
    pub const fn new(height: u32, width: u32) -> Self {
        PatchShape { height, width }
    }

    #[inline]
    pub fn n_pixels(&self) -> usize {
        self.height as usize * self.width as usize
    }

    /// Pixel count, `None` when it does not fit in `usize`.
    pub fn checked_n_pixels(&self) -> Option<usize> {
        (self.height as usize).checked_mul(self.width as usize)
    }

    /// Offset of patch pixel `(row, col)` from the landmark it is centred on.
    #[inline]
    fn offset(&self, row: u32, col: u32) -> (f64, f64) {
        (
            f64::from(col) - f64::from(self.width - 1) / 2.0,
            f64::from(row) - f64::from(self.height - 1) / 2.0,
        )
    }
}

/// Which pixels of every patch take part in the appearance cost.
///
/// Deserialises from `null` (every pixel) or a single-key object:
/// `{"step": k}`, `{"mask": [true, false, ...]}` (row-major) or
/// `{"indices": [0, 4, ...]}` (row-major pixel indices). A bare JSON list is
/// never a `Sampling`, so it always means one entry per scale.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "SamplingRepr")]
pub enum Sampling {
    Full,
    Step(usize),
    Mask(Vec<bool>),
    Indices(Vec<usize>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SamplingRepr {
    Full,
    Selected(SelectedPixels),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum SelectedPixels {
    Step(usize),
    Mask(Vec<bool>),
    Indices(Vec<usize>),
}

impl From<SamplingRepr> for Sampling {
    fn from(repr: SamplingRepr) -> Self {
        match repr {
            SamplingRepr::Full => Sampling::Full,
            SamplingRepr::Selected(SelectedPixels::Step(step)) => Sampling::Step(step),
            SamplingRepr::Selected(SelectedPixels::Mask(mask)) => Sampling::Mask(mask),
            SamplingRepr::Selected(SelectedPixels::Indices(indices)) => Sampling::Indices(indices),
        }
    }
}

impl Default for Sampling {
    fn default() -> Self {
        Sampling::Full
    }
}

impl Sampling {
    /// Row-major mask over the pixels of one patch.
    pub fn mask(&self, patch_shape: PatchShape) -> Result<Vec<bool>> {
        let n_pixels = patch_shape.n_pixels();
        match self {
            Sampling::Full => Ok(vec![true; n_pixels]),
            Sampling::Step(0) => Err(Error::InvalidSampling(
                "sub-sampling step must be positive".to_string(),
            )),
            Sampling::Step(step) => {
                let mut mask = Vec::with_capacity(n_pixels);
                for row in 0..patch_shape.height as usize {
                    for col in 0..patch_shape.width as usize {
                        mask.push(row % step == 0 && col % step == 0);
                    }
                }
                Ok(mask)
            }
            Sampling::Mask(mask) if mask.len() != n_pixels => Err(Error::InvalidSampling(format!(
                "mask has {} entries, patches have {} pixels",
                mask.len(),
                n_pixels
            ))),
            Sampling::Mask(mask) if !mask.iter().any(|m| *m) => Err(Error::InvalidSampling(
                "mask selects no pixels".to_string(),
            )),
            Sampling::Mask(mask) => Ok(mask.clone()),
            Sampling::Indices(indices) if indices.is_empty() => Err(Error::InvalidSampling(
                "index list selects no pixels".to_string(),
            )),
            Sampling::Indices(indices) => {
                let mut mask = vec![false; n_pixels];
                for &i in indices {
                    if i >= n_pixels {
                        return Err(Error::InvalidSampling(format!(
                            "pixel index {} out of range for patches of {} pixels",
                            i, n_pixels
                        )));
                    }
                    mask[i] = true;
                }
                Ok(mask)
            }
        }
    }
}

fn extract_patch(
    image: &Image,
    centre: &Point2<f64>,
    patch_shape: PatchShape,
    normalisation: PatchNormalisation,
) -> Vec<f64> {
    let mut patch = Vec::with_capacity(patch_shape.n_pixels());
    for row in 0..patch_shape.height {
        for col in 0..patch_shape.width {
            let (dx, dy) = patch_shape.offset(row, col);
            patch.push(image.sample(centre.x + dx, centre.y + dy));
        }
    }
    normalisation.apply(&mut patch);
    patch
}

/// Extracts one patch per landmark of `shape`.
///
/// The result is laid out landmark-major, each patch row-major, so its length
/// is `n_points * patch_shape.n_pixels()`.
pub fn extract_patches(
    image: &Image,
    shape: &PointCloud,
    patch_shape: PatchShape,
    normalisation: PatchNormalisation,
) -> DVector<f64> {
    #[cfg(feature = "rayon")]
    let patches: Vec<Vec<f64>> = shape
        .points()
        .par_iter()
        .map(|p| extract_patch(image, p, patch_shape, normalisation))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let patches: Vec<Vec<f64>> = shape
        .points()
        .iter()
        .map(|p| extract_patch(image, p, patch_shape, normalisation))
        .collect();

    DVector::from_iterator(
        shape.n_points() * patch_shape.n_pixels(),
        patches.into_iter().flatten(),
    )
}

/// Spatial derivatives inside each patch of a vector laid out as by
/// [`extract_patches`]. Returns `(d/dx, d/dy)` with the same layout.
pub fn patch_gradients(
    patches: &DVector<f64>,
    n_points: usize,
    patch_shape: PatchShape,
) -> (DVector<f64>, DVector<f64>) {
    let n_pixels = patch_shape.n_pixels();
    debug_assert_eq!(patches.len(), n_points * n_pixels);

    let w = patch_shape.width;
    let h = patch_shape.height;
    let mut gx = DVector::zeros(patches.len());
    let mut gy = DVector::zeros(patches.len());
    for point in 0..n_points {
        let base = point * n_pixels;
        let at = |row: u32, col: u32| patches[base + (row * w + col) as usize];
        for row in 0..h {
            for col in 0..w {
                let i = base + (row * w + col) as usize;
                gx[i] = derivative(col, w, |c| at(row, c));
                gy[i] = derivative(row, h, |r| at(r, col));
            }
        }
    }
    (gx, gy)
}
