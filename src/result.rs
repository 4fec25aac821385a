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

use crate::algorithm::AlgorithmResult;
use crate::common::{BoundingBox, Image, PointCloud, Transform2};
use crate::error::{Error, Result};

/// Outcome of a multi-scale APS fit.
///
/// Per-scale results are kept in the frame of the image they were fitted on;
/// the accessors map shapes back to the frame of the original image through
/// `affine_transforms[j] . scale_transforms[j]`.
#[derive(Clone, Debug)]
pub struct ApsResult {
    results: Vec<AlgorithmResult>,
    scales: Vec<f64>,
    affine_transforms: Vec<Transform2>,
    scale_transforms: Vec<Transform2>,
    image: Image,
    gt_shape: Option<PointCloud>,
}

impl ApsResult {
    /// Fails with [`Error::ResultMismatch`] unless every list has one entry
    /// per scale.
    pub fn new(
        results: Vec<AlgorithmResult>,
        scales: Vec<f64>,
        affine_transforms: Vec<Transform2>,
        scale_transforms: Vec<Transform2>,
        image: Image,
        gt_shape: Option<PointCloud>,
    ) -> Result<Self> {
        let n = scales.len();
        if n == 0
            || results.len() != n
            || affine_transforms.len() != n
            || scale_transforms.len() != n
        {
            return Err(Error::ResultMismatch {
                scales: n,
                results: results.len(),
                affine_transforms: affine_transforms.len(),
                scale_transforms: scale_transforms.len(),
            });
        }
        Ok(ApsResult {
            results,
            scales,
            affine_transforms,
            scale_transforms,
            image,
            gt_shape,
        })
    }

    fn to_image_frame(&self, scale: usize, shape: &PointCloud) -> PointCloud {
        self.scale_transforms[scale]
            .then(&self.affine_transforms[scale])
            .apply(shape)
    }

    pub fn algorithm_results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn n_scales(&self) -> usize {
        self.scales.len()
    }

    pub fn affine_transforms(&self) -> &[Transform2] {
        &self.affine_transforms
    }

    pub fn scale_transforms(&self) -> &[Transform2] {
        &self.scale_transforms
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn gt_shape(&self) -> Option<&PointCloud> {
        self.gt_shape.as_ref()
    }

    pub fn final_shape(&self) -> PointCloud {
        let last = self.results.len() - 1;
        self.to_image_frame(last, self.results[last].final_shape())
    }

    /// The shape the fit started from, in the original image frame.
    pub fn initial_shape(&self) -> PointCloud {
        self.to_image_frame(0, self.results[0].initial_shape())
    }

    /// Every shape visited, all scales in order, in the original image frame.
    pub fn shapes(&self) -> Vec<PointCloud> {
        let mut shapes = vec![self.initial_shape()];
        for (j, result) in self.results.iter().enumerate() {
            shapes.extend(result.shapes().iter().map(|s| self.to_image_frame(j, s)));
        }
        shapes
    }

    /// Total iterations over all scales.
    pub fn n_iters(&self) -> usize {
        self.results.iter().map(|r| r.n_iters()).sum()
    }

    pub fn costs(&self) -> Vec<f64> {
        self.results
            .iter()
            .flat_map(|r| r.costs().iter().copied())
            .collect()
    }

    pub fn final_error(&self) -> Option<f64> {
        self.gt_shape
            .as_ref()
            .map(|gt| bb_normalised_error(&self.final_shape(), gt))
    }

    pub fn initial_error(&self) -> Option<f64> {
        self.gt_shape
            .as_ref()
            .map(|gt| bb_normalised_error(&self.initial_shape(), gt))
    }
}

/// Mean point-to-point distance divided by the diagonal of the ground-truth
/// bounding box.
pub fn bb_normalised_error(shape: &PointCloud, gt_shape: &PointCloud) -> f64 {
    debug_assert_eq!(shape.n_points(), gt_shape.n_points());
    if shape.n_points() == 0 {
        return 0.0;
    }
    let mean = shape
        .points()
        .iter()
        .zip(gt_shape.points())
        .map(|(p, q)| (p - q).norm())
        .sum::<f64>()
        / shape.n_points() as f64;
    let diagonal = BoundingBox::of(gt_shape).diagonal();
    if diagonal > 0.0 {
        mean / diagonal
    } else {
        mean
    }
}
