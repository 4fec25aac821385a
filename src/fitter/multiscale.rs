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

use log::{debug, info, warn};

use crate::algorithm::{AlgorithmResult, GaussNewtonAlgorithm};
use crate::common::{align_shape_with_bounding_box, BoundingBox, Image, PointCloud, Transform2};
use crate::error::{Error, Result};
use crate::feat::HolisticFeature;
use crate::result::ApsResult;

/// Images and transforms for one fit, one entry per scale.
struct PreparedImage {
    images: Vec<Image>,
    initial_shape: PointCloud,
    gt_shapes: Vec<Option<PointCloud>>,
    affine_transforms: Vec<Transform2>,
    scale_transforms: Vec<Transform2>,
}

/// A coarse-to-fine fitter with one parametric algorithm per scale.
///
/// Implementors describe their configuration; the fitting loop itself is
/// provided.
pub trait MultiScaleFitter {
    fn scales(&self) -> &[f64];

    fn reference_shape(&self) -> &PointCloud;

    fn holistic_features(&self) -> &[HolisticFeature];

    fn algorithms(&self) -> &[Box<dyn GaussNewtonAlgorithm>];

    /// Iteration budget per scale.
    fn max_iters(&self) -> &[usize];

    fn eps(&self) -> f64;

    /// Packages the per-scale results of one fit.
    fn fitter_result(
        &self,
        image: &Image,
        algorithm_results: Vec<AlgorithmResult>,
        affine_transforms: Vec<Transform2>,
        scale_transforms: Vec<Transform2>,
        gt_shape: Option<&PointCloud>,
    ) -> Result<ApsResult>;

    fn n_scales(&self) -> usize {
        self.scales().len()
    }

    /// Fits `image` starting from `initial_shape`, given in image coordinates.
    fn fit_from_shape(
        &self,
        image: &Image,
        initial_shape: &PointCloud,
        gt_shape: Option<&PointCloud>,
    ) -> Result<ApsResult> {
        let n_scales = self.n_scales();
        if n_scales == 0 {
            return Err(Error::InvalidModel("fitter has no scales".to_string()));
        }
        for (name, actual) in [
            ("algorithms", self.algorithms().len()),
            ("max_iters", self.max_iters().len()),
            ("holistic_features", self.holistic_features().len()),
        ] {
            if actual != n_scales {
                return Err(Error::ScaleCount {
                    name,
                    expected: n_scales,
                    actual,
                });
            }
        }

        let prepared = prepare_image(self, image, initial_shape, gt_shape)?;
        let scales = self.scales();
        let max_iters = self.max_iters();

        let mut results: Vec<AlgorithmResult> = Vec::with_capacity(self.n_scales());
        let mut shape = prepared.initial_shape;
        for (j, algorithm) in self.algorithms().iter().enumerate() {
            if let Some(previous) = results.last() {
                shape = Transform2::scale(scales[j] / scales[j - 1]).apply(previous.final_shape());
            }

            let result = algorithm
                .run(
                    &prepared.images[j],
                    &shape,
                    prepared.gt_shapes[j].as_ref(),
                    max_iters[j],
                    self.eps(),
                )
                .map_err(|e| {
                    warn!("{} algorithm failed at scale {}: {}", algorithm.name(), j, e);
                    e
                })?;

            debug!(
                "scale {} ({}): {} iterations, final cost {:.6}",
                j,
                scales[j],
                result.n_iters(),
                result.costs().last().copied().unwrap_or(f64::NAN)
            );
            results.push(result);
        }

        let fit = self.fitter_result(
            image,
            results,
            prepared.affine_transforms,
            prepared.scale_transforms,
            gt_shape,
        )?;
        info!(
            "fitted {} landmarks over {} scales in {} iterations",
            self.reference_shape().n_points(),
            self.n_scales(),
            fit.n_iters()
        );
        Ok(fit)
    }

    /// Fits `image` starting from the reference shape placed in `bbox`.
    fn fit_from_bb(
        &self,
        image: &Image,
        bbox: &BoundingBox,
        gt_shape: Option<&PointCloud>,
    ) -> Result<ApsResult> {
        let initial_shape = align_shape_with_bounding_box(self.reference_shape(), bbox);
        self.fit_from_shape(image, &initial_shape, gt_shape)
    }
}

/// Largest image, in pixels, that fitting will rescale to (2^26).
const MAX_IMAGE_PIXELS: f64 = 67_108_864.0;

/// Rescales `image` so that `initial_shape` has the size of the reference
/// shape, then builds the feature image of every scale.
///
/// Fails with [`Error::InvalidInitialShape`] when the initial shape is so
/// small that the rescaled image would exceed `MAX_IMAGE_PIXELS`.
fn prepare_image<F: MultiScaleFitter + ?Sized>(
    fitter: &F,
    image: &Image,
    initial_shape: &PointCloud,
    gt_shape: Option<&PointCloud>,
) -> Result<PreparedImage> {
    let initial_norm = initial_shape.centred_norm();
    let reference_scale = if initial_norm > 0.0 {
        fitter.reference_shape().centred_norm() / initial_norm
    } else {
        1.0
    };

    let largest = fitter.scales().iter().fold(1.0f64, |m, &s| m.max(s)) * reference_scale;
    let pixels = f64::from(image.width()) * largest * f64::from(image.height()) * largest;
    let fits = reference_scale > 0.0 && pixels.is_finite() && pixels <= MAX_IMAGE_PIXELS;
    if !fits {
        return Err(Error::InvalidInitialShape(format!(
            "size {:e} against reference size {:e} would rescale the image by {:e}",
            initial_norm,
            fitter.reference_shape().centred_norm(),
            reference_scale
        )));
    }

    let rescaled = image.rescale(reference_scale);
    let affine = Transform2::scale(1.0 / reference_scale);

    let scales = fitter.scales();
    let features = fitter.holistic_features();
    let mut images = Vec::with_capacity(scales.len());
    let mut gt_shapes = Vec::with_capacity(scales.len());
    let mut affine_transforms = Vec::with_capacity(scales.len());
    let mut scale_transforms = Vec::with_capacity(scales.len());

    let mut feature_image: Option<Image> = None;
    for (j, &scale) in scales.iter().enumerate() {
        if j == 0 || features[j] != features[j - 1] {
            feature_image = Some(features[j].compute(&rescaled));
        }
        if let Some(feature_image) = &feature_image {
            images.push(feature_image.rescale(scale));
        }

        let to_scale = Transform2::scale(reference_scale * scale);
        gt_shapes.push(gt_shape.map(|gt| to_scale.apply(gt)));
        affine_transforms.push(affine.clone());
        scale_transforms.push(Transform2::scale(1.0 / scale));
    }

    Ok(PreparedImage {
        images,
        initial_shape: Transform2::scale(reference_scale * scales[0]).apply(initial_shape),
        gt_shapes,
        affine_transforms,
        scale_transforms,
    })
}
