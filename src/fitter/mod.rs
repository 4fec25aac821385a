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

mod multiscale;

use std::sync::Arc;

use log::debug;

pub use self::multiscale::MultiScaleFitter;

use crate::algorithm::{AlgorithmBuilder, AlgorithmResult, GaussNewtonAlgorithm, GaussNewtonInterface};
use crate::checks::{check_max_iters, check_n_shape, check_sampling};
use crate::common::{Image, PointCloud, Transform2};
use crate::config::{FitterConfig, DEFAULT_EPS, DEFAULT_MAX_ITERS};
use crate::error::Result;
use crate::feat::{HolisticFeature, Sampling};
use crate::model::GenerativeAps;
use crate::pdm::{OrthoPdm, Pdm, ShapeParametrization};
use crate::result::ApsResult;

/// Fitter for a trained APS, holding one algorithm per scale.
///
/// When a parametric shape model is used, the initial shape is first
/// reconstructed by the shape model at every scale. That reconstruction is
/// not an iteration and does not count towards `max_iters`.
pub struct ApsFitter {
    aps: Arc<GenerativeAps>,
    algorithms: Vec<Box<dyn GaussNewtonAlgorithm>>,
    max_iters: Vec<usize>,
    eps: f64,
}

impl ApsFitter {
    pub fn new(aps: Arc<GenerativeAps>, algorithms: Vec<Box<dyn GaussNewtonAlgorithm>>) -> Self {
        let n_scales = aps.n_scales();
        ApsFitter {
            aps,
            algorithms,
            max_iters: vec![DEFAULT_MAX_ITERS; n_scales],
            eps: DEFAULT_EPS,
        }
    }

    /// The trained model, shared with the caller.
    pub fn aps(&self) -> &Arc<GenerativeAps> {
        &self.aps
    }

    pub fn set_max_iters(&mut self, max_iters: Vec<usize>) {
        self.max_iters = max_iters;
    }

    pub fn set_eps(&mut self, eps: f64) {
        self.eps = eps;
    }
}

impl MultiScaleFitter for ApsFitter {
    fn scales(&self) -> &[f64] {
        self.aps.scales()
    }

    fn reference_shape(&self) -> &PointCloud {
        self.aps.reference_shape()
    }

    fn holistic_features(&self) -> &[HolisticFeature] {
        self.aps.holistic_features()
    }

    fn algorithms(&self) -> &[Box<dyn GaussNewtonAlgorithm>] {
        &self.algorithms
    }

    fn max_iters(&self) -> &[usize] {
        &self.max_iters
    }

    fn eps(&self) -> f64 {
        self.eps
    }

    fn fitter_result(
        &self,
        image: &Image,
        algorithm_results: Vec<AlgorithmResult>,
        affine_transforms: Vec<Transform2>,
        scale_transforms: Vec<Transform2>,
        gt_shape: Option<&PointCloud>,
    ) -> Result<ApsResult> {
        ApsResult::new(
            algorithm_results,
            self.scales().to_vec(),
            affine_transforms,
            scale_transforms,
            image.clone(),
            gt_shape.cloned(),
        )
    }
}

/// APS fitter optimised with Gauss-Newton at every scale.
pub struct GaussNewtonApsFitter {
    base: ApsFitter,
    n_active_shape: Vec<usize>,
    sampling: Vec<Sampling>,
    use_deformation_cost: bool,
}

impl GaussNewtonApsFitter {
    /// Builds the algorithm selected by `config.algorithm` at every scale.
    pub fn new(aps: Arc<GenerativeAps>, config: &FitterConfig) -> Result<Self> {
        let kind = config.algorithm;
        GaussNewtonApsFitter::with_algorithm(aps, config, &move |interface| kind.build(interface))
    }

    /// Like [`new`](Self::new), but every per-scale algorithm comes from
    /// `builder`; `config.algorithm` is ignored.
    pub fn with_algorithm(
        aps: Arc<GenerativeAps>,
        config: &FitterConfig,
        builder: &AlgorithmBuilder<'_>,
    ) -> Result<Self> {
        let n_scales = aps.n_scales();
        let n_active_shape = check_n_shape(&config.n_shape, &aps)?;
        let sampling = check_sampling(&config.sampling, n_scales)?;
        let max_iters = check_max_iters(&config.max_iters, n_scales)?;

        let algorithms = set_up(
            &aps,
            &n_active_shape,
            &sampling,
            config.use_deformation_cost,
            builder,
        )?;

        let mut base = ApsFitter::new(aps, algorithms);
        base.set_max_iters(max_iters);
        base.set_eps(config.eps);

        Ok(GaussNewtonApsFitter {
            base,
            n_active_shape,
            sampling,
            use_deformation_cost: config.use_deformation_cost,
        })
    }

    pub fn aps(&self) -> &Arc<GenerativeAps> {
        self.base.aps()
    }

    pub fn base(&self) -> &ApsFitter {
        &self.base
    }

    /// Active shape components per scale.
    pub fn n_active_shape(&self) -> &[usize] {
        &self.n_active_shape
    }

    pub fn sampling(&self) -> &[Sampling] {
        &self.sampling
    }

    pub fn use_deformation_cost(&self) -> bool {
        self.use_deformation_cost
    }
}

fn set_up(
    aps: &GenerativeAps,
    n_active_shape: &[usize],
    sampling: &[Sampling],
    use_deformation_cost: bool,
    builder: &AlgorithmBuilder<'_>,
) -> Result<Vec<Box<dyn GaussNewtonAlgorithm>>> {
    let mut algorithms = Vec::with_capacity(aps.n_scales());
    for (j, ((sm, &n_active), s)) in aps
        .scale_models()
        .iter()
        .zip(n_active_shape)
        .zip(sampling)
        .enumerate()
    {
        let template = sm.appearance().mean();

        let pdm: Box<dyn ShapeParametrization> = if aps.use_procrustes() {
            Box::new(OrthoPdm::new(Arc::clone(sm.shape()), n_active))
        } else {
            Box::new(Pdm::new(Arc::clone(sm.shape()), n_active))
        };

        let interface = GaussNewtonInterface::new(
            Arc::clone(sm.appearance()),
            Arc::clone(sm.deformation()),
            pdm,
            use_deformation_cost,
            template,
            s.clone(),
            sm.patch_shape(),
            sm.patch_normalisation(),
        )?;
        debug!(
            "scale {}: {:?} PDM with {} parameters, {} sampled pixels",
            j,
            interface.pdm().kind(),
            interface.pdm().n_parameters(),
            interface.n_sampled()
        );

        algorithms.push(builder(interface));
    }
    Ok(algorithms)
}

impl MultiScaleFitter for GaussNewtonApsFitter {
    fn scales(&self) -> &[f64] {
        self.base.scales()
    }

    fn reference_shape(&self) -> &PointCloud {
        self.base.reference_shape()
    }

    fn holistic_features(&self) -> &[HolisticFeature] {
        self.base.holistic_features()
    }

    fn algorithms(&self) -> &[Box<dyn GaussNewtonAlgorithm>] {
        self.base.algorithms()
    }

    fn max_iters(&self) -> &[usize] {
        self.base.max_iters()
    }

    fn eps(&self) -> f64 {
        self.base.eps()
    }

    fn fitter_result(
        &self,
        image: &Image,
        algorithm_results: Vec<AlgorithmResult>,
        affine_transforms: Vec<Transform2>,
        scale_transforms: Vec<Transform2>,
        gt_shape: Option<&PointCloud>,
    ) -> Result<ApsResult> {
        self.base.fitter_result(
            image,
            algorithm_results,
            affine_transforms,
            scale_transforms,
            gt_shape,
        )
    }
}
