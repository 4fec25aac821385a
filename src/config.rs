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

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::algorithm::AlgorithmKind;
use crate::checks::ScaleParam;
use crate::error::Result;
use crate::feat::Sampling;
use crate::model::ShapeComponents;

pub const DEFAULT_MAX_ITERS: usize = 20;
pub const DEFAULT_EPS: f64 = 1e-5;

/// Hyper-parameters of a [`GaussNewtonApsFitter`](crate::GaussNewtonApsFitter).
///
/// Every field is optional in JSON; missing ones take the defaults below.
///
/// ```json
/// {
///     "algorithm": "forward",
///     "n_shape": [3, 0.95],
///     "use_deformation_cost": false,
///     "sampling": [{"step": 2}, null],
///     "max_iters": 40
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitterConfig {
    /// Solver variant built at every scale.
    pub algorithm: AlgorithmKind,
    /// Active shape components: count, variance fraction or `null` for all.
    pub n_shape: ScaleParam<ShapeComponents>,
    /// Include the deformation prior in the cost and the Hessian.
    pub use_deformation_cost: bool,
    pub sampling: ScaleParam<Sampling>,
    pub max_iters: ScaleParam<usize>,
    /// Convergence threshold on the mean landmark displacement, in pixels.
    pub eps: f64,
}

impl Default for FitterConfig {
    fn default() -> Self {
        FitterConfig {
            algorithm: AlgorithmKind::Inverse,
            n_shape: ScaleParam::Single(ShapeComponents::All),
            use_deformation_cost: true,
            sampling: ScaleParam::Single(Sampling::Full),
            max_iters: ScaleParam::Single(DEFAULT_MAX_ITERS),
            eps: DEFAULT_EPS,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FitterConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<FitterConfig> {
    Ok(serde_json::from_str(contents)?)
}
