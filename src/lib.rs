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

//! Fitting of generative Active Pictorial Structures (APS).
//!
//! A trained [`GenerativeAps`] describes a deformable object as a tree of
//! landmarks with a Gaussian patch appearance model, a linear shape model
//! and a Gaussian deformation prior at every scale. A fitter runs one
//! Gauss-Newton optimiser per scale, coarse to fine, to locate the
//! landmarks in a new image.
//!
//! # Examples
//!
//! ```no_run
//! use rustaps::{BoundingBox, FitterConfig, Image, MultiScaleFitter};
//!
//! let fitter = rustaps::create_fitter("/path/to/model", &FitterConfig::default()).unwrap();
//! let image = Image::new(640, 480);
//! let bbox = BoundingBox::new(200.0, 120.0, 180.0, 200.0);
//! let result = fitter.fit_from_bb(&image, &bbox, None).unwrap();
//! for point in result.final_shape().points() {
//!     println!("{} {}", point.x, point.y);
//! }
//! ```

mod common;
mod math;
mod feat;
mod pdm;
mod checks;
mod config;
mod error;
mod result;
pub mod algorithm;
pub mod fitter;
pub mod model;

pub use crate::algorithm::{
    AlgorithmBuilder, AlgorithmKind, AlgorithmResult, Forward, GaussNewtonAlgorithm,
    GaussNewtonInterface, Inverse,
};
pub use crate::checks::{check_max_iters, check_multi_scale_param, check_n_shape, check_sampling, ScaleParam};
pub use crate::common::{align_shape_with_bounding_box, align_similarity, BoundingBox, Image, PointCloud, Transform2};
pub use crate::config::{load_config, parse_config, FitterConfig, DEFAULT_EPS, DEFAULT_MAX_ITERS};
pub use crate::error::{Error, Result};
pub use crate::feat::{extract_patches, HolisticFeature, PatchNormalisation, PatchShape, Sampling};
pub use crate::fitter::{ApsFitter, GaussNewtonApsFitter, MultiScaleFitter};
pub use crate::model::{load_model, read_model, save_model, write_model, GenerativeAps, ShapeComponents};
pub use crate::pdm::{OrthoPdm, Pdm, PdmKind, ShapeParametrization};
pub use crate::result::{bb_normalised_error, ApsResult};

use std::path::Path;
use std::sync::Arc;

/// Create a Gauss-Newton fitter, based on a file with model description.
pub fn create_fitter<P: AsRef<Path>>(path_to_model: P, config: &FitterConfig) -> Result<GaussNewtonApsFitter> {
    let model = load_model(path_to_model)?;
    create_fitter_with_model(Arc::new(model), config)
}

/// Create a Gauss-Newton fitter, based on the provided model.
pub fn create_fitter_with_model(model: Arc<GenerativeAps>, config: &FitterConfig) -> Result<GaussNewtonApsFitter> {
    GaussNewtonApsFitter::new(model, config)
}
