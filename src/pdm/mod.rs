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

//! Point distribution models: low-dimensional parametrisations of a shape.

mod ortho;
mod plain;

use std::fmt::Debug;

use nalgebra::{DMatrix, DVector};

pub use self::ortho::OrthoPdm;
pub use self::plain::Pdm;

use crate::common::PointCloud;
use crate::model::ShapeModel;

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum PdmKind {
    Plain,
    ProcrustesNormalized,
}

/// Maps shapes to parameter vectors and back.
pub trait ShapeParametrization: Debug + Send + Sync {
    fn kind(&self) -> PdmKind;

    /// The shape model this parametrisation was built from.
    fn shape_model(&self) -> &ShapeModel;

    fn n_points(&self) -> usize;

    fn n_parameters(&self) -> usize;

    /// Leading parameters that encode a global similarity transform.
    fn n_global_parameters(&self) -> usize {
        0
    }

    /// Number of shape model components in use.
    fn n_active_components(&self) -> usize;

    fn project(&self, shape: &PointCloud) -> DVector<f64>;

    fn instance(&self, params: &DVector<f64>) -> PointCloud;

    /// Jacobian of the flattened instance w.r.t. the parameters,
    /// `2 * n_points` rows by `n_parameters` columns.
    fn d_dp(&self) -> &DMatrix<f64>;

    /// Closest shape the model can represent.
    fn reconstruct(&self, shape: &PointCloud) -> PointCloud {
        self.instance(&self.project(shape))
    }
}

/// A mean plus an orthonormal column basis; both PDM variants are this.
#[derive(Clone, Debug)]
struct LinearBasis {
    mean: DVector<f64>,
    basis: DMatrix<f64>,
}

impl LinearBasis {
    fn new(mean: DVector<f64>, columns: &[DVector<f64>]) -> Self {
        let basis = if columns.is_empty() {
            DMatrix::zeros(mean.len(), 0)
        } else {
            DMatrix::from_columns(columns)
        };
        LinearBasis { mean, basis }
    }

    fn n_parameters(&self) -> usize {
        self.basis.ncols()
    }

    fn project(&self, shape: &PointCloud) -> DVector<f64> {
        self.basis.tr_mul(&(shape.as_vector() - &self.mean))
    }

    fn instance(&self, params: &DVector<f64>) -> PointCloud {
        PointCloud::from_vector(&(&self.mean + &self.basis * params))
    }
}
