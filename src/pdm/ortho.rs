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

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use super::{LinearBasis, PdmKind, ShapeParametrization};
use crate::common::PointCloud;
use crate::math::orthonormalise_against;
use crate::model::ShapeModel;

/// Number of similarity parameters: scale/rotation pair and translation.
const N_GLOBAL: usize = 4;

/// Shape model augmented with a global similarity transform.
///
/// The first four parameters span scaling, rotation and translation of the
/// mean; the remaining ones are the active shape components made orthogonal
/// to them, so the local parameters never encode pose.
#[derive(Clone, Debug)]
pub struct OrthoPdm {
    model: Arc<ShapeModel>,
    n_active: usize,
    n_global: usize,
    linear: LinearBasis,
}

/// Basis vectors of the similarity transforms of `mean`.
fn similarity_basis(mean: &DVector<f64>) -> Vec<DVector<f64>> {
    let n = mean.len() / 2;
    let mut rotated = DVector::zeros(2 * n);
    let mut tx = DVector::zeros(2 * n);
    let mut ty = DVector::zeros(2 * n);
    for i in 0..n {
        rotated[2 * i] = -mean[2 * i + 1];
        rotated[2 * i + 1] = mean[2 * i];
        tx[2 * i] = 1.0;
        ty[2 * i + 1] = 1.0;
    }
    vec![mean.clone(), rotated, tx, ty]
}

impl OrthoPdm {
    /// # Panics
    ///
    /// Panics if `n_active` exceeds the number of model components.
    pub fn new(model: Arc<ShapeModel>, n_active: usize) -> Self {
        if n_active > model.n_components() {
            panic!(
                "Illegal active component count: {} of {}",
                n_active,
                model.n_components()
            );
        }
        let mean = model.mean_vector().clone();

        let mut columns = Vec::with_capacity(N_GLOBAL + n_active);
        orthonormalise_against(&mut columns, &similarity_basis(&mean));
        let n_global = columns.len();

        let components: Vec<DVector<f64>> = (0..n_active).map(|i| model.component(i)).collect();
        let kept = orthonormalise_against(&mut columns, &components);
        if kept.len() < components.len() {
            log::debug!(
                "{} shape components are spanned by the similarity basis and were dropped",
                components.len() - kept.len()
            );
        }

        let linear = LinearBasis::new(mean, &columns);
        OrthoPdm {
            model,
            n_active,
            n_global,
            linear,
        }
    }

    /// Similarity-only parameters of `params`.
    pub fn global_parameters(&self, params: &DVector<f64>) -> DVector<f64> {
        params.rows(0, self.n_global).into_owned()
    }
}

impl ShapeParametrization for OrthoPdm {
    fn kind(&self) -> PdmKind {
        PdmKind::ProcrustesNormalized
    }

    fn shape_model(&self) -> &ShapeModel {
        &self.model
    }

    fn n_points(&self) -> usize {
        self.model.n_points()
    }

    fn n_parameters(&self) -> usize {
        self.linear.n_parameters()
    }

    fn n_global_parameters(&self) -> usize {
        self.n_global
    }

    fn n_active_components(&self) -> usize {
        self.n_active
    }

    fn project(&self, shape: &PointCloud) -> DVector<f64> {
        self.linear.project(shape)
    }

    fn instance(&self, params: &DVector<f64>) -> PointCloud {
        self.linear.instance(params)
    }

    fn d_dp(&self) -> &DMatrix<f64> {
        &self.linear.basis
    }
}
