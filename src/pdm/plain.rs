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
use crate::model::ShapeModel;

/// Shape model used directly: `s = mean + U^T p` over the active components.
#[derive(Clone, Debug)]
pub struct Pdm {
    model: Arc<ShapeModel>,
    n_active: usize,
    linear: LinearBasis,
}

impl Pdm {
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
        let columns: Vec<DVector<f64>> = (0..n_active).map(|i| model.component(i)).collect();
        let linear = LinearBasis::new(model.mean_vector().clone(), &columns);
        Pdm {
            model,
            n_active,
            linear,
        }
    }
}

impl ShapeParametrization for Pdm {
    fn kind(&self) -> PdmKind {
        PdmKind::Plain
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> Arc<ShapeModel> {
        let s = 0.5;
        Arc::new(
            ShapeModel::new(
                DVector::from_vec(vec![0.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0, 2.0]),
                DMatrix::from_row_slice(
                    2,
                    8,
                    &[
                        s, 0.0, s, 0.0, s, 0.0, s, 0.0, //
                        0.0, s, 0.0, s, 0.0, s, 0.0, s,
                    ],
                ),
                DVector::from_vec(vec![4.0, 1.0]),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_project_instance_round_trip() {
        let pdm = Pdm::new(model(), 2);
        let params = DVector::from_vec(vec![1.5, -0.25]);
        let shape = pdm.instance(&params);
        assert_relative_eq!(pdm.project(&shape), params, epsilon = 1e-12);
        assert_eq!(pdm.kind(), PdmKind::Plain);
        assert_eq!(pdm.d_dp().shape(), (8, 2));
    }

    #[test]
    fn test_inactive_components_are_ignored() {
        let pdm = Pdm::new(model(), 1);
        assert_eq!(pdm.n_parameters(), 1);
        // the second component is invisible to a one-component model
        let shape = PointCloud::from_vector(&(model().mean_vector() + model().component(1)));
        assert_relative_eq!(
            pdm.reconstruct(&shape).as_vector(),
            model().mean_vector().clone(),
            epsilon = 1e-12
        );
    }
}
