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

use nalgebra::DMatrix;

use super::{iterate, AlgorithmResult, GaussNewtonAlgorithm, GaussNewtonInterface};
use crate::common::{Image, PointCloud};
use crate::error::Result;

/// Inverse Gauss-Newton: linearises around the template, so the Jacobian and
/// Hessian are computed once, at construction.
#[derive(Debug)]
pub struct Inverse {
    interface: GaussNewtonInterface,
    jt_a: DMatrix<f64>,
    hessian: DMatrix<f64>,
}

impl Inverse {
    pub fn new(interface: GaussNewtonInterface) -> Self {
        let j = interface.steepest_descent(interface.template());
        let jt_a = j.tr_mul(interface.masked_precision());
        let hessian = interface.hessian(&jt_a, &j);
        Inverse {
            interface,
            jt_a,
            hessian,
        }
    }
}

impl GaussNewtonAlgorithm for Inverse {
    fn name(&self) -> &'static str {
        "inverse"
    }

    fn interface(&self) -> &GaussNewtonInterface {
        &self.interface
    }

    fn run(
        &self,
        image: &Image,
        initial_shape: &PointCloud,
        gt_shape: Option<&PointCloud>,
        max_iters: usize,
        eps: f64,
    ) -> Result<AlgorithmResult> {
        iterate(
            &self.interface,
            image,
            initial_shape,
            gt_shape,
            max_iters,
            eps,
            |_, e, shape| {
                let b = self.interface.descent_direction(&self.jt_a, e, shape);
                self.interface.solve(&self.hessian, &b)
            },
        )
    }
}
