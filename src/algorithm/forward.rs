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

use super::{iterate, AlgorithmResult, GaussNewtonAlgorithm, GaussNewtonInterface};
use crate::common::{Image, PointCloud};
use crate::error::Result;

/// Forward Gauss-Newton: linearises around the warped image, recomputing the
/// Jacobian and Hessian at every iteration.
#[derive(Debug)]
pub struct Forward {
    interface: GaussNewtonInterface,
}

impl Forward {
    pub fn new(interface: GaussNewtonInterface) -> Self {
        Forward { interface }
    }
}

impl GaussNewtonAlgorithm for Forward {
    fn name(&self) -> &'static str {
        "forward"
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
        let interface = &self.interface;
        iterate(
            interface,
            image,
            initial_shape,
            gt_shape,
            max_iters,
            eps,
            |patches, e, shape| {
                let j = interface.steepest_descent(patches);
                let jt_a = j.tr_mul(interface.masked_precision());
                let hessian = interface.hessian(&jt_a, &j);
                let b = interface.descent_direction(&jt_a, e, shape);
                interface.solve(&hessian, &b)
            },
        )
    }
}
