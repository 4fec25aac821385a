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

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Gaussian model of the concatenated patch appearance at one scale.
#[derive(Clone, Debug)]
pub struct AppearanceModel {
    mean: DVector<f64>,
    precision: DMatrix<f64>,
}

impl AppearanceModel {
    pub fn new(mean: DVector<f64>, precision: DMatrix<f64>) -> Result<Self> {
        let n = mean.len();
        if precision.nrows() != n || precision.ncols() != n {
            return Err(Error::InvalidModel(format!(
                "appearance precision is {}x{}, expected {}x{}",
                precision.nrows(),
                precision.ncols(),
                n,
                n
            )));
        }
        Ok(AppearanceModel { mean, precision })
    }

    /// Model with identity precision, i.e. plain sum of squared differences.
    pub fn isotropic(mean: DVector<f64>) -> Self {
        let n = mean.len();
        AppearanceModel {
            mean,
            precision: DMatrix::identity(n, n),
        }
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// The mean appearance instance, used as the fitting template.
    pub fn mean(&self) -> DVector<f64> {
        self.mean.clone()
    }

    pub fn precision(&self) -> &DMatrix<f64> {
        &self.precision
    }
}
