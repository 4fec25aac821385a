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

use crate::common::PointCloud;
use crate::error::{Error, Result};

/// Gaussian prior over landmark configurations, encoding the pairwise
/// deformation springs of the tree as a precision matrix.
#[derive(Clone, Debug)]
pub struct DeformationModel {
    mean: DVector<f64>,
    precision: DMatrix<f64>,
}

impl DeformationModel {
    pub fn new(mean: DVector<f64>, precision: DMatrix<f64>) -> Result<Self> {
        let n = mean.len();
        if n % 2 != 0 || precision.nrows() != n || precision.ncols() != n {
            return Err(Error::InvalidModel(format!(
                "deformation model with mean of length {} and {}x{} precision",
                n,
                precision.nrows(),
                precision.ncols()
            )));
        }
        Ok(DeformationModel { mean, precision })
    }

    #[inline]
    pub fn n_points(&self) -> usize {
        self.mean.len() / 2
    }

    pub fn mean_vector(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn precision(&self) -> &DMatrix<f64> {
        &self.precision
    }

    /// `(s - mu)^T Q (s - mu)`.
    pub fn cost(&self, shape: &PointCloud) -> f64 {
        let d = shape.as_vector() - &self.mean;
        d.dot(&(&self.precision * &d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    #[test]
    fn test_cost_is_zero_at_mean() {
        let mean = DVector::from_vec(vec![0.0, 0.0, 1.0, 1.0]);
        let model = DeformationModel::new(mean.clone(), DMatrix::identity(4, 4) * 2.0).unwrap();
        assert_eq!(model.cost(&PointCloud::from_vector(&mean)), 0.0);

        let moved = PointCloud::new(vec![Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)]);
        assert_eq!(model.cost(&moved), 2.0);
    }
}
