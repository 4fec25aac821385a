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
use serde::Deserialize;

use crate::common::PointCloud;
use crate::error::{Error, Result};

/// How many shape components a fitter should use at one scale.
///
/// Deserialises from `null` (all), an integer (exact count) or a float
/// (fraction of the variance to keep).
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ShapeComponents {
    All,
    Count(usize),
    Fraction(f64),
}

impl Default for ShapeComponents {
    fn default() -> Self {
        ShapeComponents::All
    }
}

/// Linear (PCA) model of landmark configurations.
#[derive(Clone, Debug)]
pub struct ShapeModel {
    mean: DVector<f64>,
    /// One orthonormal component per row.
    components: DMatrix<f64>,
    eigenvalues: DVector<f64>,
}

impl ShapeModel {
    pub fn new(
        mean: DVector<f64>,
        components: DMatrix<f64>,
        eigenvalues: DVector<f64>,
    ) -> Result<Self> {
        if mean.len() % 2 != 0 {
            return Err(Error::InvalidModel(format!(
                "shape mean has odd length {}",
                mean.len()
            )));
        }
        if components.nrows() > 0 && components.ncols() != mean.len() {
            return Err(Error::InvalidModel(format!(
                "shape components have {} columns, mean has {} entries",
                components.ncols(),
                mean.len()
            )));
        }
        if components.nrows() != eigenvalues.len() {
            return Err(Error::InvalidModel(format!(
                "{} shape components but {} eigenvalues",
                components.nrows(),
                eigenvalues.len()
            )));
        }
        let components = if components.nrows() == 0 {
            DMatrix::zeros(0, mean.len())
        } else {
            components
        };
        Ok(ShapeModel {
            mean,
            components,
            eigenvalues,
        })
    }

    #[inline]
    pub fn n_points(&self) -> usize {
        self.mean.len() / 2
    }

    #[inline]
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn mean_vector(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn mean(&self) -> PointCloud {
        PointCloud::from_vector(&self.mean)
    }

    pub fn components(&self) -> &DMatrix<f64> {
        &self.components
    }

    pub fn component(&self, i: usize) -> DVector<f64> {
        self.components.row(i).transpose()
    }

    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.eigenvalues
    }

    /// Resolves a component selection into a count, leaving the model as is.
    pub fn n_active_components(&self, selection: ShapeComponents) -> Result<usize> {
        let n = self.n_components();
        match selection {
            ShapeComponents::All => Ok(n),
            ShapeComponents::Count(k) if k <= n => Ok(k),
            ShapeComponents::Count(k) => Err(Error::InvalidShapeComponents(format!(
                "{} requested but the model has {}",
                k, n
            ))),
            ShapeComponents::Fraction(f) if f > 0.0 && f <= 1.0 => {
                let total: f64 = self.eigenvalues.iter().sum();
                if total <= 0.0 {
                    return Ok(n);
                }
                let mut acc = 0.0;
                for (i, ev) in self.eigenvalues.iter().enumerate() {
                    acc += ev;
                    if acc / total >= f - 1e-12 {
                        return Ok(i + 1);
                    }
                }
                Ok(n)
            }
            ShapeComponents::Fraction(f) => Err(Error::InvalidShapeComponents(format!(
                "variance fraction {} is outside (0, 1]",
                f
            ))),
        }
    }

    /// `mean + sum_i weights[i] * component_i`.
    pub fn instance(&self, weights: &DVector<f64>) -> PointCloud {
        let k = weights.len();
        debug_assert!(k <= self.n_components());
        let offset = self.components.rows(0, k).tr_mul(weights);
        PointCloud::from_vector(&(&self.mean + offset))
    }
}
