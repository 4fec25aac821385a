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

//! Gauss-Newton optimisation of an APS at a single scale.

mod forward;
mod interface;
mod inverse;

use nalgebra::DVector;
use serde::Deserialize;

pub use self::forward::Forward;
pub use self::interface::GaussNewtonInterface;
pub use self::inverse::Inverse;

use crate::common::{Image, PointCloud};
use crate::error::{Error, Result};

/// An iterative solver built around one [`GaussNewtonInterface`].
pub trait GaussNewtonAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    fn interface(&self) -> &GaussNewtonInterface;

    /// Fits starting from `initial_shape`, which is first reconstructed by
    /// the shape model; that reconstruction is not counted in `max_iters`.
    fn run(
        &self,
        image: &Image,
        initial_shape: &PointCloud,
        gt_shape: Option<&PointCloud>,
        max_iters: usize,
        eps: f64,
    ) -> Result<AlgorithmResult>;
}

/// Builds the per-scale solver from its interface.
pub type AlgorithmBuilder<'a> = dyn Fn(GaussNewtonInterface) -> Box<dyn GaussNewtonAlgorithm> + 'a;

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    Inverse,
    Forward,
}

impl Default for AlgorithmKind {
    fn default() -> Self {
        AlgorithmKind::Inverse
    }
}

impl AlgorithmKind {
    pub fn build(&self, interface: GaussNewtonInterface) -> Box<dyn GaussNewtonAlgorithm> {
        match self {
            AlgorithmKind::Inverse => Box::new(Inverse::new(interface)),
            AlgorithmKind::Forward => Box::new(Forward::new(interface)),
        }
    }
}

/// Outcome of fitting one scale.
#[derive(Clone, Debug)]
pub struct AlgorithmResult {
    shapes: Vec<PointCloud>,
    shape_parameters: Vec<DVector<f64>>,
    costs: Vec<f64>,
    initial_shape: PointCloud,
    gt_shape: Option<PointCloud>,
}

impl AlgorithmResult {
    /// Fails with [`Error::EmptyResult`] when `shapes` is empty.
    pub fn new(
        shapes: Vec<PointCloud>,
        shape_parameters: Vec<DVector<f64>>,
        costs: Vec<f64>,
        initial_shape: PointCloud,
        gt_shape: Option<PointCloud>,
    ) -> Result<Self> {
        if shapes.is_empty() {
            return Err(Error::EmptyResult);
        }
        Ok(AlgorithmResult {
            shapes,
            shape_parameters,
            costs,
            initial_shape,
            gt_shape,
        })
    }

    /// Shapes visited by the optimiser; the first one is the reconstruction
    /// of the initial shape.
    pub fn shapes(&self) -> &[PointCloud] {
        &self.shapes
    }

    pub fn shape_parameters(&self) -> &[DVector<f64>] {
        &self.shape_parameters
    }

    /// Cost at each shape in [`shapes`](Self::shapes).
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    /// The shape the run started from, before reconstruction.
    pub fn initial_shape(&self) -> &PointCloud {
        &self.initial_shape
    }

    pub fn reconstructed_initial_shape(&self) -> &PointCloud {
        &self.shapes[0]
    }

    pub fn final_shape(&self) -> &PointCloud {
        &self.shapes[self.shapes.len() - 1]
    }

    pub fn gt_shape(&self) -> Option<&PointCloud> {
        self.gt_shape.as_ref()
    }

    pub fn n_iters(&self) -> usize {
        self.shapes.len() - 1
    }
}

fn mean_displacement(a: &PointCloud, b: &PointCloud) -> f64 {
    if a.n_points() == 0 {
        return 0.0;
    }
    a.points()
        .iter()
        .zip(b.points())
        .map(|(p, q)| (p - q).norm())
        .sum::<f64>()
        / a.n_points() as f64
}

/// Shared Gauss-Newton loop.
///
/// `step` receives the full patch vector, the masked error and the current
/// shape, and returns the increment that is subtracted from the parameters.
fn iterate<F>(
    interface: &GaussNewtonInterface,
    image: &Image,
    initial_shape: &PointCloud,
    gt_shape: Option<&PointCloud>,
    max_iters: usize,
    eps: f64,
    mut step: F,
) -> Result<AlgorithmResult>
where
    F: FnMut(&DVector<f64>, &DVector<f64>, &PointCloud) -> Result<DVector<f64>>,
{
    let pdm = interface.pdm();
    let template = interface.masked(interface.template());

    let mut p = pdm.project(initial_shape);
    let mut shape = pdm.instance(&p);
    let mut shapes = vec![shape.clone()];
    let mut params = vec![p.clone()];
    let mut costs = Vec::with_capacity(max_iters + 1);

    let mut k = 0;
    loop {
        let patches = interface.warp(image, &shape);
        let e = interface.masked(&patches) - &template;
        costs.push(interface.cost(&e, &shape));

        if k == max_iters {
            break;
        }
        k += 1;

        let dp = step(&patches, &e, &shape)?;
        p -= dp;
        let next = pdm.instance(&p);
        let displacement = mean_displacement(&shape, &next);
        shape = next;
        shapes.push(shape.clone());
        params.push(p.clone());

        if displacement < eps {
            let patches = interface.warp(image, &shape);
            let e = interface.masked(&patches) - &template;
            costs.push(interface.cost(&e, &shape));
            break;
        }
    }

    AlgorithmResult::new(
        shapes,
        params,
        costs,
        initial_shape.clone(),
        gt_shape.cloned(),
    )
}
