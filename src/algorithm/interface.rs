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

use crate::common::{Image, PointCloud};
use crate::error::{Error, Result};
use crate::feat::{extract_patches, patch_gradients, PatchNormalisation, PatchShape, Sampling};
use crate::math::{select_rows, select_square, solve_symmetric};
use crate::model::{AppearanceModel, DeformationModel};
use crate::pdm::ShapeParametrization;

/// Everything a Gauss-Newton solver needs at one scale.
///
/// Vectors called *masked* keep only the patch pixels selected by the
/// sampling mask; the precision matrix is restricted the same way.
#[derive(Debug)]
pub struct GaussNewtonInterface {
    appearance: Arc<AppearanceModel>,
    deformation: Arc<DeformationModel>,
    pdm: Box<dyn ShapeParametrization>,
    use_deformation_cost: bool,
    template: DVector<f64>,
    sampling: Sampling,
    patch_shape: PatchShape,
    patch_normalisation: PatchNormalisation,
    i_mask: Vec<usize>,
    masked_precision: DMatrix<f64>,
    deformation_hessian: DMatrix<f64>,
}

impl GaussNewtonInterface {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        appearance: Arc<AppearanceModel>,
        deformation: Arc<DeformationModel>,
        pdm: Box<dyn ShapeParametrization>,
        use_deformation_cost: bool,
        template: DVector<f64>,
        sampling: Sampling,
        patch_shape: PatchShape,
        patch_normalisation: PatchNormalisation,
    ) -> Result<Self> {
        let n_points = pdm.n_points();
        let n_pixels = patch_shape.n_pixels();
        if template.len() != n_points * n_pixels {
            return Err(Error::InvalidModel(format!(
                "template has {} entries, expected {} points of {} pixels",
                template.len(),
                n_points,
                n_pixels
            )));
        }

        let mask = sampling.mask(patch_shape)?;
        let i_mask: Vec<usize> = (0..n_points)
            .flat_map(|p| {
                mask.iter()
                    .enumerate()
                    .filter(|(_, m)| **m)
                    .map(move |(k, _)| p * n_pixels + k)
            })
            .collect();
        let masked_precision = select_square(appearance.precision(), &i_mask);

        let dw_dp = pdm.d_dp();
        let deformation_hessian = dw_dp.tr_mul(&(deformation.precision() * dw_dp));

        Ok(GaussNewtonInterface {
            appearance,
            deformation,
            pdm,
            use_deformation_cost,
            template,
            sampling,
            patch_shape,
            patch_normalisation,
            i_mask,
            masked_precision,
            deformation_hessian,
        })
    }

    pub fn appearance_model(&self) -> &AppearanceModel {
        &self.appearance
    }

    pub fn deformation_model(&self) -> &DeformationModel {
        &self.deformation
    }

    pub fn pdm(&self) -> &dyn ShapeParametrization {
        self.pdm.as_ref()
    }

    pub fn use_deformation_cost(&self) -> bool {
        self.use_deformation_cost
    }

    pub fn template(&self) -> &DVector<f64> {
        &self.template
    }

    pub fn sampling(&self) -> &Sampling {
        &self.sampling
    }

    pub fn patch_shape(&self) -> PatchShape {
        self.patch_shape
    }

    pub fn patch_normalisation(&self) -> PatchNormalisation {
        self.patch_normalisation
    }

    /// Number of patch pixels, over all landmarks, that enter the cost.
    pub fn n_sampled(&self) -> usize {
        self.i_mask.len()
    }

    pub fn masked_precision(&self) -> &DMatrix<f64> {
        &self.masked_precision
    }

    pub fn deformation_hessian(&self) -> &DMatrix<f64> {
        &self.deformation_hessian
    }

    /// Patches of `image` around every landmark of `shape`.
    pub fn warp(&self, image: &Image, shape: &PointCloud) -> DVector<f64> {
        extract_patches(image, shape, self.patch_shape, self.patch_normalisation)
    }

    pub fn masked(&self, v: &DVector<f64>) -> DVector<f64> {
        select_rows(v, &self.i_mask)
    }

    /// Steepest-descent images: the masked patch gradients chained with the
    /// PDM Jacobian, one row per sampled pixel and one column per parameter.
    pub fn steepest_descent(&self, patches: &DVector<f64>) -> DMatrix<f64> {
        let n_pixels = self.patch_shape.n_pixels();
        let (gx, gy) = patch_gradients(patches, self.pdm.n_points(), self.patch_shape);
        let dw_dp = self.pdm.d_dp();

        let mut sd = DMatrix::zeros(self.i_mask.len(), dw_dp.ncols());
        for (row, &i) in self.i_mask.iter().enumerate() {
            let point = i / n_pixels;
            let dx = dw_dp.row(2 * point);
            let dy = dw_dp.row(2 * point + 1);
            sd.row_mut(row).copy_from(&(dx * gx[i] + dy * gy[i]));
        }
        sd
    }

    /// Gauss-Newton Hessian for steepest-descent images `j`, given `j^T A`.
    pub fn hessian(&self, jt_a: &DMatrix<f64>, j: &DMatrix<f64>) -> DMatrix<f64> {
        let h = jt_a * j;
        if self.use_deformation_cost {
            h + &self.deformation_hessian
        } else {
            h
        }
    }

    /// Right-hand side of the normal equations for masked error `e` at `shape`.
    pub fn descent_direction(
        &self,
        jt_a: &DMatrix<f64>,
        e: &DVector<f64>,
        shape: &PointCloud,
    ) -> DVector<f64> {
        let b = jt_a * e;
        if self.use_deformation_cost {
            let d = shape.as_vector() - self.deformation.mean_vector();
            b + self.pdm.d_dp().tr_mul(&(self.deformation.precision() * d))
        } else {
            b
        }
    }

    /// Value of the cost being minimised for masked error `e` at `shape`.
    pub fn cost(&self, e: &DVector<f64>, shape: &PointCloud) -> f64 {
        let appearance = e.dot(&(&self.masked_precision * e));
        if self.use_deformation_cost {
            appearance + self.deformation.cost(shape)
        } else {
            appearance
        }
    }

    pub fn solve(&self, h: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
        solve_symmetric(h, b).ok_or(Error::SingularSystem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeModel;
    use crate::pdm::Pdm;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    const PATCH: PatchShape = PatchShape::new(3, 3);

    fn image() -> Image {
        Image::from_fn(32, 32, |x, y| {
            let (x, y) = (f64::from(x), f64::from(y));
            (0.3 * x).sin() + (0.2 * y).cos() + 0.01 * x * y
        })
    }

    fn mean_shape() -> PointCloud {
        PointCloud::new(vec![Point2::new(10.0, 12.0), Point2::new(20.0, 15.0)])
    }

    fn interface(use_deformation_cost: bool, sampling: Sampling) -> GaussNewtonInterface {
        let mean = mean_shape().as_vector();
        let t = 1.0 / 2f64.sqrt();
        let components = DMatrix::from_row_slice(
            2,
            4,
            &[
                t, 0.0, t, 0.0, //
                0.0, t, 0.0, t,
            ],
        );
        let shape = ShapeModel::new(mean.clone(), components, DVector::from_vec(vec![2.0, 1.0])).unwrap();
        let template = extract_patches(&image(), &mean_shape(), PATCH, PatchNormalisation::NoOp);
        let deformation = DeformationModel::new(mean, DMatrix::identity(4, 4) * 2.0).unwrap();

        GaussNewtonInterface::new(
            Arc::new(AppearanceModel::isotropic(template.clone())),
            Arc::new(deformation),
            Box::new(Pdm::new(Arc::new(shape), 2)),
            use_deformation_cost,
            template,
            sampling,
            PATCH,
            PatchNormalisation::NoOp,
        )
        .unwrap()
    }

    fn moved_shape() -> PointCloud {
        PointCloud::new(vec![Point2::new(11.0, 12.5), Point2::new(21.0, 15.5)])
    }

    #[test]
    fn test_hessian_without_deformation_cost() {
        let interface = interface(false, Sampling::Full);
        let j = interface.steepest_descent(interface.template());
        let jt_a = j.tr_mul(interface.masked_precision());

        assert_eq!(j.shape(), (2 * 9, 2));
        assert_relative_eq!(interface.hessian(&jt_a, &j), &jt_a * &j, epsilon = 1e-12);
    }

    #[test]
    fn test_hessian_with_deformation_cost() {
        let interface = interface(true, Sampling::Full);
        let j = interface.steepest_descent(interface.template());
        let jt_a = j.tr_mul(interface.masked_precision());

        let prior = interface.hessian(&jt_a, &j) - &jt_a * &j;
        assert_relative_eq!(prior, interface.deformation_hessian().clone(), epsilon = 1e-12);
        // orthonormal basis and precision 2 I
        assert_relative_eq!(prior, DMatrix::identity(2, 2) * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_descent_direction_follows_flag() {
        let shape = moved_shape();
        let e = DVector::from_element(18, 0.5);

        let without = interface(false, Sampling::Full);
        let j = without.steepest_descent(without.template());
        let jt_a = j.tr_mul(without.masked_precision());
        assert_relative_eq!(without.descent_direction(&jt_a, &e, &shape), &jt_a * &e, epsilon = 1e-12);

        let with = interface(true, Sampling::Full);
        let d = shape.as_vector() - mean_shape().as_vector();
        let expected = &jt_a * &e + with.pdm().d_dp().tr_mul(&(d * 2.0));
        assert_relative_eq!(with.descent_direction(&jt_a, &e, &shape), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_cost_follows_flag() {
        let shape = moved_shape();
        let e = DVector::from_fn(18, |i, _| i as f64 * 0.1);
        let appearance = e.dot(&e);

        assert_relative_eq!(interface(false, Sampling::Full).cost(&e, &shape), appearance, epsilon = 1e-12);

        let with = interface(true, Sampling::Full);
        // both points are off by (1, 0.5), precision is 2 I
        assert_relative_eq!(with.deformation_model().cost(&shape), 5.0, epsilon = 1e-12);
        assert_relative_eq!(with.cost(&e, &shape), appearance + 5.0, epsilon = 1e-12);
        assert_relative_eq!(with.cost(&e, &mean_shape()), appearance, epsilon = 1e-12);
    }

    #[test]
    fn test_step_mask_selects_rows() {
        let interface = interface(false, Sampling::Step(2));
        // corners of each 3x3 patch
        let expected = [0usize, 2, 6, 8, 9, 11, 15, 17];
        assert_eq!(interface.n_sampled(), expected.len());

        let v = DVector::from_fn(18, |i, _| i as f64);
        let masked = interface.masked(&v);
        assert_eq!(masked.len(), expected.len());
        for (value, &i) in masked.iter().zip(&expected) {
            assert_eq!(*value, i as f64);
        }

        assert_eq!(interface.masked_precision(), &DMatrix::<f64>::identity(8, 8));
        assert_eq!(interface.steepest_descent(interface.template()).nrows(), 8);
    }

    #[test]
    fn test_template_length_is_checked() {
        let shape = ShapeModel::new(mean_shape().as_vector(), DMatrix::zeros(0, 4), DVector::zeros(0)).unwrap();
        let deformation = DeformationModel::new(mean_shape().as_vector(), DMatrix::identity(4, 4)).unwrap();
        let result = GaussNewtonInterface::new(
            Arc::new(AppearanceModel::isotropic(DVector::zeros(18))),
            Arc::new(deformation),
            Box::new(Pdm::new(Arc::new(shape), 0)),
            true,
            DVector::zeros(17),
            Sampling::Full,
            PATCH,
            PatchNormalisation::NoOp,
        );
        assert!(matches!(result, Err(Error::InvalidModel(_))));
    }
}
