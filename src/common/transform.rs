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

use nalgebra::{Matrix3, Point2};

use super::PointCloud;

/// A 2-D affine transform in homogeneous coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform2 {
    h: Matrix3<f64>,
}

impl Default for Transform2 {
    fn default() -> Self {
        Transform2::identity()
    }
}

impl Transform2 {
    pub fn identity() -> Self {
        Transform2 {
            h: Matrix3::identity(),
        }
    }

    pub fn from_matrix(h: Matrix3<f64>) -> Self {
        Transform2 { h }
    }

    /// Uniform scaling about the origin.
    pub fn scale(factor: f64) -> Self {
        Transform2 {
            h: Matrix3::new(factor, 0.0, 0.0, 0.0, factor, 0.0, 0.0, 0.0, 1.0),
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Transform2 {
            h: Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0),
        }
    }

    /// Similarity `[a -b; b a] * p + t`.
    pub fn similarity(a: f64, b: f64, tx: f64, ty: f64) -> Self {
        Transform2 {
            h: Matrix3::new(a, -b, tx, b, a, ty, 0.0, 0.0, 1.0),
        }
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.h
    }

    /// Returns the transform that applies `self` first and `next` second.
    pub fn then(&self, next: &Transform2) -> Self {
        Transform2 { h: next.h * self.h }
    }

    /// Inverse transform, `None` when the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(|h| Transform2 { h })
    }

    pub fn apply_point(&self, p: &Point2<f64>) -> Point2<f64> {
        self.h.transform_point(p)
    }

    pub fn apply(&self, shape: &PointCloud) -> PointCloud {
        PointCloud::new(shape.points().iter().map(|p| self.apply_point(p)).collect())
    }
}

/// Least-squares similarity transform mapping `source` onto `target`.
///
/// Both clouds must have the same number of points.
pub fn align_similarity(source: &PointCloud, target: &PointCloud) -> Transform2 {
    debug_assert_eq!(source.n_points(), target.n_points());

    let cs = source.centre();
    let ct = target.centre();

    let mut norm = 0.0;
    let mut dot = 0.0;
    let mut cross = 0.0;
    for (s, t) in source.points().iter().zip(target.points()) {
        let s = s - cs;
        let t = t - ct;
        norm += s.norm_squared();
        dot += s.x * t.x + s.y * t.y;
        cross += s.x * t.y - s.y * t.x;
    }

    if norm == 0.0 {
        return Transform2::translation(ct.x - cs.x, ct.y - cs.y);
    }

    let a = dot / norm;
    let b = cross / norm;
    let tx = ct.x - (a * cs.x - b * cs.y);
    let ty = ct.y - (b * cs.x + a * cs.y);
    Transform2::similarity(a, b, tx, ty)
}
