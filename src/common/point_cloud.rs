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

use nalgebra::{DVector, Point2};

/// An ordered set of 2-D landmarks.
///
/// Points are stored as `(x, y)` pairs; the flat vector form used by the
/// statistical models is `[x0, y0, x1, y1, ...]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    points: Vec<Point2<f64>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        PointCloud { points }
    }

    pub fn from_vector(v: &DVector<f64>) -> Self {
        debug_assert!(v.len() % 2 == 0);
        let points = v
            .as_slice()
            .chunks_exact(2)
            .map(|xy| Point2::new(xy[0], xy[1]))
            .collect();
        PointCloud { points }
    }

    pub fn as_vector(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.points.len() * 2,
            self.points.iter().flat_map(|p| [p.x, p.y]),
        )
    }

    #[inline]
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn centre(&self) -> Point2<f64> {
        if self.points.is_empty() {
            return Point2::origin();
        }
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2::new(sx / n, sy / n)
    }

    /// Frobenius norm of the points after removing the centre.
    pub fn centred_norm(&self) -> f64 {
        let c = self.centre();
        self.points
            .iter()
            .map(|p| (p - c).norm_squared())
            .sum::<f64>()
            .sqrt()
    }

    /// Returns `(min, max)` corners of the axis-aligned bounding box.
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Width and height of the bounding box.
    pub fn range(&self) -> (f64, f64) {
        let (min, max) = self.bounds();
        (max.x - min.x, max.y - min.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> PointCloud {
        PointCloud::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ])
    }

    #[test]
    fn test_flat_vector_layout() {
        let v = square().as_vector();
        assert_eq!(v.as_slice(), &[0.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0, 2.0]);
        assert_eq!(PointCloud::from_vector(&v), square());
    }

    #[test]
    fn test_centre_and_norm() {
        let pc = square();
        assert_eq!(pc.centre(), Point2::new(1.0, 1.0));
        // four points at distance sqrt(2) from the centre
        assert_relative_eq!(pc.centred_norm(), 8.0_f64.sqrt());
        assert_eq!(pc.range(), (2.0, 2.0));
    }
}
