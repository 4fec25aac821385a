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

mod image;
mod point_cloud;
mod transform;

use nalgebra::Point2;

pub use self::image::Image;
pub(crate) use self::image::derivative;
pub use self::point_cloud::PointCloud;
pub use self::transform::{align_similarity, Transform2};

/// Axis-aligned rectangle used to initialise a fit, e.g. a face detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    pub fn of(shape: &PointCloud) -> Self {
        let (min, max) = shape.bounds();
        BoundingBox::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn centre(&self) -> Point2<f64> {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }
}

/// Places `shape` inside `bbox`: uniform scale by the mean of the two size
/// ratios, then translation of the centres.
pub fn align_shape_with_bounding_box(shape: &PointCloud, bbox: &BoundingBox) -> PointCloud {
    let source = BoundingBox::of(shape);
    let mut ratios = Vec::with_capacity(2);
    if source.width() > 0.0 {
        ratios.push(bbox.width() / source.width());
    }
    if source.height() > 0.0 {
        ratios.push(bbox.height() / source.height());
    }
    let factor = if ratios.is_empty() {
        1.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    };

    let sc = source.centre();
    let tc = bbox.centre();
    let transform = Transform2::translation(-sc.x, -sc.y)
        .then(&Transform2::scale(factor))
        .then(&Transform2::translation(tc.x, tc.y));
    transform.apply(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_align_shape_with_bounding_box() {
        let shape = PointCloud::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ]);
        let bbox = BoundingBox::new(10.0, 20.0, 4.0, 4.0);
        let aligned = align_shape_with_bounding_box(&shape, &bbox);

        let result = BoundingBox::of(&aligned);
        assert_relative_eq!(result.x(), 10.0);
        assert_relative_eq!(result.y(), 20.0);
        assert_relative_eq!(result.width(), 4.0);
        assert_relative_eq!(result.height(), 4.0);
    }
}
