#![allow(dead_code)]

use std::sync::Arc;

use nalgebra::{DMatrix, DVector, Point2};

use rustaps::model::{AppearanceModel, DeformationModel, ShapeModel};
use rustaps::{
    extract_patches, GenerativeAps, HolisticFeature, Image, PatchNormalisation, PatchShape,
    PointCloud, Transform2,
};

pub const PATCH_SHAPE: PatchShape = PatchShape::new(9, 9);
pub const IMAGE_SIZE: u32 = 64;
const BLOB_SIGMA: f64 = 2.5;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Landmarks of the synthetic object, in image coordinates.
pub fn true_shape() -> PointCloud {
    PointCloud::new(vec![
        Point2::new(20.0, 20.0),
        Point2::new(44.0, 22.0),
        Point2::new(32.0, 33.0),
        Point2::new(22.0, 45.0),
        Point2::new(43.0, 44.0),
    ])
}

/// Dark image with one Gaussian blob centred on every landmark.
pub fn blob_image() -> Image {
    let shape = true_shape();
    Image::from_fn(IMAGE_SIZE, IMAGE_SIZE, |x, y| {
        shape
            .points()
            .iter()
            .map(|p| {
                let dx = f64::from(x) - p.x;
                let dy = f64::from(y) - p.y;
                (-(dx * dx + dy * dy) / (2.0 * BLOB_SIGMA * BLOB_SIGMA)).exp()
            })
            .sum()
    })
}

/// Two translation components and one local deformation, all orthonormal.
fn shape_model(mean: &PointCloud) -> ShapeModel {
    let n = mean.n_points();
    let dim = 2 * n;
    let t = 1.0 / (n as f64).sqrt();
    let l = 1.0 / 2f64.sqrt();

    let mut components = DMatrix::zeros(3, dim);
    for i in 0..n {
        components[(0, 2 * i)] = t;
        components[(1, 2 * i + 1)] = t;
    }
    components[(2, 0)] = l;
    components[(2, 2)] = -l;

    ShapeModel::new(
        mean.as_vector(),
        components,
        DVector::from_vec(vec![4.0, 2.0, 1.0]),
    )
    .unwrap()
}

/// A model trained, in effect, on the blob image alone.
///
/// At every scale the appearance mean is the patch vector at the true shape,
/// the appearance precision is the identity and the deformation prior is
/// centred on the true shape.
pub fn synthetic_aps(scales: &[f64], use_procrustes: bool) -> GenerativeAps {
    let image = blob_image();
    let reference = true_shape();

    let mut appearance = Vec::with_capacity(scales.len());
    let mut shape = Vec::with_capacity(scales.len());
    let mut deformation = Vec::with_capacity(scales.len());
    for &scale in scales {
        let scaled_image = image.rescale(scale);
        let scaled_shape = Transform2::scale(scale).apply(&reference);

        let mean = extract_patches(&scaled_image, &scaled_shape, PATCH_SHAPE, PatchNormalisation::NoOp);
        appearance.push(AppearanceModel::isotropic(mean));
        shape.push(shape_model(&scaled_shape));

        let dim = 2 * scaled_shape.n_points();
        deformation.push(
            DeformationModel::new(scaled_shape.as_vector(), DMatrix::identity(dim, dim)).unwrap(),
        );
    }

    GenerativeAps::from_parts(
        scales.to_vec(),
        reference,
        vec![HolisticFeature::NoOp; scales.len()],
        use_procrustes,
        appearance,
        shape,
        deformation,
        vec![PATCH_SHAPE; scales.len()],
        vec![PatchNormalisation::NoOp; scales.len()],
    )
    .unwrap()
}

pub fn shared_aps(scales: &[f64], use_procrustes: bool) -> Arc<GenerativeAps> {
    Arc::new(synthetic_aps(scales, use_procrustes))
}
