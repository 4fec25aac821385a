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

mod appearance;
mod deformation;
mod shape;

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nalgebra::{DMatrix, DVector};

pub use self::appearance::AppearanceModel;
pub use self::deformation::DeformationModel;
pub use self::shape::{ShapeComponents, ShapeModel};

use crate::common::PointCloud;
use crate::error::{Error, Result};
use crate::feat::{HolisticFeature, PatchNormalisation, PatchShape};

/// Largest patch, in pixels, a model may declare.
pub const MAX_PATCH_PIXELS: usize = 1 << 16;

/// Everything the model holds for one scale of the pyramid.
#[derive(Clone, Debug)]
pub struct ScaleModel {
    appearance: Arc<AppearanceModel>,
    shape: Arc<ShapeModel>,
    deformation: Arc<DeformationModel>,
    patch_shape: PatchShape,
    patch_normalisation: PatchNormalisation,
}

impl ScaleModel {
    pub fn new(
        appearance: AppearanceModel,
        shape: ShapeModel,
        deformation: DeformationModel,
        patch_shape: PatchShape,
        patch_normalisation: PatchNormalisation,
    ) -> Self {
        ScaleModel {
            appearance: Arc::new(appearance),
            shape: Arc::new(shape),
            deformation: Arc::new(deformation),
            patch_shape,
            patch_normalisation,
        }
    }

    pub fn appearance(&self) -> &Arc<AppearanceModel> {
        &self.appearance
    }

    pub fn shape(&self) -> &Arc<ShapeModel> {
        &self.shape
    }

    pub fn deformation(&self) -> &Arc<DeformationModel> {
        &self.deformation
    }

    pub fn patch_shape(&self) -> PatchShape {
        self.patch_shape
    }

    pub fn patch_normalisation(&self) -> PatchNormalisation {
        self.patch_normalisation
    }
}

/// A trained generative Active Pictorial Structures model.
///
/// Scales are ordered as they are fitted, coarse to fine; `scale_models()[j]`
/// belongs to `scales()[j]`.
#[derive(Clone, Debug)]
pub struct GenerativeAps {
    scales: Vec<f64>,
    reference_shape: PointCloud,
    holistic_features: Vec<HolisticFeature>,
    use_procrustes: bool,
    scale_models: Vec<ScaleModel>,
}

fn check_count(name: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::ScaleCount {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

impl GenerativeAps {
    pub fn new(
        scales: Vec<f64>,
        reference_shape: PointCloud,
        holistic_features: Vec<HolisticFeature>,
        use_procrustes: bool,
        scale_models: Vec<ScaleModel>,
    ) -> Result<Self> {
        if scales.is_empty() {
            return Err(Error::InvalidModel("model has no scales".to_string()));
        }
        if let Some(s) = scales.iter().find(|s| !(**s > 0.0)) {
            return Err(Error::InvalidModel(format!("illegal scale: {}", s)));
        }
        let n_scales = scales.len();
        check_count("holistic_features", n_scales, holistic_features.len())?;
        check_count("scale_models", n_scales, scale_models.len())?;

        let n_points = reference_shape.n_points();
        for (j, sm) in scale_models.iter().enumerate() {
            if sm.shape.n_points() != n_points || sm.deformation.n_points() != n_points {
                return Err(Error::InvalidModel(format!(
                    "scale {}: shape/deformation models do not have {} points",
                    j, n_points
                )));
            }
            let patch_shape = sm.patch_shape;
            if patch_shape.height == 0 || patch_shape.width == 0 {
                return Err(Error::InvalidModel(format!("scale {}: empty patch shape", j)));
            }
            let n_features = patch_shape
                .checked_n_pixels()
                .filter(|n| *n <= MAX_PATCH_PIXELS)
                .and_then(|n| n.checked_mul(n_points))
                .ok_or_else(|| {
                    Error::InvalidModel(format!(
                        "scale {}: {}x{} patches are too large",
                        j, patch_shape.height, patch_shape.width
                    ))
                })?;
            if sm.appearance.n_features() != n_features {
                return Err(Error::InvalidModel(format!(
                    "scale {}: appearance model has {} features, patches give {}",
                    j,
                    sm.appearance.n_features(),
                    n_features
                )));
            }
        }

        Ok(GenerativeAps {
            scales,
            reference_shape,
            holistic_features,
            use_procrustes,
            scale_models,
        })
    }

    /// Assembles a model from parallel per-scale lists.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        scales: Vec<f64>,
        reference_shape: PointCloud,
        holistic_features: Vec<HolisticFeature>,
        use_procrustes: bool,
        appearance_models: Vec<AppearanceModel>,
        shape_models: Vec<ShapeModel>,
        deformation_models: Vec<DeformationModel>,
        patch_shapes: Vec<PatchShape>,
        patch_normalisations: Vec<PatchNormalisation>,
    ) -> Result<Self> {
        let n_scales = scales.len();
        check_count("appearance_models", n_scales, appearance_models.len())?;
        check_count("shape_models", n_scales, shape_models.len())?;
        check_count("deformation_models", n_scales, deformation_models.len())?;
        check_count("patch_shape", n_scales, patch_shapes.len())?;
        check_count("patch_normalisation", n_scales, patch_normalisations.len())?;

        let scale_models = appearance_models
            .into_iter()
            .zip(shape_models)
            .zip(deformation_models)
            .zip(patch_shapes.into_iter().zip(patch_normalisations))
            .map(|(((am, sm), dm), (ps, pn))| ScaleModel::new(am, sm, dm, ps, pn))
            .collect();

        GenerativeAps::new(
            scales,
            reference_shape,
            holistic_features,
            use_procrustes,
            scale_models,
        )
    }

    #[inline]
    pub fn n_scales(&self) -> usize {
        self.scales.len()
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn reference_shape(&self) -> &PointCloud {
        &self.reference_shape
    }

    pub fn holistic_features(&self) -> &[HolisticFeature] {
        &self.holistic_features
    }

    pub fn use_procrustes(&self) -> bool {
        self.use_procrustes
    }

    pub fn scale_models(&self) -> &[ScaleModel] {
        &self.scale_models
    }

    pub fn n_points(&self) -> usize {
        self.reference_shape.n_points()
    }
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<GenerativeAps> {
    let mut buf = vec![];
    File::open(path)?.read_to_end(&mut buf)?;
    read_model(buf)
}

pub fn read_model(buf: Vec<u8>) -> Result<GenerativeAps> {
    ModelReader::new(buf).read()
}

pub fn save_model<P: AsRef<Path>>(model: &GenerativeAps, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_model(model, &mut writer)?;
    writer.flush()?;
    Ok(())
}

struct ModelReader {
    reader: Cursor<Vec<u8>>,
}

impl ModelReader {
    fn new(buf: Vec<u8>) -> Self {
        ModelReader {
            reader: Cursor::new(buf),
        }
    }

    fn read(mut self) -> Result<GenerativeAps> {
        let n_scales = self.read_count("n_scales")?;
        let scales = self.read_f64_vec(n_scales)?;
        let use_procrustes = self.reader.read_u8()? != 0;
        let n_points = self.read_count("n_points")?;
        let reference_shape = PointCloud::from_vector(&self.read_vector(2 * n_points)?);

        let mut holistic_features = Vec::with_capacity(n_scales);
        let mut scale_models = Vec::with_capacity(n_scales);
        for _ in 0..n_scales {
            let feature_id = self.read_i32()?;
            let feature = HolisticFeature::from(feature_id).ok_or_else(|| {
                Error::InvalidModel(format!("unexpected holistic feature id: {}", feature_id))
            })?;
            holistic_features.push(feature);

            let height = self.read_count("patch height")? as u32;
            let width = self.read_count("patch width")? as u32;
            let normalisation_id = self.read_i32()?;
            let normalisation = PatchNormalisation::from(normalisation_id).ok_or_else(|| {
                Error::InvalidModel(format!(
                    "unexpected patch normalisation id: {}",
                    normalisation_id
                ))
            })?;

            let shape = self.read_shape_model(n_points)?;
            let appearance = self.read_appearance_model()?;
            let deformation = self.read_deformation_model(n_points)?;

            scale_models.push(ScaleModel::new(
                appearance,
                shape,
                deformation,
                PatchShape::new(height, width),
                normalisation,
            ));
        }

        GenerativeAps::new(
            scales,
            reference_shape,
            holistic_features,
            use_procrustes,
            scale_models,
        )
    }

    fn read_shape_model(&mut self, n_points: usize) -> Result<ShapeModel> {
        let n_components = self.read_count("shape components")?;
        let mean = self.read_vector(2 * n_points)?;
        let components = self.read_matrix(n_components, 2 * n_points)?;
        let eigenvalues = self.read_vector(n_components)?;
        ShapeModel::new(mean, components, eigenvalues)
    }

    fn read_appearance_model(&mut self) -> Result<AppearanceModel> {
        let dim = self.read_count("appearance dimension")?;
        let mean = self.read_vector(dim)?;
        let precision = self.read_matrix(dim, dim)?;
        AppearanceModel::new(mean, precision)
    }

    fn read_deformation_model(&mut self, n_points: usize) -> Result<DeformationModel> {
        let mean = self.read_vector(2 * n_points)?;
        let precision = self.read_matrix(2 * n_points, 2 * n_points)?;
        DeformationModel::new(mean, precision)
    }

    fn read_count(&mut self, what: &str) -> Result<usize> {
        let value = self.read_i32()?;
        if value < 0 {
            return Err(Error::InvalidModel(format!("negative {}: {}", what, value)));
        }
        Ok(value as usize)
    }

    fn read_f64_vec(&mut self, len: usize) -> Result<Vec<f64>> {
        let remaining = self.reader.get_ref().len() as u64 - self.reader.position();
        if (len as u64).saturating_mul(8) > remaining {
            return Err(Error::InvalidModel(format!(
                "truncated model: {} values requested, {} bytes left",
                len, remaining
            )));
        }
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.reader.read_f64::<LittleEndian>()?);
        }
        Ok(values)
    }

    fn read_vector(&mut self, len: usize) -> Result<DVector<f64>> {
        Ok(DVector::from_vec(self.read_f64_vec(len)?))
    }

    fn read_matrix(&mut self, rows: usize, cols: usize) -> Result<DMatrix<f64>> {
        let values = self.read_f64_vec(rows.saturating_mul(cols))?;
        Ok(DMatrix::from_row_slice(rows, cols, &values))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.reader.read_i32::<LittleEndian>()?)
    }
}

/// Serialises `model` in the format understood by [`read_model`].
pub fn write_model<W: Write>(model: &GenerativeAps, writer: &mut W) -> Result<()> {
    writer.write_i32::<LittleEndian>(model.n_scales() as i32)?;
    write_f64s(writer, model.scales())?;
    writer.write_u8(u8::from(model.use_procrustes()))?;
    writer.write_i32::<LittleEndian>(model.n_points() as i32)?;
    write_f64s(writer, model.reference_shape().as_vector().as_slice())?;

    for (feature, sm) in model.holistic_features().iter().zip(model.scale_models()) {
        writer.write_i32::<LittleEndian>(feature.id())?;
        writer.write_i32::<LittleEndian>(sm.patch_shape().height as i32)?;
        writer.write_i32::<LittleEndian>(sm.patch_shape().width as i32)?;
        writer.write_i32::<LittleEndian>(sm.patch_normalisation().id())?;

        let shape = sm.shape();
        writer.write_i32::<LittleEndian>(shape.n_components() as i32)?;
        write_f64s(writer, shape.mean_vector().as_slice())?;
        write_matrix(writer, shape.components())?;
        write_f64s(writer, shape.eigenvalues().as_slice())?;

        let appearance = sm.appearance();
        writer.write_i32::<LittleEndian>(appearance.n_features() as i32)?;
        write_f64s(writer, appearance.mean().as_slice())?;
        write_matrix(writer, appearance.precision())?;

        let deformation = sm.deformation();
        write_f64s(writer, deformation.mean_vector().as_slice())?;
        write_matrix(writer, deformation.precision())?;
    }
    Ok(())
}

fn write_f64s<W: Write>(writer: &mut W, values: &[f64]) -> Result<()> {
    for v in values {
        writer.write_f64::<LittleEndian>(*v)?;
    }
    Ok(())
}

fn write_matrix<W: Write>(writer: &mut W, m: &DMatrix<f64>) -> Result<()> {
    for r in 0..m.nrows() {
        for c in 0..m.ncols() {
            writer.write_f64::<LittleEndian>(m[(r, c)])?;
        }
    }
    Ok(())
}
