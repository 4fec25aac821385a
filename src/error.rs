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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse fitter configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Expected {expected} per-scale values for `{name}`, got {actual}")]
    ScaleCount {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid number of shape components: {0}")]
    InvalidShapeComponents(String),

    #[error("Invalid sampling: {0}")]
    InvalidSampling(String),

    #[error("Gauss-Newton system is singular")]
    SingularSystem,

    #[error("Invalid initial shape: {0}")]
    InvalidInitialShape(String),

    #[error("Fitting result holds no shapes")]
    EmptyResult,

    #[error(
        "Fitting result needs one entry per scale: {scales} scales, {results} results, \
         {affine_transforms} affine transforms, {scale_transforms} scale transforms"
    )]
    ResultMismatch {
        scales: usize,
        results: usize,
        affine_transforms: usize,
        scale_transforms: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
