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

/// Norm below which a vector is treated as linearly dependent on a basis.
const K_DEPENDENCE_TOL: f64 = 1e-10;

pub fn vector_inner_product(left: &[f64], right: &[f64]) -> f64 {
    debug_assert_eq!(left.len(), right.len());
    left.iter().zip(right).map(|(l, r)| l * r).sum()
}

/// Orthonormalises `candidates` against `basis` and against each other,
/// appending the survivors to `basis`.
///
/// Returns the indices of the candidates that were kept; candidates that lie
/// in the span of the existing vectors are dropped.
pub fn orthonormalise_against(
    basis: &mut Vec<DVector<f64>>,
    candidates: &[DVector<f64>],
) -> Vec<usize> {
    let mut kept = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let mut v = candidate.clone();
        // two passes keep the result orthogonal in floating point
        for _ in 0..2 {
            for b in basis.iter() {
                let projection = vector_inner_product(b.as_slice(), v.as_slice());
                v.axpy(-projection, b, 1.0);
            }
        }
        let norm = v.norm();
        if norm > K_DEPENDENCE_TOL {
            basis.push(v / norm);
            kept.push(i);
        }
    }
    kept
}

/// Solves `h * x = b` for a symmetric positive (semi-)definite `h`.
///
/// Cholesky first, LU as a fallback. `None` when both fail.
pub fn solve_symmetric(h: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if let Some(chol) = h.clone().cholesky() {
        return Some(chol.solve(b));
    }
    h.clone().lu().solve(b)
}

pub fn select_rows(v: &DVector<f64>, indices: &[usize]) -> DVector<f64> {
    DVector::from_iterator(indices.len(), indices.iter().map(|&i| v[i]))
}

pub fn select_square(m: &DMatrix<f64>, indices: &[usize]) -> DMatrix<f64> {
    let n = indices.len();
    DMatrix::from_fn(n, n, |r, c| m[(indices[r], indices[c])])
}
