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

//! Normalisation of per-scale fitter parameters.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::feat::Sampling;
use crate::model::{GenerativeAps, ShapeComponents};

/// A parameter given either once for every scale or once per scale.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScaleParam<T> {
    PerScale(Vec<T>),
    Single(T),
}

impl<T: Default> Default for ScaleParam<T> {
    fn default() -> Self {
        ScaleParam::Single(T::default())
    }
}

/// Expands `param` into exactly `n_scales` values.
///
/// A single value is repeated; a per-scale list must have length `n_scales`.
pub fn check_multi_scale_param<T: Clone>(
    param: &ScaleParam<T>,
    n_scales: usize,
    name: &'static str,
) -> Result<Vec<T>> {
    match param {
        ScaleParam::Single(value) => Ok(vec![value.clone(); n_scales]),
        ScaleParam::PerScale(values) if values.len() == n_scales => Ok(values.clone()),
        ScaleParam::PerScale(values) => Err(Error::ScaleCount {
            name,
            expected: n_scales,
            actual: values.len(),
        }),
    }
}

/// Resolves the shape-component selection into an active component count
/// per scale. The model itself is left untouched.
pub fn check_n_shape(n_shape: &ScaleParam<ShapeComponents>, aps: &GenerativeAps) -> Result<Vec<usize>> {
    let selections = check_multi_scale_param(n_shape, aps.n_scales(), "n_shape")?;
    selections
        .into_iter()
        .zip(aps.scale_models())
        .map(|(selection, sm)| sm.shape().n_active_components(selection))
        .collect()
}

pub fn check_sampling(sampling: &ScaleParam<Sampling>, n_scales: usize) -> Result<Vec<Sampling>> {
    let sampling = check_multi_scale_param(sampling, n_scales, "sampling")?;
    if sampling.iter().any(|s| *s == Sampling::Step(0)) {
        return Err(Error::InvalidSampling(
            "sub-sampling step must be positive".to_string(),
        ));
    }
    Ok(sampling)
}

pub fn check_max_iters(max_iters: &ScaleParam<usize>, n_scales: usize) -> Result<Vec<usize>> {
    check_multi_scale_param(max_iters, n_scales, "max_iters")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_is_broadcast() {
        let values = check_multi_scale_param(&ScaleParam::Single(5), 3, "max_iters").unwrap();
        assert_eq!(values, vec![5, 5, 5]);
    }

    #[test]
    fn test_per_scale_length_must_match() {
        for len in [1, 2, 4] {
            let param = ScaleParam::PerScale(vec![Sampling::Full; len]);
            match check_sampling(&param, 3) {
                Err(Error::ScaleCount { name, expected, actual }) => {
                    assert_eq!(name, "sampling");
                    assert_eq!(expected, 3);
                    assert_eq!(actual, len);
                }
                other => panic!("unexpected result for length {}: {:?}", len, other),
            }
        }

        let param = ScaleParam::PerScale(vec![Sampling::Full, Sampling::Step(2), Sampling::Full]);
        assert_eq!(check_sampling(&param, 3).unwrap()[1], Sampling::Step(2));
    }

    #[test]
    fn test_zero_step_is_rejected() {
        assert!(check_sampling(&ScaleParam::Single(Sampling::Step(0)), 2).is_err());
    }

    #[test]
    fn test_scale_param_deserialise() {
        let single: ScaleParam<Sampling> = serde_json::from_str("[true, false, true]").unwrap();
        assert_eq!(single, ScaleParam::Single(Sampling::Mask(vec![true, false, true])));

        let per_scale: ScaleParam<Sampling> = serde_json::from_str("[4, null]").unwrap();
        assert_eq!(
            per_scale,
            ScaleParam::PerScale(vec![Sampling::Step(4), Sampling::Full])
        );

        let n_shape: ScaleParam<ShapeComponents> = serde_json::from_str("0.98").unwrap();
        assert_eq!(n_shape, ScaleParam::Single(ShapeComponents::Fraction(0.98)));
    }
}
