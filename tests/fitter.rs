mod common;

use std::cell::Cell;
use std::sync::Arc;

use rustaps::{
    parse_config, AlgorithmResult, BoundingBox, Error, FitterConfig, Forward, GaussNewtonAlgorithm,
    GaussNewtonApsFitter, GaussNewtonInterface, Image, MultiScaleFitter, PdmKind, PointCloud, Result, Sampling,
    ScaleParam, ShapeComponents, Transform2,
};

use crate::common::{init_logging, shared_aps, true_shape};

fn expect_err(result: Result<GaussNewtonApsFitter>) -> Error {
    match result {
        Ok(_) => panic!("fitter construction should have failed"),
        Err(error) => error,
    }
}

#[test]
fn test_one_algorithm_per_scale() {
    init_logging();
    let aps = shared_aps(&[0.25, 0.5, 1.0], false);
    let fitter = GaussNewtonApsFitter::new(Arc::clone(&aps), &FitterConfig::default()).unwrap();

    assert_eq!(fitter.algorithms().len(), 3);
    assert_eq!(fitter.n_scales(), 3);
    assert!(Arc::ptr_eq(fitter.aps(), &aps));
    assert_eq!(fitter.max_iters(), &[20, 20, 20]);
    for algorithm in fitter.algorithms() {
        assert_eq!(algorithm.name(), "inverse");
    }
}

#[test]
fn test_sampling_list_must_match_scale_count() {
    init_logging();
    let aps = shared_aps(&[0.25, 0.5, 1.0], false);

    for len in [2, 4] {
        let config = FitterConfig {
            sampling: ScaleParam::PerScale(vec![Sampling::Full; len]),
            ..FitterConfig::default()
        };
        match expect_err(GaussNewtonApsFitter::new(Arc::clone(&aps), &config)) {
            Error::ScaleCount {
                name,
                expected,
                actual,
            } => {
                assert_eq!(name, "sampling");
                assert_eq!(expected, 3);
                assert_eq!(actual, len);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    let sampling = vec![Sampling::Step(2), Sampling::Full, Sampling::Step(3)];
    let config = FitterConfig {
        sampling: ScaleParam::PerScale(sampling.clone()),
        ..FitterConfig::default()
    };
    let fitter = GaussNewtonApsFitter::new(aps, &config).unwrap();
    assert_eq!(fitter.sampling(), &sampling[..]);
    for (algorithm, expected) in fitter.algorithms().iter().zip(&sampling) {
        assert_eq!(algorithm.interface().sampling(), expected);
    }
    // 9x9 patches, step 2 keeps 5x5 pixels of each of the 5 landmarks
    assert_eq!(fitter.algorithms()[0].interface().n_sampled(), 5 * 25);
    assert_eq!(fitter.algorithms()[1].interface().n_sampled(), 5 * 81);
}

#[test]
fn test_zero_sampling_step_is_rejected() {
    let aps = shared_aps(&[1.0], false);
    let config = FitterConfig {
        sampling: ScaleParam::Single(Sampling::Step(0)),
        ..FitterConfig::default()
    };
    match expect_err(GaussNewtonApsFitter::new(aps, &config)) {
        Error::InvalidSampling(_) => {}
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_pdm_kind_follows_procrustes_flag() {
    init_logging();
    let plain = GaussNewtonApsFitter::new(shared_aps(&[0.5, 1.0], false), &FitterConfig::default()).unwrap();
    for algorithm in plain.algorithms() {
        let pdm = algorithm.interface().pdm();
        assert_eq!(pdm.kind(), PdmKind::Plain);
        assert_eq!(pdm.n_global_parameters(), 0);
        assert_eq!(pdm.n_parameters(), 3);
    }

    let ortho = GaussNewtonApsFitter::new(shared_aps(&[0.5, 1.0], true), &FitterConfig::default()).unwrap();
    for algorithm in ortho.algorithms() {
        let pdm = algorithm.interface().pdm();
        assert_eq!(pdm.kind(), PdmKind::ProcrustesNormalized);
        assert_eq!(pdm.n_global_parameters(), 4);
        // both translation components are spanned by the similarity basis
        assert_eq!(pdm.n_parameters(), 5);
    }
}

#[test]
fn test_n_shape_selection_leaves_model_untouched() {
    init_logging();
    let aps = shared_aps(&[0.5, 1.0], false);

    let config = FitterConfig {
        n_shape: ScaleParam::PerScale(vec![ShapeComponents::Count(2), ShapeComponents::Fraction(0.5)]),
        ..FitterConfig::default()
    };
    let fitter = GaussNewtonApsFitter::new(Arc::clone(&aps), &config).unwrap();
    assert_eq!(fitter.n_active_shape(), &[2, 1]);
    for (algorithm, expected) in fitter.algorithms().iter().zip([2, 1]) {
        assert_eq!(algorithm.interface().pdm().n_active_components(), expected);
        assert_eq!(algorithm.interface().pdm().n_parameters(), expected);
    }
    for sm in aps.scale_models() {
        assert_eq!(sm.shape().n_components(), 3);
    }

    let all = GaussNewtonApsFitter::new(Arc::clone(&aps), &FitterConfig::default()).unwrap();
    assert_eq!(all.n_active_shape(), &[3, 3]);

    let config = FitterConfig {
        n_shape: ScaleParam::Single(ShapeComponents::Count(4)),
        ..FitterConfig::default()
    };
    match expect_err(GaussNewtonApsFitter::new(aps, &config)) {
        Error::InvalidShapeComponents(_) => {}
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_max_iters_list_must_match_scale_count() {
    let aps = shared_aps(&[0.5, 1.0], false);
    let config = parse_config(r#"{"max_iters": [5, 5, 5]}"#).unwrap();
    match expect_err(GaussNewtonApsFitter::new(aps, &config)) {
        Error::ScaleCount { name, .. } => assert_eq!(name, "max_iters"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_fit_from_true_shape_stays_put() {
    init_logging();
    let fitter = GaussNewtonApsFitter::new(shared_aps(&[0.5, 1.0], false), &FitterConfig::default()).unwrap();
    let image = common::blob_image();
    let gt = true_shape();

    let result = fitter.fit_from_shape(&image, &gt, Some(&gt)).unwrap();

    assert_eq!(result.n_scales(), 2);
    assert_eq!(result.n_iters(), 2);
    assert!(result.final_error().unwrap() < 1e-9);
    assert!(result.costs().iter().all(|c| c.abs() < 1e-12));
    assert_eq!(result.initial_shape(), gt);
}

#[test]
fn test_zero_iterations_returns_reconstruction() {
    init_logging();
    let config = FitterConfig {
        max_iters: ScaleParam::Single(0),
        ..FitterConfig::default()
    };
    let fitter = GaussNewtonApsFitter::new(shared_aps(&[0.5, 1.0], false), &config).unwrap();
    let initial = Transform2::translation(1.0, 0.0).apply(&true_shape());

    let result = fitter.fit_from_shape(&common::blob_image(), &initial, None).unwrap();

    assert_eq!(result.n_iters(), 0);
    assert_eq!(result.costs().len(), 2);
    // the initial shape plus one reconstruction per scale
    assert_eq!(result.shapes().len(), 3);
    assert!(result.final_error().is_none());
}

#[test]
fn test_inverse_fit_reduces_error() {
    init_logging();
    let fitter = GaussNewtonApsFitter::new(shared_aps(&[1.0], true), &FitterConfig::default()).unwrap();
    let gt = true_shape();
    let initial = Transform2::translation(1.0, 0.5).apply(&gt);

    let result = fitter
        .fit_from_shape(&common::blob_image(), &initial, Some(&gt))
        .unwrap();

    let initial_error = result.initial_error().unwrap();
    let final_error = result.final_error().unwrap();
    assert!(
        final_error < 0.25 * initial_error,
        "error went from {} to {}",
        initial_error,
        final_error
    );
}

#[test]
fn test_fit_without_deformation_cost_reduces_error() {
    init_logging();
    let config = parse_config(r#"{"use_deformation_cost": false}"#).unwrap();
    let fitter = GaussNewtonApsFitter::new(shared_aps(&[1.0], false), &config).unwrap();
    assert!(!fitter.algorithms()[0].interface().use_deformation_cost());

    let gt = true_shape();
    let initial = Transform2::translation(1.0, 0.5).apply(&gt);
    let result = fitter
        .fit_from_shape(&common::blob_image(), &initial, Some(&gt))
        .unwrap();

    let initial_error = result.initial_error().unwrap();
    let final_error = result.final_error().unwrap();
    assert!(
        final_error < 0.25 * initial_error,
        "error went from {} to {}",
        initial_error,
        final_error
    );
}

#[test]
fn test_forward_fit_reduces_error() {
    init_logging();
    let config = parse_config(r#"{"algorithm": "forward"}"#).unwrap();
    let fitter = GaussNewtonApsFitter::new(shared_aps(&[1.0], false), &config).unwrap();
    assert_eq!(fitter.algorithms()[0].name(), "forward");

    let gt = true_shape();
    let initial = Transform2::translation(-0.5, 1.0).apply(&gt);
    let result = fitter
        .fit_from_shape(&common::blob_image(), &initial, Some(&gt))
        .unwrap();

    let initial_error = result.initial_error().unwrap();
    let final_error = result.final_error().unwrap();
    assert!(
        final_error < 0.25 * initial_error,
        "error went from {} to {}",
        initial_error,
        final_error
    );
}

#[test]
fn test_fit_from_bounding_box() {
    init_logging();
    let fitter = GaussNewtonApsFitter::new(shared_aps(&[0.5, 1.0], true), &FitterConfig::default()).unwrap();
    let gt = true_shape();
    let bbox = BoundingBox::of(&gt);

    let result = fitter.fit_from_bb(&common::blob_image(), &bbox, Some(&gt)).unwrap();

    assert!(result.final_error().unwrap() < 1e-3);
    assert_eq!(result.final_shape().n_points(), gt.n_points());
}

#[test]
fn test_custom_algorithm_builder() {
    init_logging();
    let calls = Cell::new(0);
    let builder = |interface: GaussNewtonInterface| {
        calls.set(calls.get() + 1);
        Box::new(Forward::new(interface)) as Box<dyn GaussNewtonAlgorithm>
    };

    let fitter = GaussNewtonApsFitter::with_algorithm(
        shared_aps(&[0.25, 0.5, 1.0], false),
        &FitterConfig::default(),
        &builder,
    )
    .unwrap();

    assert_eq!(calls.get(), 3);
    for algorithm in fitter.algorithms() {
        assert_eq!(algorithm.name(), "forward");
    }
}

struct Stalled {
    interface: GaussNewtonInterface,
}

impl GaussNewtonAlgorithm for Stalled {
    fn name(&self) -> &'static str {
        "stalled"
    }

    fn interface(&self) -> &GaussNewtonInterface {
        &self.interface
    }

    fn run(
        &self,
        _image: &Image,
        initial_shape: &PointCloud,
        gt_shape: Option<&PointCloud>,
        _max_iters: usize,
        _eps: f64,
    ) -> Result<AlgorithmResult> {
        AlgorithmResult::new(Vec::new(), Vec::new(), Vec::new(), initial_shape.clone(), gt_shape.cloned())
    }
}

#[test]
fn test_algorithm_without_shapes_fails_the_fit() {
    init_logging();
    let builder = |interface: GaussNewtonInterface| Box::new(Stalled { interface }) as Box<dyn GaussNewtonAlgorithm>;
    let fitter =
        GaussNewtonApsFitter::with_algorithm(shared_aps(&[0.5, 1.0], false), &FitterConfig::default(), &builder)
            .unwrap();

    let outcome = fitter.fit_from_shape(&common::blob_image(), &true_shape(), None);
    assert!(matches!(outcome, Err(Error::EmptyResult)));
}

#[test]
fn test_degenerate_bounding_box_is_rejected() {
    init_logging();
    let fitter = GaussNewtonApsFitter::new(shared_aps(&[0.5, 1.0], true), &FitterConfig::default()).unwrap();
    let bbox = BoundingBox::new(10.0, 10.0, 1e-9, 1e-9);

    let outcome = fitter.fit_from_bb(&common::blob_image(), &bbox, None);
    assert!(matches!(outcome, Err(Error::InvalidInitialShape(_))));
}
