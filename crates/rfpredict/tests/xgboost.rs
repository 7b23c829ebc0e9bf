//! XGBoost JSON import through the public loading API.

use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use ndarray::array;
use rfpredict::compat::xgboost::{GradientBooster, XgbModel};
use rfpredict::model::{Model, OutputTransform, Regressor, TaskKind};
use rfpredict::persist::ModelFormat;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test-cases/xgboost")
        .join(format!("{name}.model.json"))
}

fn load_xgb(name: &str) -> XgbModel {
    let file = std::fs::File::open(fixture(name)).expect("open test model");
    serde_json::from_reader(file).expect("parse test model")
}

#[test]
fn gbtree_detected_and_converted() {
    let model = Model::load(fixture("gbtree_regression")).expect("load");
    let forest = model.into_forest().expect("forest model");

    assert_eq!(forest.forest().n_trees(), 2);
    assert_eq!(forest.output_transform(), OutputTransform::Identity);
    assert_eq!(forest.meta().objective_name.as_deref(), Some("reg:squarederror"));
    assert_abs_diff_eq!(forest.forest().base_score(), 0.5);
}

#[test]
fn gbtree_matches_manual_traversal() {
    let model = Model::load(fixture("gbtree_regression")).expect("load");
    // 0.5 + tree0(x < 1.5 ? 0.25 : 0.75) + tree1(y < 0 ? -0.5 : 0.5)
    for (x, y, expected) in [(0.0, -3.0, 0.25), (2.0, 0.0, 1.75), (1.4, 3.0, 1.25)] {
        let pred = model.predict_row(array![x, y].view()).unwrap();
        assert_abs_diff_eq!(pred, expected, epsilon = 1e-7);
    }
}

#[test]
fn gblinear_binary_is_logistic() {
    let xgb = load_xgb("gblinear_binary");
    assert!(matches!(
        xgb.learner.gradient_booster,
        GradientBooster::Gblinear { .. }
    ));

    let model = xgb.to_model().expect("convert");
    assert_eq!(model.meta().task, TaskKind::BinaryClassification);
    let linear = model.into_linear().expect("linear model");
    assert_eq!(linear.output_transform(), OutputTransform::Sigmoid);
    assert_abs_diff_eq!(linear.linear().intercept(), 0.0, epsilon = 1e-7);
}

#[test]
fn forced_native_format_rejects_xgboost() {
    let err = Model::load_with_format(fixture("gbtree_regression"), ModelFormat::Native).unwrap_err();
    assert!(matches!(err, rfpredict::ReadError::Json(_)), "got {err:?}");
}
