//! Test helpers shared by unit tests, integration tests and doc examples.
//!
//! - [`scalar_tree!`](crate::scalar_tree) builds a [`Tree`] from a readable
//!   node listing
//! - [`TreeBuilder`] is the imperative form behind the macro
//! - [`cases`] loads expected-prediction fixtures
//! - [`sample_forest_document`] / [`sample_linear_document`] are small valid
//!   native model documents

pub mod cases;

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde_json::{json, Value};

use crate::repr::gbdt::{NodeId, Tree};

/// Build a [`Tree`] node by node.
///
/// ```
/// let tree = rfpredict::scalar_tree! {
///     0 => num(0, 0.5, L) -> 1, 2,
///     1 => leaf(1.0),
///     2 => leaf(2.0),
/// };
/// assert_eq!(tree.n_nodes(), 3);
/// ```
///
/// `num(feature, threshold, L|R)` is a numeric split whose missing values go
/// left (`L`) or right (`R`); `leaf(value)` is a leaf. Node ids must cover
/// `0..n` without gaps.
#[macro_export]
macro_rules! scalar_tree {
    (@node $b:ident, $node:literal, num($feat:expr, $thr:expr, L), $l:literal, $r:literal) => {
        $b.split($node, $feat, $thr, true, $l, $r);
    };
    (@node $b:ident, $node:literal, num($feat:expr, $thr:expr, R), $l:literal, $r:literal) => {
        $b.split($node, $feat, $thr, false, $l, $r);
    };
    (@node $b:ident, $node:literal, leaf($v:expr)) => {
        $b.leaf($node, $v);
    };
    ($($node:literal => $kind:ident ( $($args:tt)* ) $(-> $l:literal, $r:literal)?),* $(,)?) => {{
        let mut builder = $crate::testing::TreeBuilder::new();
        $( $crate::scalar_tree!(@node builder, $node, $kind ( $($args)* ) $(, $l, $r)?); )*
        builder.build()
    }};
}

#[derive(Debug, Clone, Copy)]
enum NodeSpec {
    Split {
        feature: u32,
        threshold: f64,
        default_left: bool,
        left: NodeId,
        right: NodeId,
    },
    Leaf(f64),
}

/// Imperative tree construction, keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    nodes: BTreeMap<NodeId, NodeSpec>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numeric split on `feature` at `threshold`.
    pub fn split(
        &mut self,
        node: NodeId,
        feature: u32,
        threshold: f64,
        default_left: bool,
        left: NodeId,
        right: NodeId,
    ) -> &mut Self {
        self.nodes.insert(
            node,
            NodeSpec::Split {
                feature,
                threshold,
                default_left,
                left,
                right,
            },
        );
        self
    }

    pub fn leaf(&mut self, node: NodeId, value: f64) -> &mut Self {
        self.nodes.insert(node, NodeSpec::Leaf(value));
        self
    }

    /// Freeze into a [`Tree`].
    ///
    /// # Panics
    ///
    /// If node ids are not exactly `0..n`.
    pub fn build(&self) -> Tree {
        let n = self.nodes.len();
        assert!(
            self.nodes.keys().enumerate().all(|(i, &id)| i == id as usize),
            "node ids must be contiguous from 0"
        );

        let mut split_indices = vec![0u32; n];
        let mut thresholds = vec![0.0f64; n];
        let mut left_children = vec![0u32; n];
        let mut right_children = vec![0u32; n];
        let mut default_left = vec![false; n];
        let mut is_leaf = vec![false; n];
        let mut leaf_values = vec![0.0f64; n];

        for (&id, spec) in &self.nodes {
            let i = id as usize;
            match *spec {
                NodeSpec::Split {
                    feature,
                    threshold,
                    default_left: dl,
                    left,
                    right,
                } => {
                    split_indices[i] = feature;
                    thresholds[i] = threshold;
                    left_children[i] = left;
                    right_children[i] = right;
                    default_left[i] = dl;
                }
                NodeSpec::Leaf(value) => {
                    is_leaf[i] = true;
                    leaf_values[i] = value;
                }
            }
        }

        Tree::new(
            split_indices,
            thresholds,
            left_children,
            right_children,
            default_left,
            is_leaf,
            leaf_values,
        )
    }
}

/// Native random-forest document over features `["x", "y"]`.
///
/// Two trees averaged with `<=` splits:
/// - tree 0 splits `x <= 2.5` into leaves `1.0` / `3.0`
/// - tree 1 splits `y <= 4.0` into leaves `10.0` / `20.0`
pub fn sample_forest_document() -> Value {
    json!({
        "format_version": 1,
        "model_type": "forest",
        "model": {
            "meta": {
                "task": "regression",
                "num_features": 2,
                "feature_names": ["x", "y"],
                "objective_name": "squared_error"
            },
            "forest": {
                "aggregation": "mean",
                "decision_type": "less_or_equal",
                "base_score": 0.0,
                "trees": [
                    {
                        "num_nodes": 3,
                        "split_indices": [0, 0, 0],
                        "thresholds": [2.5, 0.0, 0.0],
                        "children_left": [1, 0, 0],
                        "children_right": [2, 0, 0],
                        "default_left": [true, false, false],
                        "leaf_values": [0.0, 1.0, 3.0]
                    },
                    {
                        "num_nodes": 3,
                        "split_indices": [1, 0, 0],
                        "thresholds": [4.0, 0.0, 0.0],
                        "children_left": [1, 0, 0],
                        "children_right": [2, 0, 0],
                        "default_left": [false, false, false],
                        "leaf_values": [0.0, 10.0, 20.0]
                    }
                ]
            }
        }
    })
}

/// Native linear document: `0.5 + 2·x - y`.
pub fn sample_linear_document() -> Value {
    json!({
        "format_version": 1,
        "model_type": "linear",
        "model": {
            "meta": {"num_features": 2, "feature_names": ["x", "y"]},
            "weights": {"coefficients": [2.0, -1.0], "intercept": 0.5},
            "output_transform": "identity"
        }
    })
}

/// Write a JSON document to `path`.
pub fn write_json(path: impl AsRef<Path>, value: &Value) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, bytes)
}
