//! XGBoost JSON model types.
//!
//! Parses the JSON written by `Booster.save_model("model.json")` (XGBoost
//! >= 1.0). These are foreign types used only for parsing; see
//! [`XgbModel::to_model`](super::XgbModel::to_model) for conversion. Fields
//! the converter never reads are not modelled and serde skips them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

// =============================================================================
// Custom deserializers for XGBoost-specific formats
// =============================================================================

/// `base_score` has been written as a number, a string, a one-element array
/// and a bracketed string like `"[5E-1]"` across XGBoost releases.
fn deserialize_base_score<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let mut cur = Value::deserialize(deserializer)?;
    loop {
        cur = match cur {
            Value::Number(n) => {
                return n
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SerdeError::custom("invalid number"));
            }
            Value::String(s) => {
                let t = s.trim();
                if let Ok(f) = t.parse::<f32>() {
                    return Ok(f);
                }
                if let Some(inner) = t.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                    if let Ok(f) = inner.trim().parse::<f32>() {
                        return Ok(f);
                    }
                }
                match serde_json::from_str::<Vec<Value>>(t) {
                    Ok(arr) => first_element::<D::Error>(arr)?,
                    Err(_) => {
                        return Err(SerdeError::custom(format!(
                            "cannot parse base_score from string: {s}"
                        )))
                    }
                }
            }
            Value::Array(arr) => first_element::<D::Error>(arr)?,
            _ => {
                return Err(SerdeError::custom(
                    "base_score must be number, string, or array",
                ))
            }
        };
    }
}

fn first_element<E: serde::de::Error>(arr: Vec<Value>) -> Result<Value, E> {
    arr.into_iter()
        .next()
        .ok_or_else(|| E::custom("base_score is an empty array"))
}

fn default_base_score() -> f32 {
    0.5
}
fn default_one() -> i64 {
    1
}

// =============================================================================
// Tree / model level definitions
// =============================================================================

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct TreeParam {
    #[serde_as(as = "DisplayFromStr")]
    pub num_nodes: i64,
}

/// A single regression tree in XGBoost's SoA layout.
///
/// Leaves have `left_children == -1` and store their value in
/// `split_conditions`. `base_weights` is a training statistic that pruning
/// and adaptive objectives leave stale, so it is not read.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub tree_param: TreeParam,
    pub left_children: Vec<i32>,
    pub right_children: Vec<i32>,
    pub split_indices: Vec<i32>,
    pub split_conditions: Vec<f32>,
    pub default_left: Vec<i32>,
    /// `0` numeric, `1` categorical. Absent before XGBoost 1.3.
    #[serde(default)]
    pub split_type: Vec<i32>,
    #[serde(default)]
    pub categories_nodes: Vec<i32>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct GBTreeModelParam {
    #[serde_as(as = "DisplayFromStr")]
    pub num_trees: i64,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_one")]
    pub num_parallel_tree: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTrees {
    pub trees: Vec<Tree>,
    /// Output group of each tree.
    #[serde(default)]
    pub tree_info: Vec<i32>,
    pub gbtree_model_param: GBTreeModelParam,
}

impl ModelTrees {
    /// Number of trees in this model.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

// =============================================================================
// Gradient booster variants (gbtree | gblinear | dart)
// =============================================================================

/// gblinear weights, row-major `[num_feature + 1, num_groups]`; the last
/// row holds the biases.
#[derive(Debug, Clone, Deserialize)]
pub struct GbLinearModel {
    pub weights: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GBTreeDefinition {
    pub model: ModelTrees,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum GradientBooster {
    Gbtree {
        model: ModelTrees,
    },
    Gblinear {
        model: GbLinearModel,
    },
    Dart {
        gbtree: GBTreeDefinition,
        weight_drop: Vec<f32>,
    },
}

// =============================================================================
// Objective / learner-level definitions
// =============================================================================

/// Training objective. Only the name matters for inference: it decides the
/// output transform and how `base_score` maps to margin space.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Objective {
    pub name: String,
}

impl Objective {
    /// Objective name as it appears in XGBoost JSON.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct LearnerModelParam {
    #[serde(deserialize_with = "deserialize_base_score")]
    #[serde(default = "default_base_score")]
    pub base_score: f32,
    #[serde(rename = "num_class")]
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub n_class: i64,
    #[serde(rename = "num_feature")]
    #[serde_as(as = "DisplayFromStr")]
    pub n_features: i64,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_one")]
    pub num_target: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Learner {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub gradient_booster: GradientBooster,
    pub objective: Objective,
    pub learner_model_param: LearnerModelParam,
}

// =============================================================================
// Top-level XGBoost model
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct XgbModel {
    pub version: [u32; 3],
    pub learner: Learner,
}

// =============================================================================
// Tests
// =============================================================================
