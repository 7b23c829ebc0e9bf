//! Request parameters.
//!
//! A [`ParameterSet`] is the caller's name → value mapping for a single
//! prediction, parsed from one JSON object. [`ParameterSet::assemble`] turns
//! it into the feature row a model expects.

use ndarray::Array1;
use serde_json::{Map, Value};

use crate::error::{PredictError, Result};

/// Named input values for one prediction request.
///
/// Keys the model does not declare are ignored. When the JSON repeats a key,
/// the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: Map<String, Value>,
}

impl ParameterSet {
    /// Parse a JSON object.
    ///
    /// Anything other than an object (arrays, scalars, invalid JSON) is a
    /// [`PredictError::ParameterParse`].
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| PredictError::ParameterParse(e.to_string()))?;
        Self::from_value(value)
    }

    /// Build from an already-parsed JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(PredictError::ParameterParse(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Raw value of a parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Numeric value of a parameter.
    pub fn value_f64(&self, name: &str) -> Result<f64> {
        let value = self
            .get(name)
            .ok_or_else(|| PredictError::MissingParameter(name.to_string()))?;
        coerce_f64(name, value)
    }

    /// Build the feature row for `feature_names`, in that order.
    ///
    /// Names are processed in order and the first one that is absent or not
    /// numeric aborts assembly; no partial row is returned.
    pub fn assemble(&self, feature_names: &[String]) -> Result<Array1<f64>> {
        let row = feature_names
            .iter()
            .map(|name| self.value_f64(name))
            .collect::<Result<Vec<f64>>>()?;

        tracing::debug!(n_features = row.len(), ?row, "assembled feature row");
        Ok(Array1::from(row))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Coerce a JSON value to `f64`.
///
/// Numbers pass through, booleans map to `1.0`/`0.0` and strings are parsed
/// as floats after trimming whitespace. `null`, arrays and objects are
/// rejected.
pub fn coerce_f64(name: &str, value: &Value) -> Result<f64> {
    let invalid = |reason: String| PredictError::InvalidParameter {
        name: name.to_string(),
        reason,
    };

    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(format!("number {n} is not representable as f64"))),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => parse_float(s)
            .ok_or_else(|| invalid(format!("could not convert string to float: {s:?}"))),
        other => Err(invalid(format!(
            "expected a number or numeric string, got {}",
            json_type_name(other)
        ))),
    }
}

/// Parse a float the way a lenient numeric reader would: surrounding
/// whitespace is ignored, `inf`/`nan` are accepted in any case, and single
/// underscores may separate digits (`1_000.5`).
fn parse_float(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }

    if !t.contains('_') {
        return t.parse().ok();
    }

    let bytes = t.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let before = i.checked_sub(1).map(|j| bytes[j]);
            let after = bytes.get(i + 1).copied();
            let between_digits = matches!(before, Some(c) if c.is_ascii_digit())
                && matches!(after, Some(c) if c.is_ascii_digit());
            if !between_digits {
                return None;
            }
        }
    }

    t.replace('_', "").parse().ok()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_rejects_non_objects() {
        for input in ["not json", "[1, 2]", "3.5", "\"x\"", "null", ""] {
            let err = ParameterSet::parse(input).unwrap_err();
            assert!(matches!(err, PredictError::ParameterParse(_)), "{input}: {err:?}");
        }
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let params = ParameterSet::parse(r#"{"x": 1, "x": 2}"#).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.value_f64("x").unwrap(), 2.0);
    }

    #[test]
    fn assemble_follows_declared_order() {
        let params = ParameterSet::parse(r#"{"c": 3, "a": 1, "b": 2}"#).unwrap();
        let row = params.assemble(&names(&["a", "b", "c"])).unwrap();
        assert_eq!(row.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn assemble_ignores_extra_keys() {
        let params = ParameterSet::parse(r#"{"x": 1, "unused": "abc"}"#).unwrap();
        let row = params.assemble(&names(&["x"])).unwrap();
        assert_eq!(row.to_vec(), vec![1.0]);
    }

    #[test]
    fn assemble_reports_first_missing() {
        let params = ParameterSet::parse(r#"{"b": 1}"#).unwrap();
        let err = params.assemble(&names(&["a", "b", "c"])).unwrap_err();
        assert!(matches!(err, PredictError::MissingParameter(ref n) if n == "a"));
    }

    #[test]
    fn assemble_stops_at_first_failure_in_order() {
        let params = ParameterSet::parse(r#"{"a": "oops"}"#).unwrap();
        let err = params.assemble(&names(&["a", "b"])).unwrap_err();
        assert!(matches!(err, PredictError::InvalidParameter { ref name, .. } if name == "a"));
    }

    #[test]
    fn assemble_with_no_features_is_empty() {
        let params = ParameterSet::default();
        assert!(params.assemble(&[]).unwrap().is_empty());
    }

    #[test]
    fn numeric_strings_coerce() {
        let params = ParameterSet::parse(r#"{"x": "2.5", "y": "4"}"#).unwrap();
        let row = params.assemble(&names(&["x", "y"])).unwrap();
        assert_eq!(row.to_vec(), vec![2.5, 4.0]);
    }

    #[test]
    fn coerce_scalars() {
        assert_eq!(coerce_f64("x", &json!(3)).unwrap(), 3.0);
        assert_eq!(coerce_f64("x", &json!(-1.25)).unwrap(), -1.25);
        assert_eq!(coerce_f64("x", &json!(true)).unwrap(), 1.0);
        assert_eq!(coerce_f64("x", &json!(false)).unwrap(), 0.0);
    }

    #[test]
    fn coerce_strings() {
        assert_eq!(coerce_f64("x", &json!("  7 ")).unwrap(), 7.0);
        assert_eq!(coerce_f64("x", &json!("1e3")).unwrap(), 1000.0);
        assert_eq!(coerce_f64("x", &json!("1_000.5")).unwrap(), 1000.5);
        assert_eq!(coerce_f64("x", &json!("-inf")).unwrap(), f64::NEG_INFINITY);
        assert_eq!(coerce_f64("x", &json!("Infinity")).unwrap(), f64::INFINITY);
        assert!(coerce_f64("x", &json!("nan")).unwrap().is_nan());
    }

    #[test]
    fn coerce_rejects_malformed_strings() {
        for s in ["", "abc", "1__0", "_1", "1_", "1._5", "1,5"] {
            let err = coerce_f64("x", &json!(s)).unwrap_err();
            assert!(matches!(err, PredictError::InvalidParameter { .. }), "{s:?}");
        }
    }

    #[test]
    fn coerce_rejects_null_and_containers() {
        for value in [json!(null), json!([1.0]), json!({"v": 1.0})] {
            let err = coerce_f64("x", &value).unwrap_err();
            assert!(
                err.to_string().starts_with("Invalid value for parameter x:"),
                "{err}"
            );
        }
    }

    #[test]
    fn from_iterator() {
        let params: ParameterSet = [("a", json!(1)), ("b", json!("2"))].into_iter().collect();
        assert!(params.contains("a"));
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(params.value_f64("b").unwrap(), 2.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// Unique feature names, one integer value per name, and a key order
        /// for writing the parameters object.
        fn features_with_key_order() -> impl Strategy<Value = (Vec<String>, Vec<i64>, Vec<usize>)> {
            prop::collection::btree_set("[a-z][a-z0-9_]{0,7}", 1..12).prop_flat_map(|names| {
                let n = names.len();
                (
                    Just(names.into_iter().collect::<Vec<_>>()),
                    prop::collection::vec(-1_000_000_i64..1_000_000, n),
                    Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
                )
            })
        }

        fn object_text(entries: impl Iterator<Item = (String, i64)>) -> String {
            let body: Vec<String> = entries.map(|(k, v)| format!("{k:?}: {v}")).collect();
            format!("{{{}}}", body.join(", "))
        }

        proptest! {
            /// The row follows the declared order whatever order the keys arrive in.
            #[test]
            fn prop_assembly_follows_declared_order(
                (names, values, order) in features_with_key_order()
            ) {
                let json = object_text(order.iter().map(|&i| (names[i].clone(), values[i])));
                let params = ParameterSet::parse(&json).unwrap();
                let row = params.assemble(&names).unwrap();

                prop_assert_eq!(row.len(), names.len());
                for (i, &expected) in values.iter().enumerate() {
                    prop_assert_eq!(row[i], expected as f64);
                }
            }

            /// Dropping any non-empty subset reports the first dropped name in declared order.
            #[test]
            fn prop_first_missing_feature_reported(
                (names, dropped) in prop::collection::btree_set("[a-z][a-z0-9_]{0,7}", 1..12)
                    .prop_flat_map(|names| {
                        let n = names.len();
                        (
                            Just(names.into_iter().collect::<Vec<_>>()),
                            prop::collection::vec(any::<bool>(), n),
                        )
                    })
            ) {
                prop_assume!(dropped.iter().any(|&d| d));

                let kept = names
                    .iter()
                    .zip(&dropped)
                    .filter(|(_, d)| !**d)
                    .enumerate()
                    .map(|(i, (name, _))| (name.clone(), i as i64));
                let params = ParameterSet::parse(&object_text(kept)).unwrap();

                let first_dropped = names
                    .iter()
                    .zip(&dropped)
                    .find(|(_, d)| **d)
                    .map(|(name, _)| name.clone())
                    .unwrap();
                let err = params.assemble(&names).unwrap_err();
                prop_assert!(
                    matches!(err, PredictError::MissingParameter(ref name) if *name == first_dropped),
                    "expected missing {}, got {:?}",
                    first_dropped,
                    err
                );
            }
        }
    }
}
