use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

/// A prediction fixture: one model file and the requests run against it.
///
/// Expects JSON format:
/// ```json
/// {
///   "model": "random_forest.model.json",
///   "cases": [
///     {"name": "both_left", "parameters": {"x": 1, "y": 2}, "expected": 5.5},
///     {"name": "no_y", "parameters": {"x": 1}, "error": "Missing parameter: y"}
///   ]
/// }
/// ```
///
/// `model` is relative to the fixture file.
#[derive(Debug, Deserialize)]
pub struct CaseFile {
    pub model: String,
    pub cases: Vec<PredictionCase>,
}

/// One request and its expected outcome.
#[derive(Debug, Deserialize)]
pub struct PredictionCase {
    pub name: String,
    /// Raw parameters object, exactly as a caller would pass it.
    pub parameters: Value,
    /// Expected prediction, for successful cases.
    #[serde(default)]
    pub expected: Option<f64>,
    /// Expected error message, for failing cases.
    #[serde(default)]
    pub error: Option<String>,
}

impl CaseFile {
    /// Load a fixture from disk.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(std::io::Error::from)
    }
}
