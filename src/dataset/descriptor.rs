//! Serializable description of how tabular columns map onto the model input

use serde::{Deserialize, Serialize};

use crate::data::{AttributeKind, Schema};
use crate::error::{Result, TabRegError};

/// Marker used for missing values in encoded feature lists
pub const MISSING_MARKER: &str = "?";

/// Per-feature encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Featurizer {
    /// z-score normalisation
    Numeric { mean: f64, std: f64 },
    /// one-hot over a fixed label set
    Categorical { values: Vec<String> },
}

impl Featurizer {
    /// Fit a numeric featurizer, ignoring non-finite values
    pub fn fit_numeric(values: impl IntoIterator<Item = f64>) -> Self {
        let (mean, std) = mean_std(values);
        Featurizer::Numeric { mean, std }
    }

    /// Number of input columns this feature occupies
    pub fn width(&self) -> usize {
        match self {
            Featurizer::Numeric { .. } => 1,
            Featurizer::Categorical { values } => values.len(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Featurizer::Numeric { .. })
    }

    /// Append the encoding of `input` to `out`
    pub fn featurize(&self, name: &str, input: &str, out: &mut Vec<f64>) -> Result<()> {
        match self {
            Featurizer::Numeric { mean, std } => {
                if input == MISSING_MARKER {
                    // missing values sit at the mean
                    out.push(0.0);
                    return Ok(());
                }
                let value: f64 = input.trim().parse().map_err(|_| {
                    TabRegError::Encoding(format!(
                        "Feature '{}' expects a number, got '{}'",
                        name, input
                    ))
                })?;
                out.push((value - mean) / std);
            }
            Featurizer::Categorical { values } => {
                let start = out.len();
                out.extend(std::iter::repeat(0.0).take(values.len()));
                if let Some(pos) = values.iter().position(|v| v == input) {
                    out[start + pos] = 1.0;
                }
            }
        }
        Ok(())
    }

    /// Whether an attribute of `kind` can feed this featurizer
    pub fn accepts(&self, kind: &AttributeKind) -> bool {
        match self {
            Featurizer::Numeric { .. } => kind.is_numeric(),
            Featurizer::Categorical { .. } => kind.is_symbolic(),
        }
    }
}

/// A selected feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub featurizer: Featurizer,
}

/// The numeric label and its normalisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

impl LabelSpec {
    pub fn encode(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    pub fn decode(&self, value: f64) -> f64 {
        value * self.std + self.mean
    }
}

/// Mini-batch parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sampling {
    pub batch_size: usize,
    pub shuffle: bool,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
        }
    }
}

/// Everything needed to rebuild a dataset adapter from a schema alone.
///
/// `features` is ordered: the same order defines the network input layout
/// and the encoding of prediction-time records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationDescriptor {
    pub version: u32,
    pub features: Vec<FeatureSpec>,
    pub label: LabelSpec,
    pub sampling: Sampling,
}

impl AdaptationDescriptor {
    pub const VERSION: u32 = 1;

    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Width of the encoded input vector
    pub fn feature_size(&self) -> usize {
        self.features.iter().map(|f| f.featurizer.width()).sum()
    }

    /// Regression always has a single output
    pub fn label_size(&self) -> usize {
        1
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(json)
            .map_err(|e| TabRegError::Reconstruction(format!("Invalid descriptor: {}", e)))?;
        if descriptor.version != Self::VERSION {
            return Err(TabRegError::Reconstruction(format!(
                "Unsupported descriptor version {} (expected {})",
                descriptor.version,
                Self::VERSION
            )));
        }
        Ok(descriptor)
    }

    /// Match every recorded feature against `schema` by name and type
    pub fn check_schema(&self, schema: &Schema) -> Result<()> {
        for feature in &self.features {
            let attribute = schema.attribute_by_name(&feature.name).ok_or_else(|| {
                TabRegError::Reconstruction(format!(
                    "Feature '{}' not present in schema '{}'",
                    feature.name, schema.relation
                ))
            })?;
            if !feature.featurizer.accepts(&attribute.kind) {
                return Err(TabRegError::Reconstruction(format!(
                    "Feature '{}' was trained as {} but schema declares {}",
                    feature.name,
                    if feature.featurizer.is_numeric() { "numeric" } else { "categorical" },
                    attribute.kind
                )));
            }
        }
        Ok(())
    }
}

/// Mean and standard deviation of the finite values; std falls back to 1
pub(crate) fn mean_std(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    (mean, if std > 1e-12 { std } else { 1.0 })
}
