//! Mapping between records, ordered feature lists and engine vectors

use ndarray::Array1;

use super::descriptor::{AdaptationDescriptor, FeatureSpec, LabelSpec, MISSING_MARKER};
use crate::data::{Record, Value};
use crate::error::{Result, TabRegError};

/// Ordered feature values in string form, one per selected feature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFeatures(Vec<String>);

impl ListFeatures {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.0.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Encode `record` in the descriptor's feature order.
    ///
    /// Features are resolved by name in the record's own schema, so a record
    /// whose columns are ordered differently from the training data still
    /// lines up. An absent feature, or one whose type no longer matches the
    /// trained featurizer, is an encoding error.
    pub fn from_record(record: &Record<'_>, descriptor: &AdaptationDescriptor) -> Result<Self> {
        let mut list = ListFeatures(Vec::with_capacity(descriptor.features.len()));
        for feature in &descriptor.features {
            let (attribute, value) = record.value_by_name(&feature.name).ok_or_else(|| {
                TabRegError::Encoding(format!(
                    "Feature '{}' not present in record schema '{}'",
                    feature.name,
                    record.schema().relation
                ))
            })?;
            if !feature.featurizer.accepts(&attribute.kind) {
                return Err(TabRegError::Encoding(format!(
                    "Feature '{}' has type {} in record schema, incompatible with trained encoding",
                    feature.name, attribute.kind
                )));
            }
            list.0.push(match value {
                Value::Numeric(v) => v.to_string(),
                Value::Symbolic(s) => s.clone(),
                Value::Missing => MISSING_MARKER.to_string(),
            });
        }
        Ok(list)
    }
}

impl From<Vec<String>> for ListFeatures {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

/// Turns [`ListFeatures`] into engine input and engine output into labels
#[derive(Debug, Clone)]
pub struct FeatureTranslator {
    features: Vec<FeatureSpec>,
    label: LabelSpec,
    input_size: usize,
}

impl FeatureTranslator {
    pub fn new(descriptor: &AdaptationDescriptor) -> Self {
        Self {
            features: descriptor.features.clone(),
            label: descriptor.label.clone(),
            input_size: descriptor.feature_size(),
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn process_input(&self, input: &ListFeatures) -> Result<Array1<f64>> {
        if input.len() != self.features.len() {
            return Err(TabRegError::Encoding(format!(
                "Expected {} feature values, got {}",
                self.features.len(),
                input.len()
            )));
        }
        let mut out = Vec::with_capacity(self.input_size);
        for (spec, value) in self.features.iter().zip(input.as_slice()) {
            spec.featurizer.featurize(&spec.name, value, &mut out)?;
        }
        Ok(Array1::from(out))
    }

    pub fn process_output(&self, output: f64) -> f64 {
        self.label.decode(output)
    }

    pub fn encode_label(&self, label: f64) -> f64 {
        self.label.encode(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Attribute, Schema};
    use crate::dataset::descriptor::{Featurizer, Sampling};

    fn descriptor() -> AdaptationDescriptor {
        AdaptationDescriptor {
            version: AdaptationDescriptor::VERSION,
            features: vec![
                FeatureSpec {
                    name: "b".into(),
                    featurizer: Featurizer::Numeric { mean: 0.0, std: 2.0 },
                },
                FeatureSpec {
                    name: "a".into(),
                    featurizer: Featurizer::Numeric { mean: 1.0, std: 1.0 },
                },
            ],
            label: LabelSpec { name: "y".into(), mean: 10.0, std: 5.0 },
            sampling: Sampling::default(),
        }
    }

    #[test]
    fn test_from_record_uses_descriptor_order() {
        let schema = Schema::new(
            "r",
            vec![Attribute::numeric("a"), Attribute::numeric("b"), Attribute::numeric("y")],
        );
        let values = vec![Value::Numeric(3.0), Value::Numeric(4.0), Value::Missing];
        let record = Record::new(&schema, &values).unwrap();

        let list = ListFeatures::from_record(&record, &descriptor()).unwrap();
        assert_eq!(list.as_slice(), &["4".to_string(), "3".to_string()]);

        let translator = FeatureTranslator::new(&descriptor());
        let input = translator.process_input(&list).unwrap();
        assert_eq!(input.to_vec(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_missing_feature_is_encoding_error() {
        let schema = Schema::new("r", vec![Attribute::numeric("a")]);
        let values = vec![Value::Numeric(1.0)];
        let record = Record::new(&schema, &values).unwrap();
        let err = ListFeatures::from_record(&record, &descriptor()).unwrap_err();
        assert!(matches!(err, TabRegError::Encoding(_)));
    }

    #[test]
    fn test_type_mismatch_is_encoding_error() {
        let schema = Schema::new(
            "r",
            vec![Attribute::numeric("a"), Attribute::nominal("b", vec!["x".into()])],
        );
        let values = vec![Value::Numeric(1.0), Value::Symbolic("x".into())];
        let record = Record::new(&schema, &values).unwrap();
        assert!(ListFeatures::from_record(&record, &descriptor()).is_err());
    }

    #[test]
    fn test_label_mapping() {
        let translator = FeatureTranslator::new(&descriptor());
        assert_eq!(translator.encode_label(20.0), 2.0);
        assert_eq!(translator.process_output(2.0), 20.0);
    }
}
