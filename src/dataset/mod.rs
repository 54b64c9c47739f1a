//! Dataset adaptation
//!
//! Turns [`Instances`] into the dense representation the engine trains on:
//! - feature selection in a fixed order
//! - numeric normalisation and one-hot encoding of symbolic columns
//! - mini-batch sampling parameters
//! - reproducible train/validation splits
//!
//! The adaptation is captured in an [`AdaptationDescriptor`] so it can be
//! rebuilt at prediction time from a zero-row header.

mod descriptor;
mod translator;

pub use descriptor::{
    AdaptationDescriptor, FeatureSpec, Featurizer, LabelSpec, Sampling, MISSING_MARKER,
};
pub use translator::{FeatureTranslator, ListFeatures};

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashSet;

use crate::data::{AttributeKind, Instances, Value};
use crate::error::{Result, TabRegError};
use descriptor::mean_std;

/// Which attributes become features
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSelection {
    /// Every non-class attribute, in schema order
    All,
    /// The named attributes, in the given order
    Named(Vec<String>),
}

/// Builder for [`TabularDataset`]
#[derive(Debug, Clone)]
pub struct TabularDatasetBuilder<'a> {
    data: Option<&'a Instances>,
    sampling: Sampling,
    selection: FeatureSelection,
    descriptor: Option<AdaptationDescriptor>,
}

impl<'a> TabularDatasetBuilder<'a> {
    fn new() -> Self {
        Self {
            data: None,
            sampling: Sampling::default(),
            selection: FeatureSelection::Named(Vec::new()),
            descriptor: None,
        }
    }

    pub fn sampling(mut self, batch_size: usize, shuffle: bool) -> Self {
        self.sampling = Sampling { batch_size, shuffle };
        self
    }

    pub fn data(mut self, data: &'a Instances) -> Self {
        self.data = Some(data);
        self
    }

    pub fn add_all_features(mut self) -> Self {
        self.selection = FeatureSelection::All;
        self
    }

    pub fn add_feature(mut self, name: impl Into<String>) -> Self {
        match &mut self.selection {
            FeatureSelection::Named(names) => names.push(name.into()),
            FeatureSelection::All => self.selection = FeatureSelection::Named(vec![name.into()]),
        }
        self
    }

    pub fn selection(mut self, selection: FeatureSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Reuse a recorded adaptation instead of fitting a new one
    pub fn descriptor(mut self, descriptor: AdaptationDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn from_json(self, json: &str) -> Result<Self> {
        Ok(self.descriptor(AdaptationDescriptor::from_json(json)?))
    }

    pub fn build(self) -> Result<TabularDataset> {
        let data = self
            .data
            .ok_or_else(|| TabRegError::Data("No data provided to dataset builder".to_string()))?;

        match self.descriptor {
            Some(descriptor) => {
                descriptor.check_schema(data.schema())?;
                let (features, labels) = encode_rows(data, &descriptor, false)?;
                Ok(TabularDataset { descriptor, features, labels })
            }
            None => {
                if self.sampling.batch_size == 0 {
                    return Err(TabRegError::invalid_parameter(
                        "batch_size",
                        0,
                        "must be positive",
                    ));
                }
                let descriptor = fit_descriptor(data, &self.selection, self.sampling)?;
                let (features, labels) = encode_rows(data, &descriptor, true)?;
                Ok(TabularDataset { descriptor, features, labels })
            }
        }
    }
}

/// Adapted dataset: encoded features, normalised labels, and the
/// descriptor that produced them
#[derive(Debug, Clone)]
pub struct TabularDataset {
    descriptor: AdaptationDescriptor,
    features: Array2<f64>,
    labels: Array1<f64>,
}

impl TabularDataset {
    pub fn builder<'a>() -> TabularDatasetBuilder<'a> {
        TabularDatasetBuilder::new()
    }

    /// Rebuild from a schema-only dataset and a recorded descriptor
    pub fn reconstruct(schema_only: &Instances, descriptor: AdaptationDescriptor) -> Result<Self> {
        Self::builder().data(schema_only).descriptor(descriptor).build()
    }

    pub fn descriptor(&self) -> &AdaptationDescriptor {
        &self.descriptor
    }

    pub fn sampling(&self) -> Sampling {
        self.descriptor.sampling
    }

    pub fn feature_size(&self) -> usize {
        self.descriptor.feature_size()
    }

    pub fn label_size(&self) -> usize {
        self.descriptor.label_size()
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Normalised labels
    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    /// Translator matching this dataset's encoding
    pub fn translator(&self) -> FeatureTranslator {
        FeatureTranslator::new(&self.descriptor)
    }

    pub fn to_json(&self) -> Result<String> {
        self.descriptor.to_json()
    }

    /// Randomly assign every row to either the training or the validation
    /// partition; `train_percentage` of the rows (rounded) go to training
    pub fn random_split(&self, train_percentage: u32, seed: Option<u64>) -> Result<(Partition, Partition)> {
        if !(1..=99).contains(&train_percentage) {
            return Err(TabRegError::invalid_parameter(
                "train_percentage",
                train_percentage,
                "must be within 1..=99",
            ));
        }

        let mut rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let n = self.len();
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);

        let train_size = (n * train_percentage as usize + 50) / 100;
        let validation = indices.split_off(train_size.min(n));
        Ok((Partition { indices }, Partition { indices: validation }))
    }

    /// All rows as one partition
    pub fn partition_all(&self) -> Partition {
        Partition {
            indices: (0..self.len()).collect(),
        }
    }

    fn gather(&self, indices: &[usize]) -> Batch {
        Batch {
            x: self.features.select(Axis(0), indices),
            y: self.labels.select(Axis(0), indices),
        }
    }
}

/// One mini-batch
#[derive(Debug, Clone)]
pub struct Batch {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

/// Subset of a dataset's rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    indices: Vec<usize>,
}

impl Partition {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Mini-batches in the dataset's sampling order
    pub fn batches<'a, R: Rng + ?Sized>(
        &self,
        dataset: &'a TabularDataset,
        rng: &mut R,
    ) -> impl Iterator<Item = Batch> + 'a {
        let sampling = dataset.sampling();
        let mut order = self.indices.clone();
        if sampling.shuffle {
            order.shuffle(rng);
        }
        let chunks: Vec<Vec<usize>> = order
            .chunks(sampling.batch_size.max(1))
            .map(|c| c.to_vec())
            .collect();
        chunks.into_iter().map(move |idx| dataset.gather(&idx))
    }

    /// The whole partition as a single batch
    pub fn to_batch(&self, dataset: &TabularDataset) -> Batch {
        dataset.gather(&self.indices)
    }
}

fn fit_descriptor(
    data: &Instances,
    selection: &FeatureSelection,
    sampling: Sampling,
) -> Result<AdaptationDescriptor> {
    let schema = data.schema();
    let class_index = schema
        .class_index()
        .ok_or_else(|| TabRegError::Capability("No label attribute set".to_string()))?;
    let class = &schema.attributes()[class_index];
    if !class.kind.is_numeric() {
        return Err(TabRegError::Capability(format!(
            "Label '{}' must be numeric, found {}",
            class.name, class.kind
        )));
    }

    let selected: Vec<usize> = match selection {
        FeatureSelection::All => schema.feature_attributes().map(|(i, _)| i).collect(),
        FeatureSelection::Named(names) => {
            let mut seen = HashSet::new();
            names
                .iter()
                .map(|name| {
                    let index = schema.index_of(name).ok_or_else(|| {
                        TabRegError::Capability(format!("Feature '{}' not found", name))
                    })?;
                    if index == class_index {
                        return Err(TabRegError::Capability(format!(
                            "Label '{}' cannot be used as a feature",
                            name
                        )));
                    }
                    if !seen.insert(index) {
                        return Err(TabRegError::Capability(format!(
                            "Feature '{}' selected twice",
                            name
                        )));
                    }
                    Ok(index)
                })
                .collect::<Result<Vec<usize>>>()?
        }
    };
    if selected.is_empty() {
        return Err(TabRegError::Capability("No usable feature columns".to_string()));
    }

    let features = selected
        .into_iter()
        .map(|index| {
            let attribute = &schema.attributes()[index];
            let column = data.records().filter_map(move |r| r.value(index));
            let featurizer = match &attribute.kind {
                AttributeKind::Numeric => Featurizer::fit_numeric(column.filter_map(Value::as_f64)),
                AttributeKind::Nominal(values) => Featurizer::Categorical { values: values.clone() },
                AttributeKind::Text => {
                    let mut values: Vec<String> = Vec::new();
                    for value in column {
                        if let Value::Symbolic(s) = value {
                            if !values.contains(s) {
                                values.push(s.clone());
                            }
                        }
                    }
                    Featurizer::Categorical { values }
                }
            };
            FeatureSpec {
                name: attribute.name.clone(),
                featurizer,
            }
        })
        .collect();

    let labels = data.class_values()?;
    if let Some(row) = labels.iter().position(Option::is_none) {
        return Err(TabRegError::Capability(format!(
            "Label '{}' is missing in row {}",
            class.name, row
        )));
    }
    let (mean, std) = mean_std(labels.into_iter().flatten());

    Ok(AdaptationDescriptor {
        version: AdaptationDescriptor::VERSION,
        features,
        label: LabelSpec {
            name: class.name.clone(),
            mean,
            std,
        },
        sampling,
    })
}

/// Encode every row through the same path prediction uses
fn encode_rows(
    data: &Instances,
    descriptor: &AdaptationDescriptor,
    require_labels: bool,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let translator = FeatureTranslator::new(descriptor);
    let n_rows = data.num_instances();
    let n_cols = translator.input_size();
    let label_index = data.schema().index_of(&descriptor.label.name);

    let mut features = Vec::with_capacity(n_rows * n_cols);
    let mut labels = Vec::with_capacity(n_rows);
    for (row, record) in data.records().enumerate() {
        let list = ListFeatures::from_record(&record, descriptor)?;
        features.extend(translator.process_input(&list)?.iter().copied());

        let label = label_index
            .and_then(|i| record.value(i))
            .and_then(Value::as_f64);
        match label {
            Some(y) => labels.push(translator.encode_label(y)),
            None if require_labels => {
                return Err(TabRegError::Capability(format!(
                    "Label '{}' is missing in row {}",
                    descriptor.label.name, row
                )))
            }
            None => labels.push(f64::NAN),
        }
    }

    Ok((
        Array2::from_shape_vec((n_rows, n_cols), features)?,
        Array1::from(labels),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Attribute, Schema};

    fn numeric_data(n: usize) -> Instances {
        let schema = Schema::new(
            "lin",
            vec![Attribute::numeric("x1"), Attribute::numeric("x2"), Attribute::numeric("y")],
        )
        .with_class("y")
        .unwrap();
        let rows = (0..n)
            .map(|i| {
                let x1 = i as f64;
                let x2 = (i % 7) as f64;
                vec![x1.into(), x2.into(), (2.0 * x1 - x2).into()]
            })
            .collect();
        Instances::new(schema).with_rows(rows).unwrap()
    }

    #[test]
    fn test_build_all_features() {
        let data = numeric_data(20);
        let ds = TabularDataset::builder()
            .sampling(4, true)
            .data(&data)
            .add_all_features()
            .build()
            .unwrap();
        assert_eq!(ds.len(), 20);
        assert_eq!(ds.feature_size(), 2);
        assert_eq!(ds.descriptor().feature_names(), vec!["x1", "x2"]);
        // normalised columns are centred
        let mean = ds.features().column(0).mean().unwrap();
        assert!(mean.abs() < 1e-9);
    }

    #[test]
    fn test_named_selection_order() {
        let data = numeric_data(5);
        let ds = TabularDataset::builder()
            .data(&data)
            .add_feature("x2")
            .add_feature("x1")
            .build()
            .unwrap();
        assert_eq!(ds.descriptor().feature_names(), vec!["x2", "x1"]);
    }

    #[test]
    fn test_rejects_unusable_inputs() {
        let data = numeric_data(5);
        let none = TabularDataset::builder().data(&data).build();
        assert!(matches!(none, Err(TabRegError::Capability(_))));

        let label_as_feature = TabularDataset::builder().data(&data).add_feature("y").build();
        assert!(label_as_feature.is_err());

        let schema = Schema::new(
            "s",
            vec![Attribute::numeric("x"), Attribute::nominal("y", vec!["a".into()])],
        )
        .with_class("y")
        .unwrap();
        let symbolic = Instances::new(schema)
            .with_rows(vec![vec![1.0.into(), "a".into()]])
            .unwrap();
        let result = TabularDataset::builder().data(&symbolic).add_all_features().build();
        assert!(matches!(result, Err(TabRegError::Capability(_))));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let data = numeric_data(5);
        let result = TabularDataset::builder()
            .sampling(0, false)
            .data(&data)
            .add_all_features()
            .build();
        assert!(matches!(result, Err(TabRegError::InvalidParameter { .. })));
    }

    #[test]
    fn test_reconstruct_from_header() {
        let data = numeric_data(30);
        let ds = TabularDataset::builder()
            .sampling(8, false)
            .data(&data)
            .add_all_features()
            .build()
            .unwrap();
        let json = ds.to_json().unwrap();

        let header = data.header();
        let rebuilt = TabularDataset::builder().data(&header).from_json(&json).unwrap().build().unwrap();
        assert!(rebuilt.is_empty());
        assert_eq!(rebuilt.descriptor(), ds.descriptor());
        assert_eq!(rebuilt.sampling(), Sampling { batch_size: 8, shuffle: false });
    }

    #[test]
    fn test_reconstruct_missing_feature() {
        let data = numeric_data(10);
        let ds = TabularDataset::builder().data(&data).add_all_features().build().unwrap();
        let schema = Schema::new("other", vec![Attribute::numeric("x1"), Attribute::numeric("y")]);
        let header = Instances::new(schema);
        let err = TabularDataset::reconstruct(&header, ds.descriptor().clone()).unwrap_err();
        assert!(matches!(err, TabRegError::Reconstruction(_)));
    }

    #[test]
    fn test_split_sizes_and_disjointness() {
        let data = numeric_data(37);
        let ds = TabularDataset::builder().data(&data).add_all_features().build().unwrap();
        for pct in [1u32, 13, 50, 80, 99] {
            let (train, val) = ds.random_split(pct, Some(7)).unwrap();
            assert_eq!(train.len() + val.len(), 37);
            let mut all: Vec<usize> = train.indices().iter().chain(val.indices()).copied().collect();
            all.sort_unstable();
            assert_eq!(all, (0..37).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_split_seeded_is_reproducible() {
        let data = numeric_data(50);
        let ds = TabularDataset::builder().data(&data).add_all_features().build().unwrap();
        let a = ds.random_split(80, Some(3)).unwrap();
        let b = ds.random_split(80, Some(3)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.0.len(), 40);
    }

    #[test]
    fn test_split_rejects_bad_percentage() {
        let data = numeric_data(10);
        let ds = TabularDataset::builder().data(&data).add_all_features().build().unwrap();
        assert!(ds.random_split(0, None).is_err());
        assert!(ds.random_split(100, None).is_err());
    }

    #[test]
    fn test_batches_cover_partition() {
        let data = numeric_data(23);
        let ds = TabularDataset::builder()
            .sampling(5, true)
            .data(&data)
            .add_all_features()
            .build()
            .unwrap();
        let part = ds.partition_all();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let sizes: Vec<usize> = part.batches(&ds, &mut rng).map(|b| b.x.nrows()).collect();
        assert_eq!(sizes, vec![5, 5, 5, 5, 3]);
    }
}
