//! Record-structured tabular data
//!
//! The host-side view of a dataset: a [`Schema`] of typed attributes, rows of
//! [`Value`]s and a designated class (label) attribute. The regressor never
//! mutates an [`Instances`] it is given.

mod capabilities;
mod loader;

pub use capabilities::{Capabilities, Capability};
pub use loader::{relation_name, DataLoader};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TabRegError};

/// Type of an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Real-valued attribute
    Numeric,
    /// Symbolic attribute with a closed set of labels
    Nominal(Vec<String>),
    /// Free-form symbolic attribute
    Text,
}

impl AttributeKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, AttributeKind::Numeric)
    }

    pub fn is_symbolic(&self) -> bool {
        !self.is_numeric()
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Numeric => write!(f, "numeric"),
            AttributeKind::Nominal(values) => write!(f, "nominal({})", values.len()),
            AttributeKind::Text => write!(f, "text"),
        }
    }
}

/// Named, typed column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    pub fn nominal(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal(values),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Text,
        }
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Numeric(f64),
    Symbolic(String),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numeric(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Symbolic(v.to_string())
    }
}

/// Attribute metadata of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub relation: String,
    attributes: Vec<Attribute>,
    class_index: Option<usize>,
}

impl Schema {
    pub fn new(relation: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            relation: relation.into(),
            attributes,
            class_index: None,
        }
    }

    /// Designate the class attribute by name
    pub fn with_class(mut self, name: &str) -> Result<Self> {
        let index = self
            .index_of(name)
            .ok_or_else(|| TabRegError::Data(format!("Class attribute not found: {}", name)))?;
        self.class_index = Some(index);
        Ok(self)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.index_of(name).map(|i| &self.attributes[i])
    }

    pub fn class_index(&self) -> Option<usize> {
        self.class_index
    }

    pub fn class_attribute(&self) -> Option<&Attribute> {
        self.class_index.map(|i| &self.attributes[i])
    }

    /// Attributes other than the class, in schema order
    pub fn feature_attributes(&self) -> impl Iterator<Item = (usize, &Attribute)> {
        let class_index = self.class_index;
        self.attributes
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != class_index)
    }
}

/// One row of values, aligned with a [`Schema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    values: Vec<Value>,
}

impl Instance {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Borrowed view of a row together with the schema that describes it
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    schema: &'a Schema,
    values: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn new(schema: &'a Schema, values: &'a [Value]) -> Result<Self> {
        if values.len() != schema.num_attributes() {
            return Err(TabRegError::ShapeError {
                expected: format!("{} values", schema.num_attributes()),
                actual: format!("{} values", values.len()),
            });
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn value(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Look a value up by attribute name
    pub fn value_by_name(&self, name: &str) -> Option<(&'a Attribute, &'a Value)> {
        let index = self.schema.index_of(name)?;
        Some((&self.schema.attributes[index], &self.values[index]))
    }
}

/// Labeled dataset: schema plus rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instances {
    schema: Schema,
    rows: Vec<Instance>,
}

impl Instances {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Append a row, checking it against the schema
    pub fn push(&mut self, instance: Instance) -> Result<()> {
        if instance.values.len() != self.schema.num_attributes() {
            return Err(TabRegError::ShapeError {
                expected: format!("{} values", self.schema.num_attributes()),
                actual: format!("{} values", instance.values.len()),
            });
        }
        for (attribute, value) in self.schema.attributes.iter().zip(&instance.values) {
            let ok = match (&attribute.kind, value) {
                (_, Value::Missing) => true,
                (AttributeKind::Numeric, Value::Numeric(_)) => true,
                (AttributeKind::Nominal(labels), Value::Symbolic(s)) => labels.contains(s),
                (AttributeKind::Text, Value::Symbolic(_)) => true,
                _ => false,
            };
            if !ok {
                return Err(TabRegError::Data(format!(
                    "Value {:?} does not fit {} attribute '{}'",
                    value, attribute.kind, attribute.name
                )));
            }
        }
        self.rows.push(instance);
        Ok(())
    }

    pub fn with_rows(mut self, rows: Vec<Vec<Value>>) -> Result<Self> {
        for values in rows {
            self.push(Instance::new(values))?;
        }
        Ok(self)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_instances(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.rows.get(index)
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|row| Record {
            schema: &self.schema,
            values: &row.values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |row| Record {
            schema: &self.schema,
            values: &row.values,
        })
    }

    /// Zero-row copy carrying only the schema
    pub fn header(&self) -> Instances {
        Instances::new(self.schema.clone())
    }

    /// Class values as `f64`, `None` where missing or symbolic
    pub fn class_values(&self) -> Result<Vec<Option<f64>>> {
        let index = self
            .schema
            .class_index
            .ok_or_else(|| TabRegError::Data("No class attribute set".to_string()))?;
        Ok(self.rows.iter().map(|r| r.values[index].as_f64()).collect())
    }
}
