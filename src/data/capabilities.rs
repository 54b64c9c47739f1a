//! Capability checks on incoming datasets

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{AttributeKind, Instances};
use crate::error::{Result, TabRegError};

/// Something a learner can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    NumericAttributes,
    NominalAttributes,
    NumericClass,
    MissingValues,
    MissingClassValues,
}

/// Set of enabled capabilities plus a minimum row count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    enabled: HashSet<Capability>,
    min_instances: usize,
}

impl Capabilities {
    /// Nothing enabled
    pub fn none() -> Self {
        Self {
            enabled: HashSet::new(),
            min_instances: 1,
        }
    }

    /// What the tabular regressor accepts: numeric features, numeric class
    pub fn regression() -> Self {
        Self::none()
            .enable(Capability::NumericAttributes)
            .enable(Capability::NumericClass)
    }

    pub fn enable(mut self, capability: Capability) -> Self {
        self.enabled.insert(capability);
        self
    }

    pub fn with_min_instances(mut self, n: usize) -> Self {
        self.min_instances = n;
        self
    }

    pub fn handles(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    /// Check a dataset, failing on the first violation
    pub fn test(&self, data: &Instances) -> Result<()> {
        let schema = data.schema();
        let class_index = schema
            .class_index()
            .ok_or_else(|| TabRegError::Capability("No class attribute set".to_string()))?;

        let class = &schema.attributes()[class_index];
        match class.kind {
            AttributeKind::Numeric if self.handles(Capability::NumericClass) => {}
            _ => {
                return Err(TabRegError::Capability(format!(
                    "Cannot handle {} class attribute '{}'",
                    class.kind, class.name
                )))
            }
        }

        for (_, attribute) in schema.feature_attributes() {
            let allowed = match attribute.kind {
                AttributeKind::Numeric => self.handles(Capability::NumericAttributes),
                AttributeKind::Nominal(_) => self.handles(Capability::NominalAttributes),
                AttributeKind::Text => false,
            };
            if !allowed {
                return Err(TabRegError::Capability(format!(
                    "Cannot handle {} attribute '{}'",
                    attribute.kind, attribute.name
                )));
            }
        }

        if data.num_instances() < self.min_instances {
            return Err(TabRegError::Capability(format!(
                "Not enough training instances: {} (required: {})",
                data.num_instances(),
                self.min_instances
            )));
        }

        for (row, record) in data.records().enumerate() {
            for (index, attribute) in schema.attributes().iter().enumerate() {
                let missing = record.value(index).map_or(true, |v| v.is_missing());
                if !missing {
                    continue;
                }
                let allowed = if index == class_index {
                    self.handles(Capability::MissingClassValues)
                } else {
                    self.handles(Capability::MissingValues)
                };
                if !allowed {
                    return Err(TabRegError::Capability(format!(
                        "Cannot handle missing value in '{}' (row {})",
                        attribute.name, row
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::regression()
    }
}
