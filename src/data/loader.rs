//! Loading labeled datasets from CSV files

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::{Attribute, Instance, Instances, Schema, Value};
use crate::error::{Result, TabRegError};

/// CSV loader producing [`Instances`]
#[derive(Debug, Clone)]
pub struct DataLoader {
    delimiter: u8,
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            infer_schema_length: 100,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Read a CSV file into a DataFrame
    pub fn read_frame(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| TabRegError::Data(format!("Failed to open {}: {}", path.display(), e)))?;

        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;
        Ok(df)
    }

    /// Load a CSV file, designating `class_column` as the label if given
    pub fn load_csv(&self, path: impl AsRef<Path>, class_column: Option<&str>) -> Result<Instances> {
        let start = Instant::now();
        let path = path.as_ref();
        let df = self.read_frame(path)?;
        let instances = Self::from_dataframe(&df, &relation_name(path), class_column)?;

        debug!(
            path = %path.display(),
            rows = instances.num_instances(),
            columns = instances.schema().num_attributes(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        Ok(instances)
    }

    /// Convert a DataFrame: numeric columns become numeric attributes, all
    /// others become nominal attributes over their distinct values
    pub fn from_dataframe(df: &DataFrame, relation: &str, class_column: Option<&str>) -> Result<Instances> {
        let n_rows = df.height();
        let mut attributes = Vec::with_capacity(df.width());
        let mut columns: Vec<Vec<Value>> = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let name = col.name().to_string();
            if is_numeric(col.dtype()) {
                let casted = col.cast(&DataType::Float64)?;
                let values: Vec<Value> = casted
                    .f64()?
                    .into_iter()
                    .map(|v| match v {
                        Some(x) if x.is_finite() => Value::Numeric(x),
                        _ => Value::Missing,
                    })
                    .collect();
                attributes.push(Attribute::numeric(name));
                columns.push(values);
            } else {
                let casted = col.cast(&DataType::String)?;
                let mut labels: Vec<String> = Vec::new();
                let values: Vec<Value> = casted
                    .str()?
                    .into_iter()
                    .map(|v| match v {
                        Some(s) => {
                            if !labels.iter().any(|l| l == s) {
                                labels.push(s.to_string());
                            }
                            Value::Symbolic(s.to_string())
                        }
                        None => Value::Missing,
                    })
                    .collect();
                attributes.push(Attribute::nominal(name, labels));
                columns.push(values);
            }
        }

        let mut schema = Schema::new(relation, attributes);
        if let Some(class) = class_column {
            schema = schema.with_class(class)?;
        }

        let mut instances = Instances::new(schema);
        for row in 0..n_rows {
            let values = columns.iter().map(|c| c[row].clone()).collect();
            instances.push(Instance::new(values))?;
        }
        Ok(instances)
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Relation name derived from a file path
pub fn relation_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data")
        .to_string()
}
