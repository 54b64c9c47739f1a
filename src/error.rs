//! Error types for tabular regression

use thiserror::Error;

/// Result type alias for tabreg operations
pub type Result<T> = std::result::Result<T, TabRegError>;

/// Main error type
#[derive(Error, Debug)]
pub enum TabRegError {
    /// Dataset violates the attribute-type constraints of the regressor
    #[error("Capability error: {0}")]
    Capability(String),

    /// Adaptation descriptor cannot be matched against a schema
    #[error("Reconstruction error: {0}")]
    Reconstruction(String),

    /// Prediction-time record cannot be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Failure inside the fit loop
    #[error("Training error: {0}")]
    Training(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not built")]
    ModelNotBuilt,

    /// The engine handle was released, either by `close` or by eviction
    #[error("Model handle released: {0}")]
    HandleReleased(String),

    #[error("Model artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },
}

impl TabRegError {
    pub(crate) fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        TabRegError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TabRegError {
    fn from(err: serde_json::Error) -> Self {
        TabRegError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for TabRegError {
    fn from(err: bincode::Error) -> Self {
        TabRegError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TabRegError {
    fn from(err: ndarray::ShapeError) -> Self {
        TabRegError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for TabRegError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabRegError::Data(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabRegError::Capability("label is nominal".to_string());
        assert_eq!(err.to_string(), "Capability error: label is nominal");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabRegError = io_err.into();
        assert!(matches!(err, TabRegError::Io(_)));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = TabRegError::invalid_parameter("train_percentage", 0, "must be within 1..=99");
        assert_eq!(
            err.to_string(),
            "Invalid parameter: train_percentage = 0, must be within 1..=99"
        );
    }
}
