//! Single-record prediction against a model handle

use std::sync::Arc;

use super::handle::ModelHandle;
use crate::dataset::{FeatureTranslator, ListFeatures};
use crate::error::{Result, TabRegError};

/// Translator bound to a live model handle.
///
/// Becomes unusable once its handle is released.
#[derive(Debug, Clone)]
pub struct Predictor {
    handle: Arc<ModelHandle>,
    translator: FeatureTranslator,
}

impl Predictor {
    pub fn new(handle: Arc<ModelHandle>, translator: FeatureTranslator) -> Result<Self> {
        let input_dim = handle.with_network(|n| n.input_dim())?;
        if input_dim != translator.input_size() {
            return Err(TabRegError::ShapeError {
                expected: format!("{} inputs", input_dim),
                actual: format!("{} encoded features", translator.input_size()),
            });
        }
        Ok(Self { handle, translator })
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    pub fn is_valid(&self) -> bool {
        !self.handle.is_released()
    }

    pub fn predict(&self, input: &ListFeatures) -> Result<f64> {
        let x = self.translator.process_input(input)?;
        let output = self.handle.with_network(|network| network.predict_one(&x))??;
        if !output.is_finite() {
            return Err(TabRegError::Prediction(format!(
                "Model '{}' produced a non-finite output",
                self.handle.name()
            )));
        }
        Ok(self.translator.process_output(output))
    }
}
