//! Network architecture descriptions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TabRegError};

/// Activation function for hidden layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Rectified Linear Unit
    ReLU,
    /// Sigmoid
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
    /// Linear (identity)
    Linear,
}

impl Default for Activation {
    fn default() -> Self {
        Self::ReLU
    }
}

impl FromStr for Activation {
    type Err = TabRegError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "relu" => Ok(Activation::ReLU),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "linear" => Ok(Activation::Linear),
            other => Err(TabRegError::Config(format!("Unknown activation: {}", other))),
        }
    }
}

/// Feed-forward topology consumed by [`Network`](super::Network).
///
/// Hidden layers are dense; the output layer is linear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTopology {
    pub input_dim: usize,
    pub output_dim: usize,
    pub hidden_layers: Vec<usize>,
    pub activation: Activation,
}

impl NetworkTopology {
    pub fn new(input_dim: usize, output_dim: usize, hidden_layers: Vec<usize>) -> Self {
        Self {
            input_dim,
            output_dim,
            hidden_layers,
            activation: Activation::ReLU,
        }
    }

    /// Shared blocks followed by independent blocks, all `width` wide
    pub fn blocks(
        input_dim: usize,
        output_dim: usize,
        num_shared: usize,
        num_independent: usize,
        width: usize,
    ) -> Self {
        Self::new(input_dim, output_dim, vec![width; num_shared + num_independent])
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Sizes of every layer, input and output included
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(self.input_dim);
        sizes.extend(&self.hidden_layers);
        sizes.push(self.output_dim);
        sizes
    }

    pub fn num_parameters(&self) -> usize {
        self.layer_sizes().windows(2).map(|w| w[0] * w[1] + w[1]).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 {
            return Err(TabRegError::Config("Network input dimension is zero".to_string()));
        }
        if self.output_dim == 0 {
            return Err(TabRegError::Config("Network output dimension is zero".to_string()));
        }
        if let Some(pos) = self.hidden_layers.iter().position(|&w| w == 0) {
            return Err(TabRegError::Config(format!("Hidden layer {} has zero width", pos)));
        }
        Ok(())
    }
}

impl fmt::Display for NetworkTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes: Vec<String> = self.layer_sizes().iter().map(|s| s.to_string()).collect();
        write!(f, "{} ({:?})", sizes.join("-"), self.activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_layout() {
        let t = NetworkTopology::blocks(5, 1, 2, 3, 16);
        assert_eq!(t.layer_sizes(), vec![5, 16, 16, 16, 16, 16, 1]);
        assert_eq!(t.to_string(), "5-16-16-16-16-16-1 (ReLU)");
    }

    #[test]
    fn test_num_parameters() {
        let t = NetworkTopology::new(3, 1, vec![4]);
        assert_eq!(t.num_parameters(), 3 * 4 + 4 + 4 + 1);
    }

    #[test]
    fn test_validate() {
        assert!(NetworkTopology::new(0, 1, vec![]).validate().is_err());
        assert!(NetworkTopology::new(2, 1, vec![8, 0]).validate().is_err());
        assert!(NetworkTopology::new(2, 1, vec![]).validate().is_ok());
    }

    #[test]
    fn test_activation_parse() {
        assert_eq!("TANH".parse::<Activation>().unwrap(), Activation::Tanh);
        assert!("gelu".parse::<Activation>().is_err());
    }
}
