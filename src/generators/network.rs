use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::ArchitectureBuilder;
use crate::engine::{Activation, NetworkTopology};
use crate::error::{Result, TabRegError};

/// Capacity preset for the tabular regression network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Performance {
    Fast,
    Balanced,
    Accurate,
}

impl Performance {
    /// (shared blocks, independent blocks, block width)
    pub fn blocks(self) -> (usize, usize, usize) {
        match self {
            Performance::Fast => (1, 1, 16),
            Performance::Balanced => (2, 2, 32),
            Performance::Accurate => (4, 4, 64),
        }
    }

    pub fn topology(self, feature_count: usize, label_count: usize) -> Result<NetworkTopology> {
        let (shared, independent, width) = self.blocks();
        let topology = NetworkTopology::blocks(feature_count, label_count, shared, independent, width);
        topology.validate()?;
        Ok(topology)
    }
}

impl Default for Performance {
    fn default() -> Self {
        Performance::Balanced
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Performance::Fast => "FAST",
            Performance::Balanced => "BALANCED",
            Performance::Accurate => "ACCURATE",
        };
        f.write_str(name)
    }
}

impl FromStr for Performance {
    type Err = TabRegError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "FAST" => Ok(Performance::Fast),
            "BALANCED" => Ok(Performance::Balanced),
            "ACCURATE" => Ok(Performance::Accurate),
            _ => Err(TabRegError::Config(format!(
                "Unknown performance preset '{}' (expected FAST, BALANCED or ACCURATE)",
                s
            ))),
        }
    }
}

/// Architecture strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkGenerator {
    /// Block network sized by a [`Performance`] preset
    TabularRegression { performance: Performance },
    /// Explicit hidden layer widths
    Layers {
        hidden: Vec<usize>,
        #[serde(default)]
        activation: Activation,
    },
    #[serde(skip)]
    Custom(Arc<dyn ArchitectureBuilder>),
}

impl NetworkGenerator {
    pub fn tabular(performance: Performance) -> Self {
        NetworkGenerator::TabularRegression { performance }
    }

    pub fn layers(hidden: Vec<usize>) -> Self {
        NetworkGenerator::Layers {
            hidden,
            activation: Activation::default(),
        }
    }

    pub fn custom(builder: impl ArchitectureBuilder + 'static) -> Self {
        NetworkGenerator::Custom(Arc::new(builder))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, NetworkGenerator::Custom(_))
    }
}

impl Default for NetworkGenerator {
    fn default() -> Self {
        NetworkGenerator::tabular(Performance::Balanced)
    }
}

impl ArchitectureBuilder for NetworkGenerator {
    fn build(&self, feature_count: usize, label_count: usize) -> Result<NetworkTopology> {
        match self {
            NetworkGenerator::TabularRegression { performance } => {
                performance.topology(feature_count, label_count)
            }
            NetworkGenerator::Layers { hidden, activation } => {
                let topology = NetworkTopology::new(feature_count, label_count, hidden.clone())
                    .with_activation(*activation);
                topology.validate()?;
                Ok(topology)
            }
            NetworkGenerator::Custom(builder) => builder.build(feature_count, label_count),
        }
    }
}

impl fmt::Display for NetworkGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkGenerator::TabularRegression { performance } => write!(f, "{}", performance),
            NetworkGenerator::Layers { hidden, activation } => {
                let widths: Vec<String> = hidden.iter().map(|w| w.to_string()).collect();
                write!(f, "layers:{}:{:?}", widths.join(","), activation)
            }
            NetworkGenerator::Custom(builder) => write!(f, "custom({:?})", builder),
        }
    }
}

/// A preset name, or `layers:<w1>,<w2>[:<activation>]`
impl FromStr for NetworkGenerator {
    type Err = TabRegError;

    fn from_str(s: &str) -> Result<Self> {
        let Some(spec) = s.strip_prefix("layers:") else {
            return Ok(NetworkGenerator::tabular(s.parse()?));
        };
        let (widths, activation) = match spec.split_once(':') {
            Some((widths, activation)) => (widths, activation.parse()?),
            None => (spec, Activation::default()),
        };
        let hidden = widths
            .split(',')
            .filter(|w| !w.trim().is_empty())
            .map(|w| {
                w.trim()
                    .parse::<usize>()
                    .map_err(|_| TabRegError::Config(format!("Invalid layer width: {}", w)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(NetworkGenerator::Layers { hidden, activation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_deterministic() {
        for preset in [Performance::Fast, Performance::Balanced, Performance::Accurate] {
            let a = preset.topology(7, 1).unwrap();
            let b = preset.topology(7, 1).unwrap();
            assert_eq!(a, b);
        }
        assert_eq!(Performance::Fast.topology(3, 1).unwrap().layer_sizes(), vec![3, 16, 16, 1]);
        assert_eq!(Performance::Accurate.topology(3, 1).unwrap().hidden_layers.len(), 8);
    }

    #[test]
    fn test_unknown_preset_fails() {
        assert_eq!("accurate".parse::<Performance>().unwrap(), Performance::Accurate);
        assert!("HUGE".parse::<Performance>().is_err());
        assert!("HUGE".parse::<NetworkGenerator>().is_err());
    }

    #[test]
    fn test_layers_generator() {
        let g: NetworkGenerator = "layers:8,4:tanh".parse().unwrap();
        let topology = g.build(5, 1).unwrap();
        assert_eq!(topology.layer_sizes(), vec![5, 8, 4, 1]);
        assert_eq!(topology.activation, Activation::Tanh);
        assert!("layers:8,x".parse::<NetworkGenerator>().is_err());
        assert!(NetworkGenerator::layers(vec![0]).build(5, 1).is_err());
    }

    #[derive(Debug)]
    struct Linear;

    impl ArchitectureBuilder for Linear {
        fn build(&self, feature_count: usize, label_count: usize) -> Result<NetworkTopology> {
            Ok(NetworkTopology::new(feature_count, label_count, vec![]))
        }
    }

    #[test]
    fn test_custom_builder() {
        let g = NetworkGenerator::custom(Linear);
        assert!(g.is_custom());
        assert_eq!(g.build(4, 1).unwrap().layer_sizes(), vec![4, 1]);
        assert!(serde_json::to_string(&g).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let g = NetworkGenerator::tabular(Performance::Fast);
        let json = serde_json::to_string(&g).unwrap();
        assert!(json.contains("FAST"));
        let back: NetworkGenerator = serde_json::from_str(&json).unwrap();
        assert_eq!(back.build(2, 1).unwrap(), g.build(2, 1).unwrap());
    }
}
