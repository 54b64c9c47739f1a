use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::LocationProvider;
use crate::error::{Result, TabRegError};

/// Artifact directory strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputDirGenerator {
    Fixed { dir: PathBuf },
    /// `subdir` under the system temp directory
    Temp { subdir: String },
}

impl OutputDirGenerator {
    pub fn fixed(dir: impl Into<PathBuf>) -> Self {
        OutputDirGenerator::Fixed { dir: dir.into() }
    }

    pub fn temp(subdir: impl Into<String>) -> Self {
        OutputDirGenerator::Temp { subdir: subdir.into() }
    }
}

impl Default for OutputDirGenerator {
    fn default() -> Self {
        OutputDirGenerator::fixed(".")
    }
}

impl LocationProvider for OutputDirGenerator {
    fn generate(&self) -> PathBuf {
        match self {
            OutputDirGenerator::Fixed { dir } => dir.clone(),
            OutputDirGenerator::Temp { subdir } => std::env::temp_dir().join(subdir),
        }
    }
}

impl fmt::Display for OutputDirGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDirGenerator::Fixed { dir } => write!(f, "{}", dir.display()),
            OutputDirGenerator::Temp { subdir } => write!(f, "temp:{}", subdir),
        }
    }
}

/// `temp:<subdir>` or a directory path
impl FromStr for OutputDirGenerator {
    type Err = TabRegError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(TabRegError::Config("Output directory must not be empty".to_string()));
        }
        Ok(match s.strip_prefix("temp:") {
            Some(subdir) => OutputDirGenerator::temp(subdir),
            None => OutputDirGenerator::fixed(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate() {
        assert_eq!(OutputDirGenerator::default().generate(), PathBuf::from("."));
        let temp = OutputDirGenerator::temp("tabreg").generate();
        assert!(temp.starts_with(std::env::temp_dir()));
        assert!(temp.ends_with("tabreg"));
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "out/models".parse::<OutputDirGenerator>().unwrap(),
            OutputDirGenerator::fixed("out/models")
        );
        assert_eq!(
            "temp:runs".parse::<OutputDirGenerator>().unwrap(),
            OutputDirGenerator::temp("runs")
        );
        assert!("".parse::<OutputDirGenerator>().is_err());
    }
}
