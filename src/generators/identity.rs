use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::IdentityProvider;
use crate::error::{Result, TabRegError};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-wide unique id source
pub struct UniqueIds;

impl UniqueIds {
    /// `{nanos:x}-{pid:x}-{counter:x}`; never repeats within a process
    pub fn next() -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{:x}-{:x}-{:x}", nanos, std::process::id(), counter)
    }
}

/// Model identity strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdGenerator {
    /// Always the same id
    Fixed { id: String },
    /// `prefix` plus a fresh [`UniqueIds`] value on every call
    Unique { prefix: String },
}

impl IdGenerator {
    pub fn fixed(id: impl Into<String>) -> Self {
        IdGenerator::Fixed { id: id.into() }
    }

    pub fn unique(prefix: impl Into<String>) -> Self {
        IdGenerator::Unique { prefix: prefix.into() }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        IdGenerator::fixed("tabular")
    }
}

impl IdentityProvider for IdGenerator {
    fn generate(&self) -> String {
        match self {
            IdGenerator::Fixed { id } => id.clone(),
            IdGenerator::Unique { prefix } => format!("{}-{}", prefix, UniqueIds::next()),
        }
    }
}

impl fmt::Display for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdGenerator::Fixed { id } => write!(f, "fixed:{}", id),
            IdGenerator::Unique { prefix } => write!(f, "unique:{}", prefix),
        }
    }
}

/// `fixed:<id>`, `unique:<prefix>` or a bare id
impl FromStr for IdGenerator {
    type Err = TabRegError;

    fn from_str(s: &str) -> Result<Self> {
        let generator = match s.split_once(':') {
            Some(("fixed", id)) => IdGenerator::fixed(id),
            Some(("unique", prefix)) => IdGenerator::unique(prefix),
            Some((kind, _)) => {
                return Err(TabRegError::Config(format!("Unknown id generator: {}", kind)))
            }
            None => IdGenerator::fixed(s),
        };
        match &generator {
            IdGenerator::Fixed { id } if id.is_empty() => {
                Err(TabRegError::Config("Model id must not be empty".to_string()))
            }
            IdGenerator::Unique { prefix } if prefix.is_empty() => {
                Err(TabRegError::Config("Id prefix must not be empty".to_string()))
            }
            _ => Ok(generator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unique_ids_never_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| UniqueIds::next()).collect();
        assert_eq!(ids.len(), 1000);
        assert_eq!(UniqueIds::next().split('-').count(), 3);
    }

    #[test]
    fn test_generators() {
        assert_eq!(IdGenerator::fixed("m").generate(), "m");
        let unique = IdGenerator::unique("m");
        let (a, b) = (unique.generate(), unique.generate());
        assert!(a.starts_with("m-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse() {
        assert_eq!("house".parse::<IdGenerator>().unwrap(), IdGenerator::fixed("house"));
        assert_eq!("unique:h".parse::<IdGenerator>().unwrap(), IdGenerator::unique("h"));
        assert!("random:h".parse::<IdGenerator>().is_err());
        assert!("fixed:".parse::<IdGenerator>().is_err());
        let g = IdGenerator::unique("p");
        assert_eq!(g.to_string().parse::<IdGenerator>().unwrap(), g);
    }
}
