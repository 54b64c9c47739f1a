//! Parameter files
//!
//! A trained network is stored as `{dir}/{name}-{epoch:04}.params`: a
//! bincode envelope with magic bytes, format version, the topology, and the
//! parameter payload guarded by an FNV-1a checksum.
//!
//! This is the engine's own checkpoint format; the orchestrator only names
//! the files and never reads inside them.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::network::{Network, NetworkParams};
use super::topology::NetworkTopology;
use crate::error::{Result, TabRegError};

/// File extension of parameter files
pub const PARAMS_EXTENSION: &str = "params";

#[derive(Debug, Serialize, Deserialize)]
struct ParamsFile {
    magic: [u8; 4],
    format_version: u32,
    epoch: usize,
    topology: NetworkTopology,
    payload: Vec<u8>,
    checksum: u64,
}

impl ParamsFile {
    const MAGIC: [u8; 4] = [b'T', b'R', b'G', b'P'];
    const VERSION: u32 = 1;

    fn verify(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(TabRegError::Serialization("Not a parameter file".to_string()));
        }
        if self.format_version != Self::VERSION {
            return Err(TabRegError::Serialization(format!(
                "Unsupported parameter file version {}",
                self.format_version
            )));
        }
        if fnv1a(&self.payload) != self.checksum {
            return Err(TabRegError::Serialization("Parameter checksum mismatch".to_string()));
        }
        Ok(())
    }
}

fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub fn params_file_name(name: &str, epoch: usize) -> String {
    format!("{}-{:04}.{}", name, epoch, PARAMS_EXTENSION)
}

/// Matches parameter files of exactly `name`, any epoch
pub fn params_pattern(name: &str) -> Result<Regex> {
    let pattern = format!(r"^{}-([0-9]+)\.{}$", regex::escape(name), PARAMS_EXTENSION);
    Regex::new(&pattern).map_err(|e| TabRegError::Config(format!("Invalid model name '{}': {}", name, e)))
}

/// Directory entries named like parameter files of `name`, sorted by epoch
pub fn list_params(dir: &Path, name: &str) -> Result<Vec<(usize, PathBuf)>> {
    let pattern = params_pattern(name)?;
    let mut found = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(caps) = pattern.captures(file_name) {
            if let Ok(epoch) = caps[1].parse::<usize>() {
                found.push((epoch, entry.path()));
            }
        }
    }
    found.sort_by_key(|(epoch, _)| *epoch);
    Ok(found)
}

pub fn save_params(dir: &Path, name: &str, epoch: usize, network: &Network) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let payload = bincode::serialize(network.params())?;
    let file = ParamsFile {
        magic: ParamsFile::MAGIC,
        format_version: ParamsFile::VERSION,
        epoch,
        topology: network.topology().clone(),
        checksum: fnv1a(&payload),
        payload,
    };

    let path = dir.join(params_file_name(name, epoch));
    let bytes = bincode::serialize(&file)?;
    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(path)
}

/// Load the highest-epoch parameter file of `name`
pub fn load_params(dir: &Path, name: &str) -> Result<(Network, usize)> {
    let (_, path) = list_params(dir, name)?
        .into_iter()
        .filter(|(_, path)| path.is_file())
        .last()
        .ok_or_else(|| TabRegError::ArtifactNotFound(format!("{} in {}", name, dir.display())))?;
    load_params_file(&path)
}

pub fn load_params_file(path: &Path) -> Result<(Network, usize)> {
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
    let file: ParamsFile = bincode::deserialize(&bytes)?;
    file.verify()?;
    let params: NetworkParams = bincode::deserialize(&file.payload)?;
    let network = Network::from_parts(file.topology, params)?;
    Ok((network, file.epoch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> Network {
        Network::new(NetworkTopology::new(3, 1, vec![5]), Some(3)).unwrap()
    }

    #[test]
    fn test_file_name_and_pattern() {
        assert_eq!(params_file_name("m", 20), "m-0020.params");
        let p = params_pattern("m.x").unwrap();
        assert!(p.is_match("m.x-0001.params"));
        assert!(!p.is_match("mzx-0001.params"));
        assert!(!p.is_match("m.x-other-0001.params"));
        assert!(!p.is_match("m.x.json"));
    }

    #[test]
    fn test_save_load_latest() {
        let dir = tempfile::tempdir().unwrap();
        let net = network();
        save_params(dir.path(), "model", 2, &net).unwrap();
        save_params(dir.path(), "model", 10, &net).unwrap();
        save_params(dir.path(), "model-b", 30, &net).unwrap();

        let listed = list_params(dir.path(), "model").unwrap();
        assert_eq!(listed.iter().map(|(e, _)| *e).collect::<Vec<_>>(), vec![2, 10]);

        let (loaded, epoch) = load_params(dir.path(), "model").unwrap();
        assert_eq!(epoch, 10);
        assert_eq!(loaded.params(), net.params());
        assert_eq!(loaded.topology(), net.topology());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_params(dir.path(), "nothing").unwrap_err();
        assert!(matches!(err, TabRegError::ArtifactNotFound(_)));
    }

    #[test]
    fn test_latest_skips_non_files() {
        let dir = tempfile::tempdir().unwrap();
        save_params(dir.path(), "model", 2, &network()).unwrap();
        fs::create_dir(dir.path().join("model-0009.params")).unwrap();

        assert_eq!(list_params(dir.path(), "model").unwrap().len(), 2);
        let (_, epoch) = load_params(dir.path(), "model").unwrap();
        assert_eq!(epoch, 2);
    }

    #[test]
    fn test_list_params_on_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert!(list_params(&file, "model").is_err());
        assert!(list_params(&dir.path().join("absent"), "model").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_params(dir.path(), "model", 1, &network()).unwrap();
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 20;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();
        assert!(load_params_file(&path).is_err());
    }
}
